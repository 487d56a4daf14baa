use crate::renderer::core::{ProgramId, VertexShaderAttribute};

/// A linked shader program and the vertex inputs it reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    pub gpu: ProgramId,
    pub name: String,
    pub path: String,
    /// Active vertex attributes as reported by the device.
    pub attributes: Vec<VertexShaderAttribute>,
    /// `false` when compilation or linking reported diagnostics.
    pub valid: bool,
}
