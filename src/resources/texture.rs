use crate::renderer::core::TextureId;

/// A GPU texture registered by source path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Texture {
    pub gpu: TextureId,
    /// Source file path, or a `builtin:` name for generated textures.
    pub path: String,
    pub width: u32,
    pub height: u32,
}
