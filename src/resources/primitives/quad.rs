use crate::resources::mesh::{MeshData, VertexBufferLayout};

/// Clip-space quad covering the viewport, position + uv.
#[must_use]
pub fn create_fullscreen_quad() -> MeshData {
    #[rustfmt::skip]
    let vertices = vec![
        // position          uv
        -1.0, -1.0, 0.0,     0.0, 0.0,
         1.0, -1.0, 0.0,     1.0, 0.0,
         1.0,  1.0, 0.0,     1.0, 1.0,
        -1.0,  1.0, 0.0,     0.0, 1.0,
    ];
    let indices = vec![0, 1, 2, 0, 2, 3];
    MeshData::single(VertexBufferLayout::position_uv(), vertices, indices)
}
