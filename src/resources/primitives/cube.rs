use super::interleave;
use crate::resources::mesh::{MeshData, VertexBufferLayout};

/// An axis-aligned cube with 24 vertices (4 per face) so every face has
/// its own normal.
#[must_use]
pub fn create_cube(size: f32) -> MeshData {
    let h = size / 2.0;

    // (normal, tangent u, tangent v) per face
    let faces: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
        ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
        ([0.0, 0.0, -1.0], [-1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
        ([0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, -1.0]),
        ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
        ([1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [0.0, 1.0, 0.0]),
        ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
    ];
    let corners = [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)];

    let mut positions = Vec::with_capacity(24);
    let mut normals = Vec::with_capacity(24);
    let mut uvs = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(36);

    for (face, (n, u, v)) in faces.iter().enumerate() {
        for (su, sv) in corners {
            positions.push([
                (n[0] + u[0] * su + v[0] * sv) * h,
                (n[1] + u[1] * su + v[1] * sv) * h,
                (n[2] + u[2] * su + v[2] * sv) * h,
            ]);
            normals.push(*n);
            uvs.push([(su + 1.0) / 2.0, (sv + 1.0) / 2.0]);
        }
        let base = face as u32 * 4;
        indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    interleave(&positions, &normals, &uvs, indices)
}

/// Unit cube seen from the inside, positions only, for cube-map skies.
#[must_use]
pub fn create_skybox_cube() -> MeshData {
    #[rustfmt::skip]
    let vertices = vec![
        -1.0, -1.0, -1.0,
         1.0, -1.0, -1.0,
         1.0,  1.0, -1.0,
        -1.0,  1.0, -1.0,
        -1.0, -1.0,  1.0,
         1.0, -1.0,  1.0,
         1.0,  1.0,  1.0,
        -1.0,  1.0,  1.0,
    ];
    #[rustfmt::skip]
    let indices = vec![
        // -Z
        0, 2, 1, 0, 3, 2,
        // +Z
        4, 5, 6, 4, 6, 7,
        // -X
        0, 4, 7, 0, 7, 3,
        // +X
        1, 2, 6, 1, 6, 5,
        // -Y
        0, 1, 5, 0, 5, 4,
        // +Y
        3, 7, 6, 3, 6, 2,
    ];
    MeshData::single(VertexBufferLayout::position_only(), vertices, indices)
}
