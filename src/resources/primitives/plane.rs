use super::{grid_indices, interleave};
use crate::resources::mesh::MeshData;

/// A plane in XZ facing +Y, centered on the origin.
pub struct PlaneOptions {
    pub width: f32,
    pub depth: f32,
    pub width_segments: u32,
    pub depth_segments: u32,
}

impl Default for PlaneOptions {
    fn default() -> Self {
        Self {
            width: 1.0,
            depth: 1.0,
            width_segments: 1,
            depth_segments: 1,
        }
    }
}

#[must_use]
pub fn create_plane(options: &PlaneOptions) -> MeshData {
    let grid_x = options.width_segments.max(1);
    let grid_z = options.depth_segments.max(1);
    let half_w = options.width / 2.0;
    let half_d = options.depth / 2.0;

    let mut positions = Vec::new();
    let mut normals = Vec::new();
    let mut uvs = Vec::new();

    for iz in 0..=grid_z {
        let v = iz as f32 / grid_z as f32;
        let z = v * options.depth - half_d;
        for ix in 0..=grid_x {
            let u = ix as f32 / grid_x as f32;
            let x = u * options.width - half_w;

            positions.push([x, 0.0, z]);
            normals.push([0.0, 1.0, 0.0]);
            uvs.push([u, 1.0 - v]);
        }
    }

    let mut indices = Vec::new();
    grid_indices(grid_x, grid_z, 0, &mut indices);

    interleave(&positions, &normals, &uvs, indices)
}
