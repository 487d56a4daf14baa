use std::f32::consts::PI;

use super::{grid_indices, interleave};
use crate::resources::mesh::MeshData;

pub struct SphereOptions {
    pub radius: f32,
    pub width_segments: u32,
    pub height_segments: u32,
}

impl Default for SphereOptions {
    fn default() -> Self {
        Self {
            radius: 1.0,
            width_segments: 32,
            height_segments: 16,
        }
    }
}

#[must_use]
pub fn create_sphere(options: &SphereOptions) -> MeshData {
    let radius = options.radius;
    let width_segments = options.width_segments.max(3);
    let height_segments = options.height_segments.max(2);

    let mut positions = Vec::new();
    let mut normals = Vec::new();
    let mut uvs = Vec::new();

    for y in 0..=height_segments {
        let v = y as f32 / height_segments as f32;
        // Latitude from the south pole (0) to the north pole (PI)
        let theta = v * PI;
        let py = -radius * theta.cos();
        let ring = radius * theta.sin();

        for x in 0..=width_segments {
            let u = x as f32 / width_segments as f32;
            let phi = u * 2.0 * PI;
            let px = -ring * phi.cos();
            let pz = ring * phi.sin();

            positions.push([px, py, pz]);
            normals.push([px / radius, py / radius, pz / radius]);
            uvs.push([u, v]);
        }
    }

    let mut indices = Vec::new();
    grid_indices(width_segments, height_segments, 0, &mut indices);

    interleave(&positions, &normals, &uvs, indices)
}
