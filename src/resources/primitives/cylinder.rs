use std::f32::consts::PI;

use super::{grid_indices, interleave};
use crate::resources::mesh::MeshData;

pub struct CylinderOptions {
    pub radius: f32,
    pub height: f32,
    pub radial_segments: u32,
    pub height_segments: u32,
}

impl Default for CylinderOptions {
    fn default() -> Self {
        Self {
            radius: 0.5,
            height: 1.0,
            radial_segments: 24,
            height_segments: 1,
        }
    }
}

#[must_use]
pub fn create_cylinder(options: &CylinderOptions) -> MeshData {
    let radial = options.radial_segments.max(3);
    let rows = options.height_segments.max(1);
    let r = options.radius;
    let half = options.height / 2.0;

    let mut positions = Vec::new();
    let mut normals = Vec::new();
    let mut uvs = Vec::new();
    let mut indices = Vec::new();

    // Side wall
    for y in 0..=rows {
        let v = y as f32 / rows as f32;
        let py = v * options.height - half;
        for x in 0..=radial {
            let u = x as f32 / radial as f32;
            let (sin, cos) = (u * 2.0 * PI).sin_cos();
            positions.push([r * cos, py, r * sin]);
            normals.push([cos, 0.0, sin]);
            uvs.push([u, v]);
        }
    }
    grid_indices(radial, rows, 0, &mut indices);

    // Caps
    for (y, ny) in [(half, 1.0), (-half, -1.0)] {
        let center = positions.len() as u32;
        positions.push([0.0, y, 0.0]);
        normals.push([0.0, ny, 0.0]);
        uvs.push([0.5, 0.5]);
        for x in 0..=radial {
            let (sin, cos) = (x as f32 / radial as f32 * 2.0 * PI).sin_cos();
            positions.push([r * cos, y, r * sin]);
            normals.push([0.0, ny, 0.0]);
            uvs.push([0.5 + cos * 0.5, 0.5 + sin * 0.5]);
        }
        for x in 0..radial {
            let rim = center + 1 + x;
            indices.extend_from_slice(&[center, rim, rim + 1]);
        }
    }

    interleave(&positions, &normals, &uvs, indices)
}
