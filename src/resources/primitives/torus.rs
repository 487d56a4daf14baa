use std::f32::consts::PI;

use super::{grid_indices, interleave};
use crate::resources::mesh::MeshData;

/// A torus lying in the XZ plane.
pub struct TorusOptions {
    /// Distance from the center to the middle of the tube.
    pub radius: f32,
    pub tube: f32,
    pub radial_segments: u32,
    pub tubular_segments: u32,
}

impl Default for TorusOptions {
    fn default() -> Self {
        Self {
            radius: 0.5,
            tube: 0.2,
            radial_segments: 16,
            tubular_segments: 48,
        }
    }
}

#[must_use]
pub fn create_torus(options: &TorusOptions) -> MeshData {
    let radial = options.radial_segments.max(3);
    let tubular = options.tubular_segments.max(3);

    let mut positions = Vec::new();
    let mut normals = Vec::new();
    let mut uvs = Vec::new();

    for j in 0..=radial {
        let v = j as f32 / radial as f32;
        let (tube_sin, tube_cos) = (v * 2.0 * PI).sin_cos();
        for i in 0..=tubular {
            let u = i as f32 / tubular as f32;
            let (sin, cos) = (u * 2.0 * PI).sin_cos();

            let ring = options.radius + options.tube * tube_cos;
            positions.push([ring * cos, options.tube * tube_sin, ring * sin]);
            normals.push([tube_cos * cos, tube_sin, tube_cos * sin]);
            uvs.push([u, v]);
        }
    }

    let mut indices = Vec::new();
    grid_indices(tubular, radial, 0, &mut indices);

    interleave(&positions, &normals, &uvs, indices)
}
