use std::f32::consts::PI;

use super::interleave;
use crate::resources::mesh::MeshData;

/// A cone standing on the XZ plane with its apex on +Y.
pub struct ConeOptions {
    pub radius: f32,
    pub height: f32,
    pub radial_segments: u32,
}

impl Default for ConeOptions {
    fn default() -> Self {
        Self {
            radius: 0.5,
            height: 1.0,
            radial_segments: 24,
        }
    }
}

#[must_use]
pub fn create_cone(options: &ConeOptions) -> MeshData {
    let segments = options.radial_segments.max(3);
    let r = options.radius;
    let half = options.height / 2.0;
    // Slant normal: the side rises `height` over `radius`
    let slope = r / options.height;

    let mut positions = Vec::new();
    let mut normals = Vec::new();
    let mut uvs = Vec::new();
    let mut indices = Vec::new();

    // Side: one apex vertex per segment so each keeps its own normal
    for i in 0..=segments {
        let u = i as f32 / segments as f32;
        let theta = u * 2.0 * PI;
        let (sin, cos) = theta.sin_cos();
        let len = (1.0 + slope * slope).sqrt();
        let normal = [cos / len, slope / len, sin / len];

        positions.push([r * cos, -half, r * sin]);
        normals.push(normal);
        uvs.push([u, 0.0]);

        positions.push([0.0, half, 0.0]);
        normals.push(normal);
        uvs.push([u, 1.0]);
    }
    for i in 0..segments {
        let base = i * 2;
        indices.extend_from_slice(&[base, base + 1, base + 2]);
    }

    // Base cap
    let center = positions.len() as u32;
    positions.push([0.0, -half, 0.0]);
    normals.push([0.0, -1.0, 0.0]);
    uvs.push([0.5, 0.5]);
    for i in 0..=segments {
        let theta = i as f32 / segments as f32 * 2.0 * PI;
        let (sin, cos) = theta.sin_cos();
        positions.push([r * cos, -half, r * sin]);
        normals.push([0.0, -1.0, 0.0]);
        uvs.push([0.5 + cos * 0.5, 0.5 + sin * 0.5]);
    }
    for i in 0..segments {
        let rim = center + 1 + i;
        indices.extend_from_slice(&[center, rim, rim + 1]);
    }

    interleave(&positions, &normals, &uvs, indices)
}
