//! Procedural geometry.
//!
//! Scene primitives use the position / normal / uv layout at locations
//! 0, 1, 2. The full-screen quad and the skybox cube are embedded geometry
//! with their own smaller layouts.

pub mod cone;
pub mod cube;
pub mod cylinder;
pub mod plane;
pub mod quad;
pub mod sphere;
pub mod torus;

use serde::{Deserialize, Serialize};

pub use cone::{ConeOptions, create_cone};
pub use cube::{create_cube, create_skybox_cube};
pub use cylinder::{CylinderOptions, create_cylinder};
pub use plane::{PlaneOptions, create_plane};
pub use quad::create_fullscreen_quad;
pub use sphere::{SphereOptions, create_sphere};
pub use torus::{TorusOptions, create_torus};

use super::mesh::{MeshData, VertexBufferLayout};

/// Scene primitives that can be spawned interactively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrimitiveKind {
    Cube,
    Sphere,
    Cone,
    Cylinder,
    Plane,
    Torus,
}

impl PrimitiveKind {
    /// Position in [`Self::ALL`].
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    pub const ALL: [Self; 6] = [
        Self::Cube,
        Self::Sphere,
        Self::Cone,
        Self::Cylinder,
        Self::Plane,
        Self::Torus,
    ];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Cube => "Cube",
            Self::Sphere => "Sphere",
            Self::Cone => "Cone",
            Self::Cylinder => "Cylinder",
            Self::Plane => "Plane",
            Self::Torus => "Torus",
        }
    }

    /// Geometry with default options.
    #[must_use]
    pub fn build(self) -> MeshData {
        match self {
            Self::Cube => create_cube(1.0),
            Self::Sphere => create_sphere(&SphereOptions::default()),
            Self::Cone => create_cone(&ConeOptions::default()),
            Self::Cylinder => create_cylinder(&CylinderOptions::default()),
            Self::Plane => create_plane(&PlaneOptions::default()),
            Self::Torus => create_torus(&TorusOptions::default()),
        }
    }
}

/// Interleaves planar attribute arrays into a position / normal / uv mesh.
pub(crate) fn interleave(
    positions: &[[f32; 3]],
    normals: &[[f32; 3]],
    uvs: &[[f32; 2]],
    indices: Vec<u32>,
) -> MeshData {
    debug_assert_eq!(positions.len(), normals.len());
    debug_assert_eq!(positions.len(), uvs.len());

    let mut vertices = Vec::with_capacity(positions.len() * 8);
    for ((p, n), uv) in positions.iter().zip(normals).zip(uvs) {
        vertices.extend_from_slice(p);
        vertices.extend_from_slice(n);
        vertices.extend_from_slice(uv);
    }
    MeshData::single(VertexBufferLayout::position_normal_uv(), vertices, indices)
}

/// Indices for a `(columns + 1) x (rows + 1)` vertex grid, two triangles per
/// cell, counter-clockwise when row index grows along the surface's `v`.
pub(crate) fn grid_indices(columns: u32, rows: u32, base: u32, indices: &mut Vec<u32>) {
    let stride = columns + 1;
    for y in 0..rows {
        for x in 0..columns {
            let a = base + y * stride + x;
            let b = a + 1;
            let c = a + stride;
            let d = c + 1;
            indices.extend_from_slice(&[a, c, b, b, c, d]);
        }
    }
}
