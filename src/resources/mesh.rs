//! Meshes, submeshes and models.
//!
//! A [`Mesh`] owns one vertex buffer and one index buffer on the GPU. Each
//! [`Submesh`] is one contiguous indexed draw inside those buffers with its
//! own interleaved float layout. Submeshes also carry the lazily filled
//! vertex-binding cache, see [`crate::renderer::vertex_binding`].

use smallvec::SmallVec;

use super::{Handle, Material};
use crate::renderer::core::{
    Buffer, BufferKind, GpuBufferId, GpuDevice, ProgramId, VertexArrayId,
};
use crate::errors::Result;

// ============================================================================
// Layout
// ============================================================================

/// One float attribute inside an interleaved vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexBufferAttribute {
    pub location: u32,
    pub components: u8,
    /// Byte offset inside one vertex.
    pub offset: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct VertexBufferLayout {
    pub attributes: SmallVec<[VertexBufferAttribute; 4]>,
    pub stride: u32,
}

impl VertexBufferLayout {
    /// Tightly interleaved `f32` attributes, in the given order.
    #[must_use]
    pub fn interleaved(attributes: &[(u32, u8)]) -> Self {
        let mut layout = Self::default();
        for &(location, components) in attributes {
            layout.attributes.push(VertexBufferAttribute {
                location,
                components,
                offset: layout.stride,
            });
            layout.stride += u32::from(components) * 4;
        }
        layout
    }

    /// Position, normal, texture coordinate at locations 0, 1, 2.
    #[must_use]
    pub fn position_normal_uv() -> Self {
        Self::interleaved(&[(0, 3), (1, 3), (2, 2)])
    }

    /// Position and texture coordinate at locations 0, 1.
    #[must_use]
    pub fn position_uv() -> Self {
        Self::interleaved(&[(0, 3), (1, 2)])
    }

    #[must_use]
    pub fn position_only() -> Self {
        Self::interleaved(&[(0, 3)])
    }

    #[must_use]
    pub fn attribute(&self, location: u32) -> Option<&VertexBufferAttribute> {
        self.attributes.iter().find(|attr| attr.location == location)
    }

    /// Floats per vertex.
    #[must_use]
    pub fn float_count(&self) -> usize {
        (self.stride / 4) as usize
    }
}

// ============================================================================
// CPU-side mesh data
// ============================================================================

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SubmeshData {
    pub layout: VertexBufferLayout,
    pub vertices: Vec<f32>,
    pub indices: Vec<u32>,
}

impl SubmeshData {
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        let floats = self.layout.float_count();
        if floats == 0 { 0 } else { self.vertices.len() / floats }
    }
}

/// Geometry ready for upload: submeshes are packed back to back.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MeshData {
    pub submeshes: Vec<SubmeshData>,
}

impl MeshData {
    #[must_use]
    pub fn single(layout: VertexBufferLayout, vertices: Vec<f32>, indices: Vec<u32>) -> Self {
        Self {
            submeshes: vec![SubmeshData {
                layout,
                vertices,
                indices,
            }],
        }
    }
}

// ============================================================================
// GPU mesh
// ============================================================================

/// A cached vertex array for one program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexBinding {
    pub program: ProgramId,
    pub vertex_array: VertexArrayId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submesh {
    layout: VertexBufferLayout,
    /// Byte offset of the first vertex in the mesh vertex buffer.
    pub vertex_offset: u32,
    /// Byte offset of the first index in the mesh index buffer.
    pub index_offset: u32,
    pub index_count: u32,
    pub vertex_count: u32,
    pub(crate) bindings: Vec<VertexBinding>,
}

impl Submesh {
    #[must_use]
    pub fn new(layout: VertexBufferLayout, vertex_offset: u32, index_offset: u32, index_count: u32, vertex_count: u32) -> Self {
        Self {
            layout,
            vertex_offset,
            index_offset,
            index_count,
            vertex_count,
            bindings: Vec::new(),
        }
    }

    /// The layout is fixed once the mesh is loaded.
    #[must_use]
    pub fn layout(&self) -> &VertexBufferLayout {
        &self.layout
    }

    #[must_use]
    pub fn bindings(&self) -> &[VertexBinding] {
        &self.bindings
    }

    #[must_use]
    pub fn binding_count(&self) -> usize {
        self.bindings.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mesh {
    pub name: String,
    pub submeshes: Vec<Submesh>,
    pub vertex_buffer: GpuBufferId,
    pub index_buffer: GpuBufferId,
}

impl Mesh {
    /// Packs every submesh into one vertex and one index buffer and uploads
    /// them.
    pub fn upload(device: &mut dyn GpuDevice, name: &str, data: &MeshData) -> Result<Self> {
        let vertex_bytes: usize = data.submeshes.iter().map(|s| s.vertices.len() * 4).sum();
        let index_bytes: usize = data.submeshes.iter().map(|s| s.indices.len() * 4).sum();

        // Zero-sized buffers are not valid on every backend.
        let mut vertices = Buffer::create(
            device,
            &format!("{name} vertices"),
            (vertex_bytes as u32).max(4),
            BufferKind::Vertex,
        );
        let mut indices = Buffer::create(
            device,
            &format!("{name} indices"),
            (index_bytes as u32).max(4),
            BufferKind::Index,
        );

        let mut vertex_offsets = Vec::with_capacity(data.submeshes.len());
        {
            let mut map = vertices.map_for_write(device);
            for submesh in &data.submeshes {
                vertex_offsets.push(map.push(bytemuck::cast_slice(&submesh.vertices), 4)?);
            }
        }

        let mut submeshes = Vec::with_capacity(data.submeshes.len());
        {
            let mut map = indices.map_for_write(device);
            for (submesh, vertex_offset) in data.submeshes.iter().zip(vertex_offsets) {
                let index_offset = map.push(bytemuck::cast_slice(&submesh.indices), 4)?;
                submeshes.push(Submesh::new(
                    submesh.layout.clone(),
                    vertex_offset,
                    index_offset,
                    submesh.indices.len() as u32,
                    submesh.vertex_count() as u32,
                ));
            }
        }

        log::debug!(
            "Uploaded mesh '{name}': {} submeshes, {vertex_bytes} vertex bytes, {index_bytes} index bytes",
            submeshes.len()
        );

        Ok(Self {
            name: name.to_string(),
            submeshes,
            vertex_buffer: vertices.handle(),
            index_buffer: indices.handle(),
        })
    }
}

/// A mesh plus one material per submesh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Model {
    pub name: String,
    pub mesh: Handle<Mesh>,
    /// Parallel to the mesh's submesh list.
    pub materials: Vec<Handle<Material>>,
}

impl Model {
    /// A model whose material slots are all unassigned.
    #[must_use]
    pub fn new(name: impl Into<String>, mesh: Handle<Mesh>, submesh_count: usize) -> Self {
        Self {
            name: name.into(),
            mesh,
            materials: vec![Handle::NONE; submesh_count],
        }
    }
}
