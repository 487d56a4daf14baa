//! Vertex-Binding Cache
//!
//! Reconciles a submesh's vertex layout with the attributes a program reads
//! and caches the resulting vertex array on the submesh, one per program.
//! The cache is filled lazily from inside the render loop; this is the only
//! mutation of resources during rendering.

use smallvec::SmallVec;

use crate::errors::{Result, TidalError};
use crate::renderer::core::{GpuDevice, VertexArrayDesc, VertexArrayId, VertexAttribPointer};
use crate::resources::{Handle, Mesh, Program, ResourceRegistry, VertexBinding};

/// Returns the vertex array wiring `mesh.submeshes[submesh]` to `program`,
/// building and caching it on first use.
///
/// Every attribute the program declares must exist in the submesh layout
/// at the same location. A missing one means the mesh cannot feed the
/// shader and is reported as [`TidalError::VertexLayoutMismatch`].
pub fn find_or_create_binding(
    device: &mut dyn GpuDevice,
    mesh: &mut Mesh,
    submesh: usize,
    program: &Program,
) -> Result<VertexArrayId> {
    let submesh_count = mesh.submeshes.len();
    let vertex_buffer = mesh.vertex_buffer;
    let index_buffer = mesh.index_buffer;
    let sub = mesh
        .submeshes
        .get_mut(submesh)
        .ok_or(TidalError::SubmeshOutOfBounds {
            index: submesh,
            count: submesh_count,
        })?;

    if let Some(binding) = sub.bindings.iter().find(|b| b.program == program.gpu) {
        return Ok(binding.vertex_array);
    }

    let layout = sub.layout();
    let mut attributes = SmallVec::<[VertexAttribPointer; 4]>::new();
    for shader_attr in &program.attributes {
        let Some(attr) = layout.attribute(shader_attr.location) else {
            log::error!(
                "Program '{}' reads location {} missing from submesh {submesh} of '{}'",
                program.name,
                shader_attr.location,
                mesh.name
            );
            return Err(TidalError::VertexLayoutMismatch {
                program: program.name.clone(),
                submesh,
                location: shader_attr.location,
            });
        };
        attributes.push(VertexAttribPointer {
            location: attr.location,
            components: attr.components,
            offset: sub.vertex_offset + attr.offset,
            stride: layout.stride,
        });
    }

    let vertex_array = device.create_vertex_array(&VertexArrayDesc {
        vertex_buffer,
        index_buffer,
        attributes,
    });
    sub.bindings.push(VertexBinding {
        program: program.gpu,
        vertex_array,
    });
    log::trace!(
        "Vertex binding for '{}' submesh {submesh} x program '{}' -> {vertex_array:?}",
        mesh.name,
        program.name
    );
    Ok(vertex_array)
}

/// [`find_or_create_binding`] through registry handles.
pub fn bind_submesh(
    device: &mut dyn GpuDevice,
    registry: &mut ResourceRegistry,
    mesh: Handle<Mesh>,
    submesh: usize,
    program: Handle<Program>,
) -> Result<VertexArrayId> {
    let (mesh, program) = registry.mesh_and_program(mesh, program)?;
    find_or_create_binding(device, mesh, submesh, program)
}
