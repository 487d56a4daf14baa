//! Vertex-Binding Cache Tests
//!
//! Tests for:
//! - find_or_create_binding: lazy creation, per-program caching
//! - Attribute pointers: absolute offsets and strides
//! - Layout mismatches and out-of-range submeshes

use tidal::renderer::core::{GpuDevice, ProgramId, VertexShaderAttribute};
use tidal::renderer::vertex_binding::{bind_submesh, find_or_create_binding};
use tidal::resources::{MeshData, Program, SubmeshData, VertexBufferLayout};
use tidal::{HeadlessDevice, Mesh, ResourceRegistry, TidalError};

fn attr(location: u32, components: u8) -> VertexShaderAttribute {
    VertexShaderAttribute { location, components }
}

fn program(id: u32, name: &str, attributes: Vec<VertexShaderAttribute>) -> Program {
    Program {
        gpu: ProgramId(id),
        name: name.to_string(),
        path: format!("shaders/{name}.wgsl"),
        attributes,
        valid: true,
    }
}

fn triangle(layout: VertexBufferLayout) -> SubmeshData {
    let floats = layout.float_count();
    SubmeshData {
        layout,
        vertices: vec![0.0; floats * 3],
        indices: vec![0, 1, 2],
    }
}

/// Two submeshes: position/normal/uv, then position/uv.
fn two_submesh_mesh(device: &mut HeadlessDevice) -> Mesh {
    let data = MeshData {
        submeshes: vec![
            triangle(VertexBufferLayout::position_normal_uv()),
            triangle(VertexBufferLayout::interleaved(&[(0, 3), (1, 2)])),
        ],
    };
    Mesh::upload(device, "Test Mesh", &data).unwrap()
}

// ============================================================================
// Caching
// ============================================================================

#[test]
fn binding_is_created_once_per_program() {
    let mut device = HeadlessDevice::default();
    let mut mesh = two_submesh_mesh(&mut device);
    let geometry = program(0, "GEOMETRY", vec![attr(0, 3), attr(1, 3), attr(2, 2)]);

    let first = find_or_create_binding(&mut device, &mut mesh, 0, &geometry).unwrap();
    let second = find_or_create_binding(&mut device, &mut mesh, 0, &geometry).unwrap();

    assert_eq!(first, second);
    assert_eq!(mesh.submeshes[0].binding_count(), 1);
    assert_eq!(device.vertex_array_count(), 1);
}

#[test]
fn each_program_gets_its_own_binding() {
    let mut device = HeadlessDevice::default();
    let mut mesh = two_submesh_mesh(&mut device);
    let geometry = program(0, "GEOMETRY", vec![attr(0, 3), attr(1, 3), attr(2, 2)]);
    let lights = program(1, "SHOW_LIGHTS", vec![attr(0, 3)]);

    let a = find_or_create_binding(&mut device, &mut mesh, 0, &geometry).unwrap();
    let b = find_or_create_binding(&mut device, &mut mesh, 0, &lights).unwrap();

    assert_ne!(a, b);
    assert_eq!(mesh.submeshes[0].binding_count(), 2);
    assert_eq!(mesh.submeshes[1].binding_count(), 0);
}

// ============================================================================
// Attribute pointers
// ============================================================================

#[test]
fn pointers_use_absolute_offsets() {
    let mut device = HeadlessDevice::default();
    let mut mesh = two_submesh_mesh(&mut device);
    let quad = program(0, "QUAD", vec![attr(0, 3), attr(1, 2)]);

    let vao = find_or_create_binding(&mut device, &mut mesh, 1, &quad).unwrap();
    let desc = device.vertex_array_desc(vao).unwrap();

    // first submesh: 3 vertices * 8 floats * 4 bytes
    let base = 3 * 8 * 4;
    assert_eq!(mesh.submeshes[1].vertex_offset, base);
    assert_eq!(desc.vertex_buffer, mesh.vertex_buffer);
    assert_eq!(desc.index_buffer, mesh.index_buffer);
    assert_eq!(desc.attributes.len(), 2);
    assert_eq!(desc.attributes[0].offset, base);
    assert_eq!(desc.attributes[1].offset, base + 12);
    assert!(desc.attributes.iter().all(|a| a.stride == 20));
}

#[test]
fn only_program_attributes_are_enabled() {
    let mut device = HeadlessDevice::default();
    let mut mesh = two_submesh_mesh(&mut device);
    let position_only = program(0, "SKY", vec![attr(0, 3)]);

    let vao = find_or_create_binding(&mut device, &mut mesh, 0, &position_only).unwrap();
    let desc = device.vertex_array_desc(vao).unwrap();
    assert_eq!(desc.attributes.len(), 1);
    assert_eq!(desc.attributes[0].location, 0);
    assert_eq!(desc.attributes[0].stride, 32);
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn missing_attribute_is_a_layout_mismatch() {
    let mut device = HeadlessDevice::default();
    let mut mesh = two_submesh_mesh(&mut device);
    let geometry = program(0, "GEOMETRY", vec![attr(0, 3), attr(1, 3), attr(2, 2)]);

    let err = find_or_create_binding(&mut device, &mut mesh, 1, &geometry).unwrap_err();
    match err {
        TidalError::VertexLayoutMismatch {
            program,
            submesh,
            location,
        } => {
            assert_eq!(program, "GEOMETRY");
            assert_eq!(submesh, 1);
            assert_eq!(location, 2);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(mesh.submeshes[1].binding_count(), 0);
    assert_eq!(device.vertex_array_count(), 0);
}

#[test]
fn submesh_out_of_range_is_an_error() {
    let mut device = HeadlessDevice::default();
    let mut mesh = two_submesh_mesh(&mut device);
    let quad = program(0, "QUAD", vec![attr(0, 3)]);
    assert!(matches!(
        find_or_create_binding(&mut device, &mut mesh, 5, &quad),
        Err(TidalError::SubmeshOutOfBounds { index: 5, count: 2 })
    ));
}

// ============================================================================
// Registry handles
// ============================================================================

#[test]
fn bind_submesh_goes_through_the_registry() {
    let mut device = HeadlessDevice::default();
    let mut registry = ResourceRegistry::new(&mut device);
    let mesh = two_submesh_mesh(&mut device);
    let mesh = registry.add_mesh(mesh);
    let build = device.create_program(&tidal::renderer::core::ProgramSource {
        name: "QUAD".to_string(),
        path: "quad.wgsl".to_string(),
        source: "// quad".to_string(),
        interface: tidal::renderer::core::ProgramInterface {
            attributes: vec![attr(0, 3), attr(1, 2)],
            ..Default::default()
        },
    });
    let quad = registry.add_program(program(build.id.0, "QUAD", build.attributes));

    let a = bind_submesh(&mut device, &mut registry, mesh, 0, quad).unwrap();
    let b = bind_submesh(&mut device, &mut registry, mesh, 0, quad).unwrap();
    assert_eq!(a, b);
    assert_eq!(registry.mesh(mesh).unwrap().submeshes[0].binding_count(), 1);
}

#[test]
fn bind_submesh_rejects_unknown_handles() {
    let mut device = HeadlessDevice::default();
    let mut registry = ResourceRegistry::new(&mut device);
    let result = bind_submesh(
        &mut device,
        &mut registry,
        tidal::resources::Handle::from_raw(42),
        0,
        tidal::resources::Handle::from_raw(0),
    );
    assert!(matches!(result, Err(TidalError::InvalidHandle { .. })));
}
