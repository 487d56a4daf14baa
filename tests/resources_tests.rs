//! Resource Registry Tests
//!
//! Tests for:
//! - ResourceRegistry: default textures and material, handles, lookups
//! - Material fallback and default-material resolution
//! - Procedural primitives and embedded meshes
//! - Texture and cube map loading through ImageLoader

use tidal::assets::{MemoryImageLoader, load_cubemap, load_texture_2d};
use tidal::renderer::core::{DeviceCommand, TextureDimension, TextureFormat};
use tidal::resources::primitives::{create_fullscreen_quad, create_skybox_cube};
use tidal::resources::{Image, Material, Texture, VertexBufferLayout};
use tidal::{Handle, HeadlessDevice, Mesh, Model, PrimitiveKind, ResourceRegistry, TidalError};

const EPSILON: f32 = 1e-4;

fn checker(size: u32) -> Image {
    let pixels = (0..size * size)
        .flat_map(|i| if i % 2 == 0 { [255, 255, 255, 255] } else { [0, 0, 0, 255] })
        .collect();
    Image::new(size, size, 4, pixels)
}

// ============================================================================
// Defaults
// ============================================================================

#[test]
fn registry_starts_with_default_textures_and_material() {
    let mut device = HeadlessDevice::default();
    let registry = ResourceRegistry::new(&mut device);
    let defaults = registry.defaults();

    assert_eq!(registry.texture_count(), 3);
    assert_eq!(registry.material_count(), 1);
    assert!(defaults.white.is_some());
    assert!(defaults.black.is_some());
    assert!(defaults.normal.is_some());

    let material = registry.material(defaults.material).unwrap();
    assert_eq!(material.albedo_texture, defaults.normal);
}

#[test]
fn absent_albedo_samples_white() {
    let mut device = HeadlessDevice::default();
    let registry = ResourceRegistry::new(&mut device);
    let white = registry.texture(registry.defaults().white).unwrap().gpu;
    assert_eq!(registry.albedo_texture(&Material::new("Plain")), white);
}

#[test]
fn texture_or_falls_back() {
    let mut device = HeadlessDevice::default();
    let registry = ResourceRegistry::new(&mut device);
    let black = registry.defaults().black;
    let expected = registry.texture(black).unwrap().gpu;
    assert_eq!(registry.texture_or(Handle::NONE, black), expected);
    assert_eq!(registry.texture_or(Handle::from_raw(999), black), expected);
}

// ============================================================================
// Handles & lookups
// ============================================================================

#[test]
fn handles_index_in_insertion_order() {
    let mut device = HeadlessDevice::default();
    let mut registry = ResourceRegistry::new(&mut device);
    let a = registry.add_material(Material::new("A"));
    let b = registry.add_material(Material::new("B"));
    assert_eq!(b.index(), a.index() + 1);
    assert_eq!(registry.material(a).unwrap().name, "A");
    assert_eq!(registry.material(b).unwrap().name, "B");

    registry.material_mut(a).unwrap().smoothness = 0.5;
    assert!((registry.material(a).unwrap().smoothness - 0.5).abs() < EPSILON);
}

#[test]
fn none_handle_resolves_to_nothing() {
    let mut device = HeadlessDevice::default();
    let registry = ResourceRegistry::new(&mut device);
    let none: Handle<Model> = Handle::NONE;
    assert!(none.is_none());
    assert!(none.get().is_none());
    assert!(registry.model(none).is_none());
    assert!(matches!(
        registry.require_model(none),
        Err(TidalError::InvalidHandle { kind: "model", .. })
    ));
}

#[test]
fn textures_are_found_by_path() {
    let mut device = HeadlessDevice::default();
    let mut registry = ResourceRegistry::new(&mut device);
    let handle = registry.add_texture(Texture {
        gpu: tidal::renderer::core::TextureId(0),
        path: "wood.png".to_string(),
        width: 4,
        height: 4,
    });
    assert_eq!(registry.find_texture_by_path("wood.png"), Some(handle));
    assert_eq!(registry.find_texture_by_path("stone.png"), None);
}

#[test]
fn uploaded_texture_gets_a_full_mip_chain() {
    let mut device = HeadlessDevice::default();
    let mut registry = ResourceRegistry::new(&mut device);
    let handle = registry.add_texture_from_image(&mut device, "checker.png", &checker(8)).unwrap();

    let texture = registry.texture(handle).unwrap();
    let desc = device.texture_desc(texture.gpu).unwrap();
    assert_eq!(desc.mip_levels, 4);
    assert_eq!(desc.format, TextureFormat::Rgba8Unorm);
    assert!(device.commands().contains(&DeviceCommand::GenerateMipmaps(texture.gpu)));
}

#[test]
fn two_channel_images_are_rejected() {
    let mut device = HeadlessDevice::default();
    let mut registry = ResourceRegistry::new(&mut device);
    let image = Image::new(1, 1, 2, vec![0, 0]);
    assert!(matches!(
        registry.add_texture_from_image(&mut device, "rg.png", &image),
        Err(TidalError::UnsupportedChannels(2))
    ));
}

// ============================================================================
// Models & materials
// ============================================================================

#[test]
fn unassigned_material_slots_resolve_to_default() {
    let mut device = HeadlessDevice::default();
    let mut registry = ResourceRegistry::new(&mut device);
    let mesh = Mesh::upload(&mut device, "Cube", &PrimitiveKind::Cube.build()).unwrap();
    let mesh = registry.add_mesh(mesh);

    let custom = registry.add_material(Material::new("Custom"));
    let mut model = Model::new("Pair", mesh, 2);
    model.materials[1] = custom;
    let model = registry.add_model(model);

    assert_eq!(registry.resolve_default_materials(model).unwrap(), 1);
    assert_eq!(registry.resolve_default_materials(model).unwrap(), 0);

    let model = registry.model(model).unwrap();
    assert_eq!(model.materials[0], registry.defaults().material);
    assert_eq!(model.materials[1], custom);
}

#[test]
fn material_for_falls_back_to_default() {
    let mut device = HeadlessDevice::default();
    let registry = ResourceRegistry::new(&mut device);
    let model = Model::new("Bare", Handle::NONE, 1);
    assert_eq!(registry.material_for(&model, 0).name, "Default Material");
    assert_eq!(registry.material_for(&model, 7).name, "Default Material");
}

// ============================================================================
// Primitives
// ============================================================================

#[test]
fn primitives_use_position_normal_uv() {
    for kind in PrimitiveKind::ALL {
        let data = kind.build();
        assert_eq!(data.submeshes.len(), 1, "{}", kind.name());
        let sub = &data.submeshes[0];
        assert_eq!(sub.layout, VertexBufferLayout::position_normal_uv(), "{}", kind.name());
        assert_eq!(sub.vertices.len() % 8, 0);
        assert!(!sub.indices.is_empty());
        assert_eq!(sub.indices.len() % 3, 0, "{}", kind.name());
    }
}

#[test]
fn primitive_indices_are_in_range() {
    for kind in PrimitiveKind::ALL {
        let data = kind.build();
        let sub = &data.submeshes[0];
        let count = sub.vertex_count() as u32;
        assert!(sub.indices.iter().all(|&i| i < count), "{}", kind.name());
    }
}

#[test]
fn primitive_normals_are_unit_length() {
    for kind in PrimitiveKind::ALL {
        let data = kind.build();
        for vertex in data.submeshes[0].vertices.chunks_exact(8) {
            let n = glam::Vec3::new(vertex[3], vertex[4], vertex[5]);
            assert!((n.length() - 1.0).abs() < 1e-3, "{} normal {n}", kind.name());
        }
    }
}

#[test]
fn fullscreen_quad_covers_clip_space() {
    let quad = create_fullscreen_quad();
    let sub = &quad.submeshes[0];
    assert_eq!(sub.layout.attribute(1).map(|a| a.components), Some(2));
    assert_eq!(sub.indices.len(), 6);
    assert_eq!(sub.vertex_count(), 4);
    for vertex in sub.vertices.chunks_exact(5) {
        assert!((vertex[0].abs() - 1.0).abs() < EPSILON);
        assert!((vertex[1].abs() - 1.0).abs() < EPSILON);
    }
}

#[test]
fn skybox_cube_is_position_only() {
    let cube = create_skybox_cube();
    let sub = &cube.submeshes[0];
    assert_eq!(sub.layout, VertexBufferLayout::position_only());
    assert_eq!(sub.indices.len(), 36);
}

#[test]
fn mesh_upload_packs_submeshes() {
    let mut device = HeadlessDevice::default();
    let data = PrimitiveKind::Plane.build();
    let mesh = Mesh::upload(&mut device, "Plane", &data).unwrap();

    let sub = &mesh.submeshes[0];
    assert_eq!(sub.index_offset, 0);
    assert_eq!(sub.vertex_offset, 0);
    assert_eq!(sub.index_count as usize, data.submeshes[0].indices.len());
    let bytes = device.buffer_contents(mesh.index_buffer).unwrap();
    assert_eq!(bytes.len(), data.submeshes[0].indices.len() * 4);
}

// ============================================================================
// Texture loading
// ============================================================================

#[test]
fn load_texture_2d_reuses_paths() {
    let mut device = HeadlessDevice::default();
    let mut registry = ResourceRegistry::new(&mut device);
    let mut loader = MemoryImageLoader::new().with_image("checker.png", checker(4));

    let first = load_texture_2d(&mut device, &mut registry, &mut loader, "checker.png");
    let count = registry.texture_count();
    let second = load_texture_2d(&mut device, &mut registry, &mut loader, "checker.png");

    assert!(first.is_some());
    assert_eq!(first, second);
    assert_eq!(registry.texture_count(), count);
}

#[test]
fn load_texture_2d_failure_is_an_absent_handle() {
    let mut device = HeadlessDevice::default();
    let mut registry = ResourceRegistry::new(&mut device);
    let mut loader = MemoryImageLoader::new();
    let handle = load_texture_2d(&mut device, &mut registry, &mut loader, "missing.png");
    assert!(handle.is_none());
    assert_eq!(registry.texture_count(), 3);
}

#[test]
fn cubemap_uploads_six_faces() {
    let mut device = HeadlessDevice::default();
    let names = ["px", "nx", "py", "ny", "pz", "nz"].map(|f| format!("sky/{f}.png"));
    let mut loader = MemoryImageLoader::new();
    for name in &names {
        loader = loader.with_image(name.clone(), checker(2));
    }
    let faces = [
        names[0].as_str(),
        names[1].as_str(),
        names[2].as_str(),
        names[3].as_str(),
        names[4].as_str(),
        names[5].as_str(),
    ];

    let cube = load_cubemap(&mut device, &mut loader, &faces);
    let desc = device.texture_desc(cube).unwrap();
    assert_eq!(desc.dimension, TextureDimension::Cube);
    assert_eq!((desc.width, desc.height), (2, 2));

    let layers: Vec<u32> = device
        .commands()
        .iter()
        .filter_map(|cmd| match cmd {
            DeviceCommand::WriteTexture { texture, layer, .. } if *texture == cube => Some(*layer),
            _ => None,
        })
        .collect();
    assert_eq!(layers, vec![0, 1, 2, 3, 4, 5]);
}

#[test]
fn cubemap_skips_missing_and_mismatched_faces() {
    let mut device = HeadlessDevice::default();
    let mut loader = MemoryImageLoader::new()
        .with_image("a.png", checker(2))
        .with_image("big.png", checker(4));
    let faces = ["a.png", "missing.png", "big.png", "a.png", "a.png", "a.png"];

    let cube = load_cubemap(&mut device, &mut loader, &faces);
    let uploads = device
        .commands()
        .iter()
        .filter(|cmd| matches!(cmd, DeviceCommand::WriteTexture { texture, .. } if *texture == cube))
        .count();
    assert_eq!(uploads, 4);
    assert!(device.validation_errors().is_empty());
}
