//! Frame Parameter Packer Tests
//!
//! Tests for:
//! - Global block layout: camera position, light count, 64-byte lights
//! - Entity blocks: aligned offsets, world and world-view-projection matrices
//! - Optional clip plane block
//! - Overflow when the scene does not fit the arena

use glam::{Mat4, Vec3, Vec4};
use tidal::renderer::core::{Buffer, BufferKind, GpuDevice};
use tidal::renderer::frame_params::{ENTITY_BLOCK_SIZE, pack_frame};
use tidal::resources::Handle;
use tidal::{Camera, Entity, HeadlessDevice, Light, TidalError};

const EPSILON: f32 = 1e-5;
const ALIGNMENT: u32 = 256;

fn read_f32(bytes: &[u8], offset: u32) -> f32 {
    let o = offset as usize;
    f32::from_ne_bytes(bytes[o..o + 4].try_into().unwrap())
}

fn read_u32(bytes: &[u8], offset: u32) -> u32 {
    let o = offset as usize;
    u32::from_ne_bytes(bytes[o..o + 4].try_into().unwrap())
}

fn read_vec3(bytes: &[u8], offset: u32) -> Vec3 {
    Vec3::new(
        read_f32(bytes, offset),
        read_f32(bytes, offset + 4),
        read_f32(bytes, offset + 8),
    )
}

fn read_mat4(bytes: &[u8], offset: u32) -> Mat4 {
    let mut cols = [0.0f32; 16];
    for (i, v) in cols.iter_mut().enumerate() {
        *v = read_f32(bytes, offset + 4 * i as u32);
    }
    Mat4::from_cols_array(&cols)
}

fn vec3_approx(a: Vec3, b: Vec3) -> bool {
    (a - b).length() < EPSILON
}

fn entities(count: usize) -> Vec<Entity> {
    (0..count)
        .map(|i| {
            let mut entity = Entity::new(format!("Entity {i}"), Handle::from_raw(0));
            entity.set_position(Vec3::new(i as f32, 1.0, -(i as f32)));
            entity.update_world_matrix();
            entity
        })
        .collect()
}

fn lights() -> Vec<Light> {
    vec![
        Light::directional("Sun", Vec3::ONE, 2.0, Vec3::new(0.0, -1.0, 0.0), Vec3::new(0.0, 10.0, 0.0)),
        Light::point("Lamp", Vec3::new(1.0, 0.5, 0.25), 4.0, Vec3::new(3.0, 2.0, 1.0)),
    ]
}

struct Fixture {
    device: HeadlessDevice,
    buffer: Buffer,
}

impl Fixture {
    fn new(capacity: u32) -> Self {
        let mut device = HeadlessDevice::default();
        let buffer = Buffer::create(&mut device, "Uniforms", capacity, BufferKind::Uniform);
        Self { device, buffer }
    }

    fn contents(&self) -> &[u8] {
        self.device.buffer_contents(self.buffer.handle()).unwrap()
    }
}

// ============================================================================
// Global block
// ============================================================================

#[test]
fn global_block_starts_at_zero_with_camera_and_light_count() {
    let mut fx = Fixture::new(65536);
    let camera = Camera::default();
    let lights = lights();
    let mut ents = entities(1);

    let params = pack_frame(&mut fx.buffer, &mut fx.device, &camera, &mut ents, &lights, None, ALIGNMENT).unwrap();

    assert_eq!(params.global.offset, 0);
    assert_eq!(params.global.size, 16 + 64 * lights.len() as u32 - 4);
    let bytes = fx.contents();
    assert!(vec3_approx(read_vec3(bytes, 0), camera.position));
    assert_eq!(read_u32(bytes, 12), 2);
}

#[test]
fn lights_use_64_byte_slots() {
    let mut fx = Fixture::new(65536);
    let camera = Camera::default();
    let lights = lights();
    let mut ents = Vec::new();

    pack_frame(&mut fx.buffer, &mut fx.device, &camera, &mut ents, &lights, None, ALIGNMENT).unwrap();
    let bytes = fx.contents();

    for (i, light) in lights.iter().enumerate() {
        let base = 16 + 64 * i as u32;
        assert_eq!(read_u32(bytes, base), light.kind.gpu_tag());
        assert!(vec3_approx(read_vec3(bytes, base + 16), light.radiance()));
        assert!(vec3_approx(read_vec3(bytes, base + 32), light.direction));
        assert!(vec3_approx(read_vec3(bytes, base + 48), light.position));
    }
    assert_eq!(read_u32(bytes, 16), 0);
    assert_eq!(read_u32(bytes, 80), 1);
}

#[test]
fn radiance_is_color_times_intensity() {
    let light = Light::point("Lamp", Vec3::new(1.0, 0.5, 0.25), 4.0, Vec3::ZERO);
    assert!(vec3_approx(light.radiance(), Vec3::new(4.0, 2.0, 1.0)));
}

#[test]
fn no_lights_packs_a_zero_count() {
    let mut fx = Fixture::new(4096);
    let camera = Camera::default();
    let mut ents = entities(2);

    let params = pack_frame(&mut fx.buffer, &mut fx.device, &camera, &mut ents, &[], None, ALIGNMENT).unwrap();
    assert_eq!(params.global.size, 16);
    assert_eq!(read_u32(fx.contents(), 12), 0);
}

// ============================================================================
// Entity blocks
// ============================================================================

#[test]
fn entity_blocks_are_aligned_and_disjoint() {
    let mut fx = Fixture::new(65536);
    let camera = Camera::default();
    let lights = lights();
    let mut ents = entities(5);

    let params = pack_frame(&mut fx.buffer, &mut fx.device, &camera, &mut ents, &lights, None, ALIGNMENT).unwrap();

    let mut previous_end = params.global.end();
    for entity in &ents {
        let range = entity.local_params();
        assert_eq!(range.offset % ALIGNMENT, 0);
        assert_eq!(range.size, ENTITY_BLOCK_SIZE);
        assert!(range.offset >= previous_end);
        assert!(range.end() <= fx.buffer.capacity());
        previous_end = range.end();
    }
    assert_eq!(ents[0].local_params().offset, 256);
    assert_eq!(ents[1].local_params().offset, 512);
}

#[test]
fn entity_block_holds_world_and_mvp() {
    let mut fx = Fixture::new(65536);
    let camera = Camera::default();
    let mut ents = entities(3);

    pack_frame(&mut fx.buffer, &mut fx.device, &camera, &mut ents, &[], None, ALIGNMENT).unwrap();
    let bytes = fx.contents();

    for entity in &ents {
        let offset = entity.local_params().offset;
        let world = read_mat4(bytes, offset);
        let mvp = read_mat4(bytes, offset + 64);
        assert!(world.abs_diff_eq(entity.world_matrix(), EPSILON));
        assert!(mvp.abs_diff_eq(camera.view_projection() * entity.world_matrix(), 1e-3));
    }
}

#[test]
fn repacking_overwrites_from_the_start() {
    let mut fx = Fixture::new(65536);
    let camera = Camera::default();
    let mut ents = entities(2);

    let first = pack_frame(&mut fx.buffer, &mut fx.device, &camera, &mut ents, &[], None, ALIGNMENT).unwrap();
    let offsets: Vec<u32> = ents.iter().map(|e| e.local_params().offset).collect();

    let mirrored = camera.reflected(2.0);
    let second = pack_frame(&mut fx.buffer, &mut fx.device, &mirrored, &mut ents, &[], None, ALIGNMENT).unwrap();

    assert_eq!(first, second);
    let again: Vec<u32> = ents.iter().map(|e| e.local_params().offset).collect();
    assert_eq!(offsets, again);
    assert!(vec3_approx(read_vec3(fx.contents(), 0), mirrored.position));
}

// ============================================================================
// Clip plane
// ============================================================================

#[test]
fn clip_plane_is_packed_after_entities() {
    let mut fx = Fixture::new(65536);
    let camera = Camera::default();
    let mut ents = entities(2);
    let plane = Vec4::new(0.0, 1.0, 0.0, -2.0);

    let params =
        pack_frame(&mut fx.buffer, &mut fx.device, &camera, &mut ents, &[], Some(plane), ALIGNMENT).unwrap();

    let clip = params.clip_plane.expect("clip plane range");
    assert_eq!(clip.offset % ALIGNMENT, 0);
    assert_eq!(clip.size, 16);
    assert!(clip.offset >= ents[1].local_params().end());
    let bytes = fx.contents();
    assert!((read_f32(bytes, clip.offset + 4) - 1.0).abs() < EPSILON);
    assert!((read_f32(bytes, clip.offset + 12) + 2.0).abs() < EPSILON);
}

#[test]
fn no_clip_plane_means_no_range() {
    let mut fx = Fixture::new(65536);
    let mut ents = entities(1);
    let params =
        pack_frame(&mut fx.buffer, &mut fx.device, &Camera::default(), &mut ents, &[], None, ALIGNMENT).unwrap();
    assert!(params.clip_plane.is_none());
}

// ============================================================================
// Capacity
// ============================================================================

#[test]
fn too_many_entities_overflow_the_arena() {
    let mut fx = Fixture::new(1024);
    let mut ents = entities(8);
    let result = pack_frame(&mut fx.buffer, &mut fx.device, &Camera::default(), &mut ents, &[], None, ALIGNMENT);
    assert!(matches!(result, Err(TidalError::UniformBufferOverflow { .. })));
}

#[test]
fn packed_ranges_fit_device_block_size() {
    let mut fx = Fixture::new(65536);
    let limits = fx.device.limits();
    let mut ents = entities(16);
    let params = pack_frame(
        &mut fx.buffer,
        &mut fx.device,
        &Camera::default(),
        &mut ents,
        &lights(),
        Some(Vec4::Y),
        limits.uniform_offset_alignment,
    )
    .unwrap();

    assert!(params.global.size <= limits.max_uniform_block_size);
    for entity in &ents {
        assert!(entity.local_params().end() <= limits.max_uniform_block_size);
    }
    assert!(fx.device.validation_errors().is_empty());
}
