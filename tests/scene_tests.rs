//! Scene Integration Tests
//!
//! Tests for:
//! - Camera: orthonormal basis, pitch clamp, zoom, reflected camera
//! - Entity: world matrix from position / rotation / scale
//! - WaterPlane: phase wrapping, clip planes
//! - Light: constructors and GPU tags
//! - Scene: entity and light lookup

use glam::{Mat4, Vec3, Vec4};
use tidal::renderer::settings::WaterSettings;
use tidal::resources::Handle;
use tidal::scene::camera::{FOV_RANGE, MAX_PITCH};
use tidal::{Camera, Entity, Light, LightType, RenderMode, Scene, WaterPlane};

const EPSILON: f32 = 1e-4;

fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

fn assert_orthonormal(camera: &Camera) {
    let (f, r, u) = (camera.front(), camera.right(), camera.up());
    assert!(approx(f.length(), 1.0));
    assert!(approx(r.length(), 1.0));
    assert!(approx(u.length(), 1.0));
    assert!(approx(f.dot(r), 0.0));
    assert!(approx(f.dot(u), 0.0));
    assert!(approx(r.dot(u), 0.0));
}

// ============================================================================
// Camera
// ============================================================================

#[test]
fn camera_defaults() {
    let camera = Camera::default();
    assert!(approx(camera.fov, 60.0));
    assert!(approx(camera.near, 0.1));
    assert!(approx(camera.far, 600.0));
    assert!(approx(camera.speed, 10.0));
    assert_orthonormal(&camera);
}

#[test]
fn camera_basis_stays_orthonormal() {
    let mut camera = Camera::default();
    for (yaw, pitch) in [(-90.0, 0.0), (0.0, 45.0), (123.0, -60.0), (270.0, 89.0), (10.0, -89.0)] {
        camera.set_orientation(yaw, pitch);
        assert_orthonormal(&camera);
        assert!(camera.right().y.abs() < EPSILON, "right stays horizontal");
    }
}

#[test]
fn camera_yaw_minus_90_looks_down_negative_z() {
    let mut camera = Camera::default();
    camera.set_orientation(-90.0, 0.0);
    assert!((camera.front() - Vec3::NEG_Z).length() < EPSILON);
    assert!((camera.right() - Vec3::X).length() < EPSILON);
    assert!((camera.up() - Vec3::Y).length() < EPSILON);
}

#[test]
fn camera_pitch_is_clamped() {
    let mut camera = Camera::default();
    camera.set_orientation(0.0, 120.0);
    assert!(approx(camera.pitch(), MAX_PITCH));
    camera.set_orientation(0.0, -120.0);
    assert!(approx(camera.pitch(), -MAX_PITCH));
}

#[test]
fn camera_look_along_round_trips_direction() {
    let dir = Vec3::new(1.0, -0.5, -2.0).normalize();
    let camera = Camera::new(Vec3::ZERO, dir, 1.0);
    assert!((camera.front() - dir).length() < 1e-3);
}

#[test]
fn camera_view_maps_position_to_origin() {
    let camera = Camera::default();
    let p = camera.view().transform_point3(camera.position);
    assert!(p.length() < 1e-3);
}

#[test]
fn camera_zoom_clamps_fov() {
    let mut camera = Camera::default();
    camera.zoom(10.0);
    assert!(approx(camera.fov, 50.0));
    camera.zoom(100.0);
    assert!(approx(camera.fov, FOV_RANGE.0));
    camera.zoom(-100.0);
    assert!(approx(camera.fov, FOV_RANGE.1));
}

#[test]
fn rotation_only_view_drops_translation() {
    let camera = Camera::default();
    let view = camera.rotation_only_view();
    assert_eq!(view.w_axis, Vec4::W);
    assert!(view.transform_point3(Vec3::ZERO).length() < EPSILON);
}

// ============================================================================
// Reflected camera
// ============================================================================

#[test]
fn reflected_camera_mirrors_height_and_pitch() {
    let mut camera = Camera::default();
    camera.position = Vec3::new(3.0, 10.0, -4.0);
    camera.set_orientation(-70.0, -25.0);

    let mirror = camera.reflected(2.0);
    assert!(approx(mirror.position.x, 3.0));
    assert!(approx(mirror.position.y, -6.0));
    assert!(approx(mirror.position.z, -4.0));
    assert!(approx(mirror.pitch(), 25.0));
    assert!(approx(mirror.yaw(), camera.yaw()));

    let f = camera.front();
    assert!((mirror.front() - Vec3::new(f.x, -f.y, f.z)).length() < EPSILON);
    assert_orthonormal(&mirror);
}

#[test]
fn reflecting_twice_restores_camera() {
    let camera = Camera::default();
    let twice = camera.reflected(2.0).reflected(2.0);
    assert!((twice.position - camera.position).length() < EPSILON);
    assert!((twice.front() - camera.front()).length() < EPSILON);
}

// ============================================================================
// Entity
// ============================================================================

#[test]
fn entity_world_matrix_is_trs() {
    let mut entity = Entity::new("Box", Handle::NONE);
    entity.set_position(Vec3::new(1.0, 2.0, 3.0));
    entity.set_scale(Vec3::splat(2.0));
    entity.set_rotation(Vec3::new(0.0, 90.0, 0.0));

    let expected = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0))
        * Mat4::from_rotation_y(90f32.to_radians())
        * Mat4::from_scale(Vec3::splat(2.0));
    assert!(entity.world_matrix().abs_diff_eq(expected, EPSILON));
}

#[test]
fn entity_field_edits_apply_on_update() {
    let mut scene = Scene::default();
    let index = scene.add_entity(Entity::new("Box", Handle::NONE));
    scene.entities[index].position = Vec3::new(0.0, 5.0, 0.0);
    assert!(scene.entities[index].world_matrix().abs_diff_eq(Mat4::IDENTITY, EPSILON));

    scene.update_world_matrices();
    let moved = scene.entities[index].world_matrix().transform_point3(Vec3::ZERO);
    assert!((moved - Vec3::new(0.0, 5.0, 0.0)).length() < EPSILON);
}

// ============================================================================
// Water
// ============================================================================

#[test]
fn water_phase_stays_in_unit_range() {
    let mut water = WaterPlane::from_settings(&WaterSettings {
        move_speed: 0.7,
        ..WaterSettings::default()
    });
    for step in 0..500 {
        let phase = water.advance(0.016 * (step % 7) as f32);
        assert!((0.0..1.0).contains(&phase), "phase {phase}");
    }
}

#[test]
fn water_phase_advances_by_speed_times_dt() {
    let mut water = WaterPlane::default();
    let speed = water.move_speed;
    assert!(approx(water.move_factor(), 0.0));
    assert!(approx(water.advance(1.0), speed));
    assert!(approx(water.advance(0.0), speed));
}

#[test]
fn water_phase_wraps() {
    let mut water = WaterPlane::default();
    water.move_speed = 0.3;
    water.advance(3.0);
    assert!(approx(water.move_factor(), 0.9));
    water.advance(1.0);
    assert!(approx(water.move_factor(), 0.2));
}

#[test]
fn water_clip_planes_face_away_from_each_other() {
    let water = WaterPlane::default();
    let h = water.height();
    let above = Vec4::new(0.0, h + 1.0, 0.0, 1.0);
    let below = Vec4::new(0.0, h - 1.0, 0.0, 1.0);

    assert!(water.reflection_clip_plane().dot(above) > 0.0);
    assert!(water.reflection_clip_plane().dot(below) < 0.0);
    assert!(water.refraction_clip_plane().dot(below) > 0.0);
    assert!(water.refraction_clip_plane().dot(above) < 0.0);
}

#[test]
fn water_model_matrix_places_plane() {
    let water = WaterPlane::default();
    let center = water.model_matrix().transform_point3(Vec3::ZERO);
    assert!((center - water.position).length() < EPSILON);
}

// ============================================================================
// Lights & scene
// ============================================================================

#[test]
fn light_constructors() {
    let sun = Light::directional("Sun", Vec3::ONE, 1.0, Vec3::new(0.0, -2.0, 0.0), Vec3::ZERO);
    assert_eq!(sun.kind, LightType::Directional);
    assert!((sun.direction - Vec3::NEG_Y).length() < EPSILON);

    let lamp = Light::point("Lamp", Vec3::X, 3.0, Vec3::ONE);
    assert_eq!(lamp.kind, LightType::Point);
    assert_eq!(LightType::Directional.gpu_tag(), 0);
    assert_eq!(LightType::Point.gpu_tag(), 1);
}

#[test]
fn scene_lookup_by_name() {
    let mut scene = Scene::default();
    assert_eq!(scene.mode, RenderMode::Deferred);
    scene.add_entity(Entity::new("Sphere", Handle::NONE));
    scene.add_light(Light::point("Lamp", Vec3::ONE, 1.0, Vec3::ZERO));

    assert!(scene.entity("Sphere").is_some());
    assert!(scene.entity("Cube").is_none());
    assert!(scene.light("Lamp").is_some());
}
