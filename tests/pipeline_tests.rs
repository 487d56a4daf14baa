//! Render Pipeline Integration Tests
//!
//! Tests for:
//! - Pass order for the textured-quad, forward and deferred pipelines
//! - Texture units, uniform blocks and parameters of each stage
//! - Bloom chain levels and the debug-light target
//! - App frame loop: update / gui / render, run, primitives, default scene
//! - Failure paths: missing shaders, absent models, arena overflow

use glam::{Vec2, Vec3};
use tidal::assets::{MemoryImageLoader, StaticShaderLoader};
use tidal::renderer::core::{
    DeviceCommand, DeviceLimits, ParamValue, RenderPass, RenderTarget, Viewport, WrapMode,
};
use tidal::renderer::programs::{BuiltinProgram, block, param, unit};
use tidal::renderer::settings::{AssetPaths, BLOOM_LEVELS};
use tidal::renderer::targets::{bloom_slot, gbuffer};
use tidal::resources::{Handle, Image};
use tidal::{App, Entity, HeadlessDevice, InputState, PreviewTarget, PrimitiveKind, RenderMode, RendererSettings, TidalError};

fn shaders() -> StaticShaderLoader {
    let mut loader = StaticShaderLoader::new();
    for program in BuiltinProgram::ALL {
        loader.insert(program.name(), format!("// {}", program.name()));
    }
    loader
}

fn images() -> MemoryImageLoader {
    let paths = AssetPaths::default();
    let mut loader = MemoryImageLoader::new()
        .with_image(paths.quad_texture.clone(), Image::solid([200, 40, 40, 255]))
        .with_image(paths.water_normal_map.clone(), Image::solid([128, 128, 255, 255]))
        .with_image(paths.water_dudv_map.clone(), Image::solid([128, 128, 0, 255]));
    for face in &paths.skybox_faces {
        loader = loader.with_image(face.clone(), Image::solid([90, 140, 220, 255]));
    }
    loader
}

fn app_with(device: HeadlessDevice, settings: RendererSettings) -> App<HeadlessDevice> {
    App::new(device, &mut shaders(), &mut images(), settings).unwrap()
}

fn default_app() -> App<HeadlessDevice> {
    let mut app = app_with(HeadlessDevice::default(), RendererSettings::default());
    app.populate_default_scene().unwrap();
    app
}

fn input() -> InputState {
    let mut input = InputState::new();
    input.delta_time = 0.016;
    input
}

fn render_mode(app: &mut App<HeadlessDevice>, mode: RenderMode) {
    app.device.clear_commands();
    app.frame(&input(), |scene, _| scene.mode = mode).unwrap();
}

fn read_f32(bytes: &[u8], offset: u32) -> f32 {
    let o = offset as usize;
    f32::from_ne_bytes(bytes[o..o + 4].try_into().unwrap())
}

fn pass<'a>(app: &'a App<HeadlessDevice>, label: &str) -> &'a RenderPass {
    app.device
        .find_pass(label)
        .unwrap_or_else(|| panic!("no pass labelled '{label}'"))
}

fn deferred_labels(debug_lights: bool) -> Vec<String> {
    let mut labels: Vec<String> = [
        "Reflection",
        "Reflection Skybox",
        "Refraction",
        "Geometry",
        "Water",
        "Lighting",
        "Skybox",
        "Bright Pixels",
    ]
    .iter()
    .map(ToString::to_string)
    .collect();
    labels.extend((0..BLOOM_LEVELS).map(|i| format!("Blur Horizontal {i}")));
    labels.extend((0..BLOOM_LEVELS).map(|i| format!("Blur Vertical {i}")));
    labels.push("Bloom Composite".to_string());
    if debug_lights {
        labels.push("Debug Lights".to_string());
    }
    labels
}

// ============================================================================
// Pass order
// ============================================================================

#[test]
fn textured_quad_draws_one_pass_to_screen() {
    let mut app = default_app();
    render_mode(&mut app, RenderMode::TexturedQuad);

    assert_eq!(app.device.pass_labels(), vec!["Textured Quad"]);
    let quad = pass(&app, "Textured Quad");
    assert_eq!(quad.target, RenderTarget::Screen);
    assert_eq!(quad.draws.len(), 1);

    let texture = app.registry.texture(app.renderer.builtins().quad_texture).unwrap().gpu;
    assert_eq!(quad.draws[0].texture_at(unit::ALBEDO), Some(texture));
}

#[test]
fn forward_draws_every_entity_once() {
    let mut app = default_app();
    render_mode(&mut app, RenderMode::Forward);

    assert_eq!(app.device.pass_labels(), vec!["Forward"]);
    let forward = pass(&app, "Forward");
    assert_eq!(forward.target.framebuffer_id(), Some(app.renderer.targets().forward));
    assert_eq!(forward.draws.len(), app.scene.entities.len());
    for draw in &forward.draws {
        assert!(draw.uniform_range(block::GLOBAL).is_some());
        assert!(draw.uniform_range(block::LOCAL).is_some());
        assert!(draw.uniform_range(block::CLIP_PLANE).is_none());
    }
}

#[test]
fn gui_edits_are_packed_before_forward_draws() {
    let mut app = default_app();
    let cube = app.renderer.primitive_model(PrimitiveKind::Cube);
    app.device.clear_commands();
    app.frame(&input(), |scene, _| {
        scene.mode = RenderMode::Forward;
        scene.entities[0].position = Vec3::new(100.0, 0.0, 0.0);
        scene.add_entity(Entity::new("Spawned", cube));
    })
    .unwrap();

    let forward = pass(&app, "Forward");
    assert_eq!(forward.draws.len(), 5);
    let global = forward.draws[0].uniform_range(block::GLOBAL).unwrap();

    let spawned = forward.draws[4].uniform_range(block::LOCAL).unwrap();
    assert_eq!(spawned, app.scene.entities[4].local_params());
    assert_eq!(spawned.size, 128);
    assert!(spawned.offset >= global.offset + global.size);

    // World matrix translation x sits in the fourth column.
    let moved = forward.draws[0].uniform_range(block::LOCAL).unwrap();
    let bytes = app.device.buffer_contents(app.renderer.uniforms().handle()).unwrap();
    assert!((read_f32(bytes, moved.offset + 48) - 100.0).abs() < 1e-4);
}

#[test]
fn deferred_pass_order() {
    let mut app = default_app();
    render_mode(&mut app, RenderMode::Deferred);
    assert_eq!(app.device.pass_labels(), deferred_labels(true));
}

#[test]
fn deferred_without_debug_lights() {
    let mut app = default_app();
    app.device.clear_commands();
    app.frame(&input(), |_, settings| settings.show_debug_lights = false)
        .unwrap();
    assert_eq!(app.device.pass_labels(), deferred_labels(false));
}

#[test]
fn depth_blit_follows_lighting_and_mips_follow_bright_pixels() {
    let mut app = default_app();
    render_mode(&mut app, RenderMode::Deferred);

    let commands = app.device.commands();
    let position = |label: &str| {
        commands
            .iter()
            .position(|cmd| matches!(cmd, DeviceCommand::Pass(p) if p.label == label))
            .unwrap()
    };
    let targets = app.renderer.targets();

    let lighting = position("Lighting");
    assert_eq!(
        commands[lighting + 1],
        DeviceCommand::BlitDepth {
            src: targets.gbuffer,
            dst: targets.light,
            width: targets.width,
            height: targets.height,
        }
    );

    let bright = position("Bright Pixels");
    assert_eq!(commands[bright + 1], DeviceCommand::GenerateMipmaps(targets.bright));
}

#[test]
fn graphs_list_their_nodes() {
    let app = default_app();
    assert_eq!(app.renderer.graph(RenderMode::TexturedQuad).node_names(), vec!["Textured Quad"]);
    assert_eq!(app.renderer.graph(RenderMode::Forward).node_names(), vec!["Forward"]);
    assert_eq!(
        app.renderer.graph(RenderMode::Deferred).node_names(),
        vec![
            "Reflection",
            "Refraction",
            "Geometry",
            "Water",
            "Lighting",
            "Skybox",
            "Bloom",
            "Debug Lights"
        ]
    );
}

// ============================================================================
// Deferred stages
// ============================================================================

#[test]
fn water_scene_passes_clip_but_geometry_does_not() {
    let mut app = default_app();
    render_mode(&mut app, RenderMode::Deferred);
    let entities = app.scene.entities.len();

    for label in ["Reflection", "Refraction"] {
        let p = pass(&app, label);
        assert!(p.state.clip_distance, "{label}");
        assert_eq!(p.draws.len(), entities);
        assert!(p.draws.iter().all(|d| d.uniform_range(block::CLIP_PLANE).is_some()));
    }

    let geometry = pass(&app, "Geometry");
    assert!(!geometry.state.clip_distance);
    assert_eq!(geometry.draws.len(), entities);
    let camera = &app.scene.camera;
    for draw in &geometry.draws {
        assert!(draw.uniform_range(block::CLIP_PLANE).is_none());
        assert_eq!(draw.param_value(param::NEAR), Some(ParamValue::Float(camera.near)));
        assert_eq!(draw.param_value(param::FAR), Some(ParamValue::Float(camera.far)));
    }
}

#[test]
fn water_surface_samples_water_targets() {
    let mut app = default_app();
    render_mode(&mut app, RenderMode::Deferred);

    let targets = app.renderer.targets();
    let water = pass(&app, "Water");
    assert_eq!(
        water.target,
        RenderTarget::framebuffer(
            targets.gbuffer,
            &[gbuffer::ALBEDO, gbuffer::POSITION, gbuffer::NORMAL, gbuffer::DEPTH]
        )
    );
    let draw = &water.draws[0];
    assert_eq!(draw.texture_at(unit::REFLECTION), Some(targets.reflection.color));
    assert_eq!(draw.texture_at(unit::REFLECTION_DEPTH), Some(targets.reflection.depth));
    assert_eq!(draw.texture_at(unit::REFRACTION), Some(targets.refraction.color));
    assert_eq!(draw.texture_at(unit::REFRACTION_DEPTH), Some(targets.refraction.depth));
    assert!(draw.texture_at(unit::WATER_NORMAL).is_some());
    assert!(draw.texture_at(unit::WATER_DUDV).is_some());
    assert_eq!(
        draw.param_value(param::WATER_MOVE_FACTOR),
        Some(ParamValue::Float(app.scene.water.move_factor()))
    );
    assert_eq!(
        draw.param_value(param::WATER_VIEWPORT_SIZE),
        Some(ParamValue::Vec2(Vec2::new(800.0, 600.0)))
    );
}

#[test]
fn water_phase_advances_each_frame() {
    let mut app = default_app();
    let before = app.scene.water.move_factor();
    render_mode(&mut app, RenderMode::Deferred);
    let after = app.scene.water.move_factor();
    assert!(after > before);
    assert!(after < 1.0);
}

#[test]
fn lighting_reads_gbuffer_units() {
    let mut app = default_app();
    render_mode(&mut app, RenderMode::Deferred);

    let targets = app.renderer.targets();
    let lighting = pass(&app, "Lighting");
    assert_eq!(lighting.target.framebuffer_id(), Some(targets.light));
    let draw = &lighting.draws[0];
    assert_eq!(draw.texture_at(unit::GBUFFER_ALBEDO), Some(targets.gbuffer_colors[0]));
    assert_eq!(draw.texture_at(unit::GBUFFER_POSITION), Some(targets.gbuffer_colors[1]));
    assert_eq!(draw.texture_at(unit::GBUFFER_NORMAL), Some(targets.gbuffer_colors[2]));
    assert_eq!(draw.uniform_range(block::GLOBAL), Some(app.renderer.frame_params().global));
}

#[test]
fn skybox_binds_cube_map() {
    let mut app = default_app();
    render_mode(&mut app, RenderMode::Deferred);

    let skybox = app.renderer.builtins().skybox;
    for label in ["Skybox", "Reflection Skybox"] {
        let p = pass(&app, label);
        assert!(p.clear.is_none(), "{label} draws over the scene");
        assert_eq!(p.draws[0].texture_at(unit::SKYBOX), Some(skybox));
    }
    let view = pass(&app, "Skybox").draws[0].param_value(param::SKYBOX_VIEW);
    assert_eq!(view, Some(ParamValue::Mat4(app.scene.camera.rotation_only_view())));
}

#[test]
fn deferred_with_no_lights() {
    let mut app = app_with(HeadlessDevice::default(), RendererSettings::default());
    app.add_primitive(PrimitiveKind::Cube).unwrap();
    render_mode(&mut app, RenderMode::Deferred);

    assert!(app.device.pass_labels().contains(&"Lighting".to_string()));
    assert_eq!(app.renderer.frame_params().global.size, 16);
    assert!(pass(&app, "Debug Lights").draws.is_empty());
}

// ============================================================================
// Bloom
// ============================================================================

#[test]
fn bloom_levels_halve_per_level() {
    let mut app = default_app();
    render_mode(&mut app, RenderMode::Deferred);
    let targets = app.renderer.targets();

    let bright = pass(&app, "Bright Pixels");
    assert_eq!(bright.viewport, Viewport::sized(400, 300));
    assert_eq!(bright.draws[0].texture_at(0), Some(targets.main));
    assert_eq!(
        bright.draws[0].param_value(param::THRESHOLD),
        Some(ParamValue::Float(app.renderer.settings().bloom.threshold()))
    );

    for level in 0..BLOOM_LEVELS {
        let shift = level as u32 + 1;
        let expected = Viewport::sized(800 >> shift, 600 >> shift);

        let horizontal = pass(&app, &format!("Blur Horizontal {level}"));
        assert_eq!(horizontal.viewport, expected);
        assert_eq!(
            horizontal.target,
            RenderTarget::framebuffer(targets.bloom_levels[level], &[bloom_slot::BLUR])
        );
        let draw = &horizontal.draws[0];
        assert_eq!(draw.texture_at(0), Some(targets.bright));
        assert_eq!(draw.param_value(param::BLUR_INPUT_LOD), Some(ParamValue::Int(level as i32)));
        assert_eq!(draw.param_value(param::BLUR_DIRECTION), Some(ParamValue::Vec2(Vec2::X)));

        let vertical = pass(&app, &format!("Blur Vertical {level}"));
        assert_eq!(
            vertical.target,
            RenderTarget::framebuffer(targets.bloom_levels[level], &[bloom_slot::BRIGHT])
        );
        assert_eq!(vertical.draws[0].texture_at(0), Some(targets.blur));
        assert_eq!(
            vertical.draws[0].param_value(param::BLUR_DIRECTION),
            Some(ParamValue::Vec2(Vec2::Y))
        );
    }
}

#[test]
fn bloom_chains_clamp_to_edge() {
    let app = default_app();
    let targets = app.renderer.targets();
    for chain in [targets.bright, targets.blur] {
        let sampler = app.device.texture_desc(chain).unwrap().sampler;
        assert_eq!(sampler.wrap, WrapMode::ClampToEdge);
        assert!(sampler.mipmaps);
    }
}

#[test]
fn bloom_settings_flow_into_blur_parameters() {
    let mut app = default_app();
    app.device.clear_commands();
    app.frame(&input(), |_, settings| {
        settings.bloom.set_intensity(2, 0.5);
        settings.bloom.set_kernel_radius(8);
    })
    .unwrap();

    let draw = &pass(&app, "Blur Horizontal 2").draws[0];
    assert_eq!(draw.param_value(param::BLUR_LOD_INTENSITY), Some(ParamValue::Float(0.5)));
    assert_eq!(draw.param_value(param::BLUR_KERNEL_RADIUS), Some(ParamValue::Int(8)));
}

#[test]
fn bloom_composite_adds_chain_onto_main() {
    let mut app = default_app();
    render_mode(&mut app, RenderMode::Deferred);
    let targets = app.renderer.targets();

    let composite = pass(&app, "Bloom Composite");
    assert_eq!(composite.target.framebuffer_id(), Some(targets.bloom));
    let draw = &composite.draws[0];
    assert_eq!(draw.texture_at(unit::BLOOM_MAIN), Some(targets.main));
    assert_eq!(draw.texture_at(unit::BLOOM_CHAIN), Some(targets.bright));
    assert_eq!(
        draw.param_value(param::BLOOM_MAX_LOD),
        Some(ParamValue::Int(BLOOM_LEVELS as i32 - 1))
    );
}

// ============================================================================
// Debug lights
// ============================================================================

#[test]
fn debug_lights_draw_one_gizmo_per_light() {
    let mut app = default_app();
    render_mode(&mut app, RenderMode::Deferred);

    let lights = pass(&app, "Debug Lights");
    assert_eq!(lights.draws.len(), app.scene.lights.len());
    assert_eq!(lights.target.framebuffer_id(), Some(app.renderer.targets().bloom));
    let color = app.scene.lights[0].color;
    assert_eq!(lights.draws[0].param_value(param::LIGHT_COLOR), Some(ParamValue::Vec3(color)));
}

#[test]
fn debug_lights_target_follows_preview() {
    let mut app = default_app();
    app.device.clear_commands();
    app.frame(&input(), |_, settings| settings.preview = PreviewTarget::WithoutBloom)
        .unwrap();
    let lights = pass(&app, "Debug Lights");
    assert_eq!(lights.target.framebuffer_id(), Some(app.renderer.targets().light));
}

// ============================================================================
// Outputs & validation
// ============================================================================

#[test]
fn output_texture_per_mode() {
    let mut app = default_app();
    let targets = app.renderer.targets();
    assert_eq!(app.renderer.output_texture(RenderMode::TexturedQuad), None);
    assert_eq!(app.renderer.output_texture(RenderMode::Forward), Some(targets.main));
    assert_eq!(app.renderer.output_texture(RenderMode::Deferred), Some(targets.bloom_output));

    app.renderer.settings_mut().preview = PreviewTarget::Normal;
    let normal = app.renderer.targets().gbuffer_colors[gbuffer::NORMAL as usize];
    assert_eq!(app.renderer.output_texture(RenderMode::Deferred), Some(normal));
}

#[test]
fn all_render_targets_are_complete() {
    use tidal::GpuDevice;
    let app = default_app();
    for framebuffer in app.renderer.targets().framebuffers() {
        assert!(app.device.framebuffer_status(framebuffer).is_complete());
    }
}

#[test]
fn every_mode_renders_without_validation_errors() {
    let mut app = default_app();
    for mode in RenderMode::ALL {
        render_mode(&mut app, mode);
        render_mode(&mut app, mode);
    }
    assert!(app.device.validation_errors().is_empty(), "{:?}", app.device.validation_errors());
}

#[test]
fn vertex_arrays_are_cached_across_frames() {
    let mut app = default_app();
    render_mode(&mut app, RenderMode::Deferred);
    let count = app.device.vertex_array_count();
    render_mode(&mut app, RenderMode::Deferred);
    assert_eq!(app.device.vertex_array_count(), count);
}

// ============================================================================
// App
// ============================================================================

#[test]
fn app_run_counts_frames() {
    let mut app = default_app();
    let frames = app.run(std::iter::repeat_with(input).take(3)).unwrap();
    assert_eq!(frames, 3);
    assert_eq!(app.frame_index(), 3);
}

#[test]
fn add_primitive_numbers_duplicates() {
    let mut app = app_with(HeadlessDevice::default(), RendererSettings::default());
    let first = app.add_primitive(PrimitiveKind::Sphere).unwrap();
    let second = app.add_primitive(PrimitiveKind::Sphere).unwrap();
    app.add_primitive(PrimitiveKind::Cube).unwrap();

    assert_eq!(app.scene.entities[first].name, "Sphere");
    assert_eq!(app.scene.entities[second].name, "Sphere 1");
    assert!(app.scene.entity("Cube").is_some());
    assert_eq!(
        app.scene.entities[first].model,
        app.renderer.primitive_model(PrimitiveKind::Sphere)
    );
}

#[test]
fn add_primitive_names_stay_unique_after_removal() {
    let mut app = app_with(HeadlessDevice::default(), RendererSettings::default());
    app.add_primitive(PrimitiveKind::Cube).unwrap();
    app.add_primitive(PrimitiveKind::Cube).unwrap();
    app.scene.entities.remove(0);
    let third = app.add_primitive(PrimitiveKind::Cube).unwrap();

    assert_eq!(app.scene.entities[third].name, "Cube 2");
    let names: Vec<&str> = app.scene.entities.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["Cube 1", "Cube 2"]);
}

#[test]
fn default_scene_contents() {
    let app = default_app();
    assert_eq!(app.scene.lights.len(), 6);
    assert_eq!(app.scene.entities.len(), 4);
    assert!(app.scene.light("Directional Light").is_some());
    assert!(app.scene.light("Point Light 5").is_some());
    assert!(app.scene.entity("Torus").is_some());
}

#[test]
fn entities_without_models_are_skipped() {
    let mut app = default_app();
    app.scene.add_entity(Entity::new("Ghost", Handle::NONE));
    render_mode(&mut app, RenderMode::Forward);
    assert_eq!(pass(&app, "Forward").draws.len(), app.scene.entities.len() - 1);
}

#[test]
fn missing_shader_keeps_rendering() {
    let mut partial = StaticShaderLoader::new();
    for program in BuiltinProgram::ALL {
        if program != BuiltinProgram::Bloom {
            partial.insert(program.name(), format!("// {}", program.name()));
        }
    }

    let mut app = App::new(
        HeadlessDevice::default(),
        &mut partial,
        &mut images(),
        RendererSettings::default(),
    )
    .unwrap();
    app.populate_default_scene().unwrap();
    render_mode(&mut app, RenderMode::Deferred);

    let bloom = app.registry.program(app.renderer.programs().bloom).unwrap();
    assert!(!bloom.valid);
    assert!(app.device.find_pass("Bloom Composite").is_some());
}

#[test]
fn arena_overflow_aborts_the_frame() {
    let limits = DeviceLimits {
        max_uniform_block_size: 1024,
        uniform_offset_alignment: 256,
    };
    let mut app = app_with(HeadlessDevice::new(limits), RendererSettings::default());
    app.populate_default_scene().unwrap();

    let result = app.frame(&input(), |_, _| {});
    assert!(matches!(result, Err(TidalError::UniformBufferOverflow { .. })));
    assert_eq!(app.frame_index(), 0);
    assert!(app.run(std::iter::once(input())).is_err());
}
