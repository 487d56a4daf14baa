//! Water passes.
//!
//! The reflection and refraction passes render the scene into their own
//! targets, clipped at the water height; the surface pass then draws the
//! water plane into the G-buffer sampling both.

use glam::Vec2;

use super::scene::{SceneDrawOptions, record_scene_draws};
use super::skybox::draw_skybox;
use crate::errors::Result;
use crate::renderer::core::{BlendMode, ClearOp, ParamValue, PipelineState, RenderPass, RenderTarget};
use crate::renderer::graph::{FrameContext, RenderNode};
use crate::renderer::programs::{param, unit};
use crate::renderer::targets::gbuffer;
use crate::resources::PrimitiveKind;
use crate::scene::Camera;

const SCENE_CLEAR: ClearOp = ClearOp::all([0.0, 0.0, 0.0, 1.0]);

/// Records the scene from `camera` into a water target with clipping on.
fn clipped_scene_pass(
    ctx: &mut FrameContext<'_>,
    label: &'static str,
    target: RenderTarget,
) -> Result<RenderPass> {
    let mut pass = RenderPass::new(label, target, ctx.display_viewport())
        .with_clear(SCENE_CLEAR)
        .with_state(PipelineState::OPAQUE.with_blend(BlendMode::Alpha).with_clip_distance(true));
    let options = SceneDrawOptions {
        program: ctx.programs.geometry,
        depth_range: true,
        clip_plane: true,
    };
    record_scene_draws(ctx, &mut pass, options)?;
    Ok(pass)
}

/// The scene mirrored about the water surface, followed by the sky.
pub struct ReflectionNode;

impl RenderNode for ReflectionNode {
    fn name(&self) -> &'static str {
        "Reflection"
    }

    fn run(&self, ctx: &mut FrameContext<'_>) -> Result<()> {
        let camera = ctx.scene.camera.reflected(ctx.scene.water.height());
        let clip = ctx.scene.water.reflection_clip_plane();
        ctx.pack(&camera, Some(clip))?;

        let target = RenderTarget::framebuffer(ctx.targets.reflection.framebuffer, &[0]);
        let pass = clipped_scene_pass(ctx, self.name(), target.clone())?;
        ctx.submit(&pass);
        draw_skybox(ctx, "Reflection Skybox", target, &camera)
    }
}

/// The scene below the water surface, from the main camera.
///
/// Leaves the uniform arena packed for the main camera, which the
/// geometry pass reuses.
pub struct RefractionNode;

impl RenderNode for RefractionNode {
    fn name(&self) -> &'static str {
        "Refraction"
    }

    fn run(&self, ctx: &mut FrameContext<'_>) -> Result<()> {
        let camera: Camera = ctx.scene.camera.clone();
        let clip = ctx.scene.water.refraction_clip_plane();
        ctx.pack(&camera, Some(clip))?;

        let target = RenderTarget::framebuffer(ctx.targets.refraction.framebuffer, &[0]);
        let pass = clipped_scene_pass(ctx, self.name(), target)?;
        ctx.submit(&pass);
        Ok(())
    }
}

/// The animated water plane, drawn into the G-buffer.
pub struct WaterSurfaceNode;

impl RenderNode for WaterSurfaceNode {
    fn name(&self) -> &'static str {
        "Water"
    }

    fn run(&self, ctx: &mut FrameContext<'_>) -> Result<()> {
        let move_factor = ctx.scene.water.advance(ctx.delta_time);

        let mesh = ctx.primitive_mesh(PrimitiveKind::Plane)?;

        let camera = &ctx.scene.camera;
        let model_view = camera.view() * ctx.scene.water.model_matrix();
        let projection = camera.projection();
        let viewport = Vec2::new(ctx.targets.width as f32, ctx.targets.height as f32);

        let registry = &*ctx.registry;
        let water_normal = registry.texture_or(ctx.builtins.water_normal, registry.defaults().normal);
        let water_dudv = registry.texture_or(ctx.builtins.water_dudv, registry.defaults().black);
        let (reflection, refraction) = (ctx.targets.reflection, ctx.targets.refraction);

        let draw = ctx
            .mesh_draw(mesh, ctx.programs.water)?
            .texture(unit::REFLECTION, reflection.color)
            .texture(unit::REFLECTION_DEPTH, reflection.depth)
            .texture(unit::REFRACTION, refraction.color)
            .texture(unit::REFRACTION_DEPTH, refraction.depth)
            .texture(unit::WATER_NORMAL, water_normal)
            .texture(unit::WATER_DUDV, water_dudv)
            .param(param::WATER_PROJECTION, ParamValue::Mat4(projection))
            .param(param::WATER_VIEW, ParamValue::Mat4(model_view))
            .param(param::WATER_VIEWPORT_SIZE, ParamValue::Vec2(viewport))
            .param(param::WATER_VIEW_INVERSE, ParamValue::Mat4(model_view.inverse()))
            .param(param::WATER_PROJECTION_INVERSE, ParamValue::Mat4(projection.inverse()))
            .param(param::WATER_MOVE_FACTOR, ParamValue::Float(move_factor));

        let target = RenderTarget::framebuffer(
            ctx.targets.gbuffer,
            &[gbuffer::ALBEDO, gbuffer::POSITION, gbuffer::NORMAL, gbuffer::DEPTH],
        );
        let mut pass = RenderPass::new(self.name(), target, ctx.display_viewport())
            .with_state(PipelineState::OPAQUE.with_blend(BlendMode::Alpha));
        pass.draw(draw);
        ctx.submit(&pass);
        Ok(())
    }
}
