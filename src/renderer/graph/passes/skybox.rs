use std::borrow::Cow;

use crate::errors::Result;
use crate::renderer::core::{BlendMode, CompareFunction, ParamValue, PipelineState, RenderPass, RenderTarget};
use crate::renderer::graph::{FrameContext, RenderNode};
use crate::renderer::programs::{param, unit};
use crate::scene::Camera;

/// Depth-tested at the far plane, never written.
pub const SKYBOX_STATE: PipelineState = PipelineState {
    depth_test: Some(CompareFunction::LessEqual),
    depth_write: false,
    blend: BlendMode::Disabled,
    clip_distance: false,
};

/// Draws the skybox cube into `target` as seen by `camera`, without
/// clearing it. The view keeps only the camera's rotation.
pub fn draw_skybox(
    ctx: &mut FrameContext<'_>,
    label: impl Into<Cow<'static, str>>,
    target: RenderTarget,
    camera: &Camera,
) -> Result<()> {
    let draw = ctx
        .mesh_draw(ctx.builtins.skybox_cube, ctx.programs.skybox)?
        .texture(unit::SKYBOX, ctx.builtins.skybox)
        .param(param::SKYBOX_VIEW, ParamValue::Mat4(camera.rotation_only_view()))
        .param(param::SKYBOX_PROJECTION, ParamValue::Mat4(camera.projection()));

    let mut pass = RenderPass::new(label, target, ctx.display_viewport()).with_state(SKYBOX_STATE);
    pass.draw(draw);
    ctx.submit(&pass);
    Ok(())
}

/// Skybox behind the lit image.
pub struct SkyboxNode;

impl RenderNode for SkyboxNode {
    fn name(&self) -> &'static str {
        "Skybox"
    }

    fn run(&self, ctx: &mut FrameContext<'_>) -> Result<()> {
        let camera = ctx.scene.camera.clone();
        let target = RenderTarget::framebuffer(ctx.targets.light, &[0]);
        draw_skybox(ctx, self.name(), target, &camera)
    }
}
