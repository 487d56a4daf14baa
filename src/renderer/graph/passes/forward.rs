use super::scene::{SceneDrawOptions, record_scene_draws};
use crate::errors::Result;
use crate::renderer::core::{ClearOp, PipelineState, RenderPass, RenderTarget};
use crate::renderer::graph::{FrameContext, RenderNode};

/// Single-pass lit rendering into the forward target.
pub struct ForwardNode;

impl RenderNode for ForwardNode {
    fn name(&self) -> &'static str {
        "Forward"
    }

    fn run(&self, ctx: &mut FrameContext<'_>) -> Result<()> {
        let target = RenderTarget::framebuffer(ctx.targets.forward, &[0]);
        let mut pass = RenderPass::new(self.name(), target, ctx.display_viewport())
            .with_clear(ClearOp::all(ctx.settings.clear_color))
            .with_state(PipelineState::OPAQUE);
        let options = SceneDrawOptions {
            program: ctx.programs.forward_geometry,
            depth_range: false,
            clip_plane: false,
        };
        record_scene_draws(ctx, &mut pass, options)?;
        ctx.submit(&pass);
        Ok(())
    }
}
