use crate::errors::Result;
use crate::renderer::core::{ClearOp, PipelineState, RenderPass, RenderTarget};
use crate::renderer::graph::{FrameContext, RenderNode};
use crate::renderer::programs::unit;
use crate::renderer::targets::gbuffer;

/// Deferred lighting over the G-buffer, then the G-buffer depth copied into
/// the light target so later passes depth-test against the scene.
pub struct LightingNode;

impl RenderNode for LightingNode {
    fn name(&self) -> &'static str {
        "Lighting"
    }

    fn run(&self, ctx: &mut FrameContext<'_>) -> Result<()> {
        let colors = ctx.targets.gbuffer_colors;
        let draw = ctx.quad_draw(ctx.programs.lighting)?;
        let draw = ctx
            .with_global_block(draw)
            .texture(unit::GBUFFER_ALBEDO, colors[gbuffer::ALBEDO as usize])
            .texture(unit::GBUFFER_POSITION, colors[gbuffer::POSITION as usize])
            .texture(unit::GBUFFER_NORMAL, colors[gbuffer::NORMAL as usize]);

        let target = RenderTarget::framebuffer(ctx.targets.light, &[0]);
        let mut pass = RenderPass::new(self.name(), target, ctx.display_viewport())
            .with_clear(ClearOp::color([0.0, 0.0, 0.0, 1.0]))
            .with_state(PipelineState::FULLSCREEN);
        pass.draw(draw);
        ctx.submit(&pass);

        let (width, height) = (ctx.targets.width, ctx.targets.height);
        ctx.device.blit_depth(ctx.targets.gbuffer, ctx.targets.light, width, height);
        Ok(())
    }
}
