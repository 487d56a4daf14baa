use crate::errors::Result;
use crate::renderer::core::{BlendMode, ClearOp, PipelineState, RenderPass, RenderTarget};
use crate::renderer::graph::{FrameContext, RenderNode};
use crate::renderer::programs::unit;

/// Draws one texture over the whole screen with alpha blending.
pub struct TexturedQuadNode;

impl RenderNode for TexturedQuadNode {
    fn name(&self) -> &'static str {
        "Textured Quad"
    }

    fn run(&self, ctx: &mut FrameContext<'_>) -> Result<()> {
        let program = ctx.programs.textured_quad;
        let texture = ctx
            .registry
            .texture_or(ctx.builtins.quad_texture, ctx.registry.defaults().white);

        let draw = ctx.quad_draw(program)?.texture(unit::ALBEDO, texture);
        let mut pass = RenderPass::new(self.name(), RenderTarget::Screen, ctx.display_viewport())
            .with_clear(ClearOp::all(ctx.settings.clear_color))
            .with_state(PipelineState::FULLSCREEN.with_blend(BlendMode::Alpha));
        pass.draw(draw);
        ctx.submit(&pass);
        Ok(())
    }
}
