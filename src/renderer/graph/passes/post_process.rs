//! Post-Process Passes
//!
//! Full-screen passes over the shared quad, parameterized by target
//! framebuffer, viewport, written attachment, input textures and scalars.
//! They never depth-test.

use glam::Vec2;

use crate::errors::Result;
use crate::renderer::core::{
    BlendMode, ClearOp, FramebufferId, ParamValue, PipelineState, RenderPass, RenderTarget, TextureId, Viewport,
};
use crate::renderer::graph::FrameContext;
use crate::renderer::programs::{param, unit};

const BLACK: [f32; 4] = [0.0, 0.0, 0.0, 1.0];

/// Where a post-process pass writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostTarget {
    pub framebuffer: FramebufferId,
    pub viewport: Viewport,
    /// Color attachment slot written.
    pub attachment: u32,
}

impl PostTarget {
    fn render_target(self) -> RenderTarget {
        RenderTarget::framebuffer(self.framebuffer, &[self.attachment])
    }
}

/// Keeps the pixels of `source` brighter than `threshold`.
pub fn blit_bright_pixels(
    ctx: &mut FrameContext<'_>,
    target: PostTarget,
    source: TextureId,
    threshold: f32,
) -> Result<()> {
    let draw = ctx
        .quad_draw(ctx.programs.bright_pixels)?
        .texture(0, source)
        .param(param::THRESHOLD, ParamValue::Float(threshold));

    let mut pass = RenderPass::new("Bright Pixels", target.render_target(), target.viewport)
        .with_clear(ClearOp::color(BLACK))
        .with_state(PipelineState::FULLSCREEN);
    pass.draw(draw);
    ctx.submit(&pass);
    Ok(())
}

/// One separable blur step reading mip `input_lod` of `source`.
///
/// `direction` is `(1, 0)` for the horizontal step and `(0, 1)` for the
/// vertical one.
pub fn blur(
    ctx: &mut FrameContext<'_>,
    target: PostTarget,
    source: TextureId,
    input_lod: u32,
    direction: Vec2,
    intensity: f32,
) -> Result<()> {
    let kernel_radius = ctx.settings.bloom.kernel_radius();
    let draw = ctx
        .quad_draw(ctx.programs.blur)?
        .texture(0, source)
        .param(param::BLUR_DIRECTION, ParamValue::Vec2(direction))
        .param(param::BLUR_INPUT_LOD, ParamValue::Int(input_lod as i32))
        .param(param::BLUR_KERNEL_RADIUS, ParamValue::Int(kernel_radius as i32))
        .param(param::BLUR_LOD_INTENSITY, ParamValue::Float(intensity));

    let label = if direction.x > direction.y { "Blur Horizontal" } else { "Blur Vertical" };
    let mut pass = RenderPass::new(format!("{label} {input_lod}"), target.render_target(), target.viewport)
        .with_clear(ClearOp::color(BLACK))
        .with_state(PipelineState::FULLSCREEN);
    pass.draw(draw);
    ctx.submit(&pass);
    Ok(())
}

/// Adds the blurred chain (levels `0..=max_lod`) onto `main`.
pub fn bloom_composite(
    ctx: &mut FrameContext<'_>,
    target: PostTarget,
    main: TextureId,
    chain: TextureId,
    max_lod: u32,
) -> Result<()> {
    let draw = ctx
        .quad_draw(ctx.programs.bloom)?
        .texture(unit::BLOOM_MAIN, main)
        .texture(unit::BLOOM_CHAIN, chain)
        .param(param::BLOOM_MAX_LOD, ParamValue::Int(max_lod as i32));

    // Color only: the depth attachment is shared with the light target.
    let mut pass = RenderPass::new("Bloom Composite", target.render_target(), target.viewport)
        .with_clear(ClearOp::color(BLACK))
        .with_state(PipelineState::FULLSCREEN.with_blend(BlendMode::Additive));
    pass.draw(draw);
    ctx.submit(&pass);
    Ok(())
}
