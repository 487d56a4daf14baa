//! Bloom
//!
//! 1. Pixels above the threshold are copied into mip 0 of the bright chain
//!    at half resolution, and the rest of the chain is generated from it.
//! 2. Each level is blurred horizontally into the blur chain, then
//!    vertically back into the bright chain. Level `i` is
//!    `display / 2^(i + 1)` in size.
//! 3. The bright chain is added onto the lit image in the bloom output.

use glam::Vec2;

use super::post_process::{PostTarget, blit_bright_pixels, bloom_composite, blur};
use crate::errors::Result;
use crate::renderer::core::Viewport;
use crate::renderer::graph::{FrameContext, RenderNode};
use crate::renderer::settings::BLOOM_LEVELS;
use crate::renderer::targets::bloom_slot;

pub struct BloomNode;

impl BloomNode {
    fn level_viewport(ctx: &FrameContext<'_>, level: usize) -> Viewport {
        let shift = level as u32 + 1;
        Viewport::sized((ctx.targets.width >> shift).max(1), (ctx.targets.height >> shift).max(1))
    }
}

impl RenderNode for BloomNode {
    fn name(&self) -> &'static str {
        "Bloom"
    }

    fn run(&self, ctx: &mut FrameContext<'_>) -> Result<()> {
        let targets = ctx.targets;
        let bloom = ctx.settings.bloom.clone();

        blit_bright_pixels(
            ctx,
            PostTarget {
                framebuffer: targets.bloom_levels[0],
                viewport: Self::level_viewport(ctx, 0),
                attachment: bloom_slot::BRIGHT,
            },
            targets.main,
            bloom.threshold(),
        )?;
        ctx.device.generate_mipmaps(targets.bright);

        for (level, &framebuffer) in targets.bloom_levels.iter().enumerate().take(BLOOM_LEVELS) {
            let target = PostTarget {
                framebuffer,
                viewport: Self::level_viewport(ctx, level),
                attachment: bloom_slot::BLUR,
            };
            blur(ctx, target, targets.bright, level as u32, Vec2::X, bloom.intensity(level))?;
        }

        for (level, &framebuffer) in targets.bloom_levels.iter().enumerate().take(BLOOM_LEVELS) {
            let target = PostTarget {
                framebuffer,
                viewport: Self::level_viewport(ctx, level),
                attachment: bloom_slot::BRIGHT,
            };
            blur(ctx, target, targets.blur, level as u32, Vec2::Y, bloom.intensity(level))?;
        }

        bloom_composite(
            ctx,
            PostTarget {
                framebuffer: targets.bloom,
                viewport: ctx.display_viewport(),
                attachment: 0,
            },
            targets.main,
            targets.bright,
            BLOOM_LEVELS as u32 - 1,
        )
    }
}
