//! Render targets owned by the renderer.
//!
//! All targets are created at display size once, at startup:
//!
//! | framebuffer    | color attachments                        | depth        |
//! |----------------|------------------------------------------|--------------|
//! | g-buffer       | albedo, position, normal, depth (RGBA16F) | g-buffer     |
//! | light          | main (RGBA16F)                           | light depth  |
//! | forward        | main                                     | light depth  |
//! | bloom          | bloom output (RGBA16F)                   | light depth  |
//! | bloom level i  | bright mip i, blur mip i                 | none         |
//! | reflection     | RGBA8                                    | depth texture|
//! | refraction     | RGBA8                                    | depth texture|
//!
//! The bright and blur chains are half resolution with one mip per bloom
//! level.

use smallvec::SmallVec;

use super::settings::{BLOOM_LEVELS, PreviewTarget};
use crate::renderer::core::{
    Attachment, FramebufferDesc, FramebufferId, GpuDevice, SamplerDesc, TextureDesc, TextureFormat, TextureId,
};

/// G-buffer color attachment slots.
pub mod gbuffer {
    pub const ALBEDO: u32 = 0;
    pub const POSITION: u32 = 1;
    pub const NORMAL: u32 = 2;
    pub const DEPTH: u32 = 3;
}

/// Bloom level framebuffer slots.
pub mod bloom_slot {
    /// Mip of the bright chain.
    pub const BRIGHT: u32 = 0;
    /// Mip of the horizontal blur chain.
    pub const BLUR: u32 = 1;
}

/// A color target with its depth companion, used by the water passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaterTarget {
    pub framebuffer: FramebufferId,
    pub color: TextureId,
    pub depth: TextureId,
}

#[derive(Debug, Clone)]
pub struct RenderTargets {
    pub width: u32,
    pub height: u32,

    pub gbuffer: FramebufferId,
    /// Albedo, position, normal, linear depth.
    pub gbuffer_colors: [TextureId; 4],
    pub gbuffer_depth: TextureId,

    /// Lit image before bloom.
    pub main: TextureId,
    /// Lit image with bloom composited.
    pub bloom_output: TextureId,
    /// Depth shared by the light, forward and bloom framebuffers.
    pub light_depth: TextureId,
    pub light: FramebufferId,
    pub forward: FramebufferId,
    pub bloom: FramebufferId,

    pub bright: TextureId,
    pub blur: TextureId,
    pub bloom_levels: SmallVec<[FramebufferId; BLOOM_LEVELS]>,

    pub reflection: WaterTarget,
    pub refraction: WaterTarget,
}

impl RenderTargets {
    pub fn new(device: &mut dyn GpuDevice, width: u32, height: u32) -> Self {
        let (width, height) = (width.max(1), height.max(1));
        let color = |label: &'static str| {
            TextureDesc::new_2d(label, TextureFormat::Rgba16Float, width, height, SamplerDesc::TARGET)
        };
        let depth = |label: &'static str| {
            TextureDesc::new_2d(label, TextureFormat::Depth32Float, width, height, SamplerDesc::NEAREST)
        };

        // G-buffer
        let gbuffer_colors = [
            device.create_texture(&color("G-Buffer Albedo")),
            device.create_texture(&color("G-Buffer Position")),
            device.create_texture(&color("G-Buffer Normal")),
            device.create_texture(&color("G-Buffer Depth")),
        ];
        let gbuffer_depth = device.create_texture(&depth("G-Buffer Depth Attachment"));
        let mut desc = FramebufferDesc::new("G-Buffer");
        for texture in gbuffer_colors {
            desc = desc.color(Attachment::base(texture));
        }
        let gbuffer = create_checked(device, &desc.depth(Attachment::base(gbuffer_depth)));

        // Lighting / forward / bloom output
        let main = device.create_texture(&color("Main Color"));
        let bloom_output = device.create_texture(&color("Bloom Output"));
        let light_depth = device.create_texture(&depth("Light Depth"));
        let light = create_checked(
            device,
            &FramebufferDesc::new("Light Buffer")
                .color(Attachment::base(main))
                .depth(Attachment::base(light_depth)),
        );
        let forward = create_checked(
            device,
            &FramebufferDesc::new("Forward Buffer")
                .color(Attachment::base(main))
                .depth(Attachment::base(light_depth)),
        );
        let bloom = create_checked(
            device,
            &FramebufferDesc::new("Bloom Buffer")
                .color(Attachment::base(bloom_output))
                .depth(Attachment::base(light_depth)),
        );

        // Bloom chains
        let (half_width, half_height) = ((width / 2).max(1), (height / 2).max(1));
        let chain = |label: &'static str| {
            TextureDesc::new_2d(
                label,
                TextureFormat::Rgba16Float,
                half_width,
                half_height,
                SamplerDesc::TARGET_MIPMAPPED,
            )
                .with_mip_levels(BLOOM_LEVELS as u32)
        };
        let bright = device.create_texture(&chain("Bloom Bright"));
        let blur = device.create_texture(&chain("Bloom Blur"));
        let bloom_levels = (0..BLOOM_LEVELS as u32)
            .map(|level| {
                create_checked(
                    device,
                    &FramebufferDesc::new(format!("Bloom Level {level}"))
                        .color(Attachment::level(bright, level))
                        .color(Attachment::level(blur, level)),
                )
            })
            .collect();

        let reflection = create_water_target(device, "Reflection", width, height);
        let refraction = create_water_target(device, "Refraction", width, height);

        log::debug!("Render targets created at {width}x{height}");

        Self {
            width,
            height,
            gbuffer,
            gbuffer_colors,
            gbuffer_depth,
            main,
            bloom_output,
            light_depth,
            light,
            forward,
            bloom,
            bright,
            blur,
            bloom_levels,
            reflection,
            refraction,
        }
    }

    /// Texture shown for a preview selection.
    #[must_use]
    pub fn preview(&self, target: PreviewTarget) -> TextureId {
        match target {
            PreviewTarget::Main => self.bloom_output,
            PreviewTarget::WithoutBloom => self.main,
            PreviewTarget::Color => self.gbuffer_colors[gbuffer::ALBEDO as usize],
            PreviewTarget::Position => self.gbuffer_colors[gbuffer::POSITION as usize],
            PreviewTarget::Normal => self.gbuffer_colors[gbuffer::NORMAL as usize],
            PreviewTarget::Depth => self.gbuffer_colors[gbuffer::DEPTH as usize],
            PreviewTarget::Reflection => self.reflection.color,
            PreviewTarget::Refraction => self.refraction.color,
        }
    }

    /// Every framebuffer, for status reporting.
    pub fn framebuffers(&self) -> impl Iterator<Item = FramebufferId> + '_ {
        [
            self.gbuffer,
            self.light,
            self.forward,
            self.bloom,
            self.reflection.framebuffer,
            self.refraction.framebuffer,
        ]
        .into_iter()
        .chain(self.bloom_levels.iter().copied())
    }
}

fn create_water_target(device: &mut dyn GpuDevice, label: &'static str, width: u32, height: u32) -> WaterTarget {
    let color = device.create_texture(&TextureDesc::new_2d(
        format!("{label} Color"),
        TextureFormat::Rgba8Unorm,
        width,
        height,
        SamplerDesc::TARGET,
    ));
    let depth = device.create_texture(&TextureDesc::new_2d(
        format!("{label} Depth"),
        TextureFormat::Depth32Float,
        width,
        height,
        SamplerDesc::TARGET,
    ));
    let framebuffer = create_checked(
        device,
        &FramebufferDesc::new(format!("{label} Buffer"))
            .color(Attachment::base(color))
            .depth(Attachment::base(depth)),
    );
    WaterTarget {
        framebuffer,
        color,
        depth,
    }
}

/// Creates a framebuffer and logs why it is incomplete, if it is.
fn create_checked(device: &mut dyn GpuDevice, desc: &FramebufferDesc) -> FramebufferId {
    let framebuffer = device.create_framebuffer(desc);
    let status = device.framebuffer_status(framebuffer);
    if !status.is_complete() {
        log::error!("Framebuffer '{}' is incomplete: {status}", desc.label);
    }
    framebuffer
}
