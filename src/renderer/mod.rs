//! Renderer
//!
//! [`Renderer`] owns the uniform arena, the render targets, the built-in
//! programs and resources, and one [`RenderGraph`] per [`RenderMode`]. Each
//! frame it reads the scene's mode once and runs the matching graph:
//!
//! - `TexturedQuad`: one textured full-screen quad on screen.
//! - `Forward`: the lit scene into the forward target.
//! - `Deferred`: reflection, refraction, geometry, water, lighting, skybox,
//!   bloom and optional light gizmos.

pub mod builtins;
pub mod core;
pub mod frame_params;
pub mod graph;
pub mod programs;
pub mod settings;
pub mod targets;
pub mod vertex_binding;

use serde::{Deserialize, Serialize};

use self::builtins::BuiltinResources;
use self::core::{Buffer, BufferKind, DeviceLimits, GpuDevice, TextureId};
use self::frame_params::{FrameParams, pack_frame};
use self::graph::passes::{
    BloomNode, DebugLightsNode, ForwardNode, GeometryNode, LightingNode, ReflectionNode, RefractionNode, SkyboxNode,
    TexturedQuadNode, WaterSurfaceNode,
};
use self::graph::{FrameContext, RenderGraph};
use self::programs::ProgramLibrary;
use self::settings::{PreviewTarget, RendererSettings};
use self::targets::RenderTargets;
use crate::assets::{ImageLoader, ShaderLoader};
use crate::errors::Result;
use crate::resources::{Handle, Model, PrimitiveKind, ResourceRegistry};
use crate::scene::Scene;

/// Which pipeline renders the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RenderMode {
    TexturedQuad,
    Forward,
    #[default]
    Deferred,
}

impl RenderMode {
    pub const ALL: [Self; 3] = [Self::TexturedQuad, Self::Forward, Self::Deferred];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::TexturedQuad => "Textured Quad",
            Self::Forward => "Forward",
            Self::Deferred => "Deferred",
        }
    }
}

pub struct Renderer {
    settings: RendererSettings,
    limits: DeviceLimits,
    uniforms: Buffer,
    targets: RenderTargets,
    programs: ProgramLibrary,
    builtins: BuiltinResources,
    frame: FrameParams,

    textured_quad: RenderGraph,
    forward: RenderGraph,
    deferred: RenderGraph,
}

impl Renderer {
    /// Creates every GPU resource the pipelines use.
    ///
    /// Missing shader sources and images are logged and replaced by invalid
    /// programs and default textures; only mesh uploads can fail here.
    pub fn new(
        device: &mut dyn GpuDevice,
        registry: &mut ResourceRegistry,
        shaders: &mut dyn ShaderLoader,
        images: &mut dyn ImageLoader,
        settings: RendererSettings,
    ) -> Result<Self> {
        log_device_info(device);

        let limits = device.limits();
        let uniforms = Buffer::create(device, "Uniforms", limits.max_uniform_block_size, BufferKind::Uniform);
        let targets = RenderTargets::new(device, settings.width(), settings.height());
        let programs = ProgramLibrary::load(device, registry, shaders);
        let builtins = BuiltinResources::new(device, registry, images, &settings.assets)?;

        Ok(Self {
            settings,
            limits,
            uniforms,
            targets,
            programs,
            builtins,
            frame: FrameParams::default(),
            textured_quad: RenderGraph::new().with_node(TexturedQuadNode),
            forward: RenderGraph::new().with_node(ForwardNode),
            deferred: RenderGraph::new()
                .with_node(ReflectionNode)
                .with_node(RefractionNode)
                .with_node(GeometryNode)
                .with_node(WaterSurfaceNode)
                .with_node(LightingNode)
                .with_node(SkyboxNode)
                .with_node(BloomNode)
                .with_node(DebugLightsNode),
        })
    }

    #[must_use]
    pub fn settings(&self) -> &RendererSettings {
        &self.settings
    }

    /// Settings are read every frame; display size changes take effect
    /// only for a new renderer.
    pub fn settings_mut(&mut self) -> &mut RendererSettings {
        &mut self.settings
    }

    #[must_use]
    pub fn limits(&self) -> DeviceLimits {
        self.limits
    }

    #[must_use]
    pub fn targets(&self) -> &RenderTargets {
        &self.targets
    }

    #[must_use]
    pub fn programs(&self) -> &ProgramLibrary {
        &self.programs
    }

    #[must_use]
    pub fn builtins(&self) -> &BuiltinResources {
        &self.builtins
    }

    #[must_use]
    pub fn uniforms(&self) -> &Buffer {
        &self.uniforms
    }

    /// Ranges written by the most recent pack.
    #[must_use]
    pub fn frame_params(&self) -> FrameParams {
        self.frame
    }

    #[must_use]
    pub fn primitive_model(&self, kind: PrimitiveKind) -> Handle<Model> {
        self.builtins.primitive(kind)
    }

    #[must_use]
    pub fn graph(&self, mode: RenderMode) -> &RenderGraph {
        match mode {
            RenderMode::TexturedQuad => &self.textured_quad,
            RenderMode::Forward => &self.forward,
            RenderMode::Deferred => &self.deferred,
        }
    }

    /// Texture the UI shows for a preview selection.
    #[must_use]
    pub fn preview_texture(&self, target: PreviewTarget) -> TextureId {
        self.targets.preview(target)
    }

    /// The offscreen texture holding the frame for `mode`, or `None` when
    /// the mode draws straight to the screen.
    #[must_use]
    pub fn output_texture(&self, mode: RenderMode) -> Option<TextureId> {
        match mode {
            RenderMode::Deferred => Some(self.preview_texture(self.settings.preview)),
            RenderMode::Forward => Some(self.targets.main),
            RenderMode::TexturedQuad => None,
        }
    }

    /// Packs the main camera's parameters, without a clip plane.
    ///
    /// Runs after the Gui phase, before [`Self::render`]; the deferred
    /// pipeline repacks on its own.
    pub fn prepare_frame(&mut self, device: &mut dyn GpuDevice, scene: &mut Scene) -> Result<()> {
        self.frame = pack_frame(
            &mut self.uniforms,
            device,
            &scene.camera,
            &mut scene.entities,
            &scene.lights,
            None,
            self.limits.uniform_offset_alignment,
        )?;
        Ok(())
    }

    /// Renders one frame with the scene's current mode.
    pub fn render(
        &mut self,
        device: &mut dyn GpuDevice,
        registry: &mut ResourceRegistry,
        scene: &mut Scene,
        delta_time: f32,
    ) -> Result<()> {
        let graph = match scene.mode {
            RenderMode::TexturedQuad => &self.textured_quad,
            RenderMode::Forward => &self.forward,
            RenderMode::Deferred => &self.deferred,
        };

        let mut ctx = FrameContext {
            device,
            registry,
            scene,
            uniforms: &mut self.uniforms,
            targets: &self.targets,
            programs: &self.programs,
            builtins: &self.builtins,
            settings: &self.settings,
            limits: self.limits,
            frame: self.frame,
            delta_time,
        };
        let result = graph.execute(&mut ctx);
        self.frame = ctx.frame;
        result
    }
}

fn log_device_info(device: &dyn GpuDevice) {
    let info = device.info();
    log::info!("GPU: {} ({})", info.name, info.vendor);
    log::info!("API: {} on {}", info.api_version, info.backend);
    if !info.extensions.is_empty() {
        log::debug!("Extensions: {}", info.extensions.join(", "));
    }
    let limits = device.limits();
    log::debug!(
        "Uniform blocks: {} bytes max, offsets aligned to {}",
        limits.max_uniform_block_size,
        limits.uniform_offset_alignment
    );
}
