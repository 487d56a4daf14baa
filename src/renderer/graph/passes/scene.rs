//! Scene geometry passes.
//!
//! Every entity is drawn submesh by submesh with its packed local block,
//! its material's albedo at unit 0 and a vertex array fetched from the
//! binding cache. The same recording serves the forward pass, the deferred
//! geometry pass and the two water scene passes.

use crate::errors::Result;
use crate::renderer::core::{BlendMode, BufferRange, ClearOp, DrawCall, ParamValue, PipelineState, RenderPass, RenderTarget};
use crate::renderer::graph::{FrameContext, RenderNode};
use crate::renderer::programs::{block, param, unit};
use crate::renderer::targets::gbuffer;
use crate::resources::{Handle, Model, Program};

/// What a scene recording binds besides the global and local blocks.
#[derive(Debug, Clone, Copy)]
pub struct SceneDrawOptions {
    pub program: Handle<Program>,
    /// Set `uNear` / `uFar` from the main camera.
    pub depth_range: bool,
    /// Bind the packed clip plane at block 2 when one was packed.
    pub clip_plane: bool,
}

/// Appends one draw per entity submesh to `pass`.
pub fn record_scene_draws(ctx: &mut FrameContext<'_>, pass: &mut RenderPass, options: SceneDrawOptions) -> Result<()> {
    let program = ctx.program_id(options.program)?;
    let buffer = ctx.uniform_buffer();
    let (near, far) = (ctx.scene.camera.near, ctx.scene.camera.far);

    let entities: Vec<(Handle<Model>, BufferRange)> = ctx
        .scene
        .entities
        .iter()
        .map(|entity| (entity.model, entity.local_params()))
        .collect();

    for (model_handle, local) in entities {
        let Some(model) = ctx.registry.model(model_handle) else {
            log::debug!("Skipping entity without a model ({model_handle:?})");
            continue;
        };
        let mesh = model.mesh;
        let submesh_count = ctx.registry.mesh(mesh).map_or(0, |m| m.submeshes.len());

        for submesh in 0..submesh_count {
            let vertex_array = ctx.bind(mesh, submesh, options.program)?;

            let registry = &*ctx.registry;
            let Some(model) = registry.model(model_handle) else { continue };
            let albedo = registry.albedo_texture(registry.material_for(model, submesh));
            let Some(sub) = registry.mesh(mesh).and_then(|m| m.submeshes.get(submesh)) else {
                continue;
            };

            let mut draw = DrawCall::indexed(program, vertex_array, sub.index_count, sub.index_offset)
                .uniform_block(block::GLOBAL, buffer, ctx.frame.global)
                .uniform_block(block::LOCAL, buffer, local)
                .texture(unit::ALBEDO, albedo);
            if let Some(clip) = ctx.frame.clip_plane.filter(|_| options.clip_plane) {
                draw = draw.uniform_block(block::CLIP_PLANE, buffer, clip);
            }
            if options.depth_range {
                draw = draw
                    .param(param::NEAR, ParamValue::Float(near))
                    .param(param::FAR, ParamValue::Float(far));
            }
            pass.draw(draw);
        }
    }
    Ok(())
}

/// Deferred geometry pass: the scene into the G-buffer with the main
/// camera's packed parameters.
pub struct GeometryNode;

impl RenderNode for GeometryNode {
    fn name(&self) -> &'static str {
        "Geometry"
    }

    fn run(&self, ctx: &mut FrameContext<'_>) -> Result<()> {
        let target = RenderTarget::framebuffer(
            ctx.targets.gbuffer,
            &[gbuffer::ALBEDO, gbuffer::POSITION, gbuffer::NORMAL, gbuffer::DEPTH],
        );
        let mut pass = RenderPass::new(self.name(), target, ctx.display_viewport())
            .with_clear(ClearOp::all([0.0, 0.0, 0.0, 1.0]))
            .with_state(PipelineState::OPAQUE.with_blend(BlendMode::Alpha));
        // the refraction pack's clip plane is still in the arena but unused
        let options = SceneDrawOptions {
            program: ctx.programs.geometry,
            depth_range: true,
            clip_plane: false,
        };
        record_scene_draws(ctx, &mut pass, options)?;
        ctx.submit(&pass);
        Ok(())
    }
}
