//! Frame Context
//!
//! [`FrameContext`] bundles everything a render node touches during one
//! frame. It stores individual references to the renderer's subsystems so
//! the borrow checker can split borrows across disjoint fields: a node can
//! hold the targets and programs immutably while filling the vertex-binding
//! cache through the registry.

use glam::Vec4;

use crate::renderer::builtins::BuiltinResources;
use crate::renderer::frame_params::{FrameParams, pack_frame};
use crate::renderer::programs::{ProgramLibrary, block};
use crate::renderer::settings::RendererSettings;
use crate::renderer::targets::RenderTargets;
use crate::renderer::vertex_binding::bind_submesh;
use crate::errors::{Result, TidalError};
use crate::renderer::core::{
    Buffer, DeviceLimits, DrawCall, GpuBufferId, GpuDevice, ProgramId, RenderPass, VertexArrayId, Viewport,
};
use crate::resources::{Handle, Mesh, PrimitiveKind, Program, ResourceRegistry};
use crate::scene::{Camera, Scene};

pub struct FrameContext<'a> {
    pub device: &'a mut dyn GpuDevice,
    pub registry: &'a mut ResourceRegistry,
    pub scene: &'a mut Scene,
    /// The shared uniform arena, repacked up to three times per frame.
    pub uniforms: &'a mut Buffer,
    pub targets: &'a RenderTargets,
    pub programs: &'a ProgramLibrary,
    pub builtins: &'a BuiltinResources,
    pub settings: &'a RendererSettings,
    pub limits: DeviceLimits,
    /// Ranges written by the most recent pack.
    pub frame: FrameParams,
    /// Seconds since the previous frame.
    pub delta_time: f32,
}

impl FrameContext<'_> {
    /// Repacks the uniform arena for `camera` and records the new ranges.
    pub fn pack(&mut self, camera: &Camera, clip_plane: Option<Vec4>) -> Result<()> {
        self.frame = pack_frame(
            self.uniforms,
            self.device,
            camera,
            &mut self.scene.entities,
            &self.scene.lights,
            clip_plane,
            self.limits.uniform_offset_alignment,
        )?;
        Ok(())
    }

    #[must_use]
    pub fn uniform_buffer(&self) -> GpuBufferId {
        self.uniforms.handle()
    }

    #[must_use]
    pub fn display_viewport(&self) -> Viewport {
        Viewport::sized(self.targets.width, self.targets.height)
    }

    pub fn program_id(&self, program: Handle<Program>) -> Result<ProgramId> {
        self.registry
            .program(program)
            .map(|p| p.gpu)
            .ok_or(TidalError::InvalidHandle {
                kind: "program",
                index: program.raw(),
            })
    }

    /// Mesh of the built-in model for a scene primitive.
    pub fn primitive_mesh(&self, kind: PrimitiveKind) -> Result<Handle<Mesh>> {
        let model = self.builtins.primitive(kind);
        self.registry
            .model(model)
            .map(|m| m.mesh)
            .ok_or(TidalError::InvalidHandle {
                kind: "model",
                index: model.raw(),
            })
    }

    /// Vertex array for one submesh under `program`, created on first use.
    pub fn bind(&mut self, mesh: Handle<Mesh>, submesh: usize, program: Handle<Program>) -> Result<VertexArrayId> {
        bind_submesh(self.device, self.registry, mesh, submesh, program)
    }

    /// A draw of `mesh`'s first submesh, bound for `program`.
    pub fn mesh_draw(&mut self, mesh: Handle<Mesh>, program: Handle<Program>) -> Result<DrawCall> {
        let vertex_array = self.bind(mesh, 0, program)?;
        let program_id = self.program_id(program)?;
        let sub = self
            .registry
            .mesh(mesh)
            .and_then(|m| m.submeshes.first())
            .ok_or(TidalError::SubmeshOutOfBounds { index: 0, count: 0 })?;
        Ok(DrawCall::indexed(program_id, vertex_array, sub.index_count, sub.index_offset))
    }

    /// A draw of the shared full-screen quad.
    pub fn quad_draw(&mut self, program: Handle<Program>) -> Result<DrawCall> {
        self.mesh_draw(self.builtins.quad, program)
    }

    /// Draw with the global block bound, as every lit program expects.
    #[must_use]
    pub fn with_global_block(&self, draw: DrawCall) -> DrawCall {
        draw.uniform_block(block::GLOBAL, self.uniform_buffer(), self.frame.global)
    }

    pub fn submit(&mut self, pass: &RenderPass) {
        log::trace!("Pass '{}': {} draws", pass.label, pass.draws.len());
        self.device.execute_pass(pass);
    }
}
