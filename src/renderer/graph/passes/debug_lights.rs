use glam::{Mat4, Quat, Vec3};

use crate::errors::Result;
use crate::renderer::core::{ParamValue, PipelineState, RenderPass, RenderTarget};
use crate::renderer::graph::{FrameContext, RenderNode};
use crate::renderer::programs::param;
use crate::renderer::settings::PreviewTarget;
use crate::resources::PrimitiveKind;
use crate::scene::{Light, LightType};

const GIZMO_SCALE: f32 = 0.5;

/// Model matrix of a light's gizmo: a cone whose +Y axis points along a
/// directional light, or a sphere at a point light.
#[must_use]
pub fn light_gizmo_matrix(light: &Light) -> Mat4 {
    let scale = Vec3::splat(GIZMO_SCALE);
    match light.kind {
        LightType::Directional => {
            let direction = light.direction.normalize_or(Vec3::NEG_Y);
            let rotation = Quat::from_rotation_arc(Vec3::Y, direction);
            Mat4::from_scale_rotation_translation(scale, rotation, light.position)
        }
        LightType::Point => Mat4::from_scale_rotation_translation(scale, Quat::IDENTITY, light.position),
    }
}

/// Flat-colored light gizmos over the final image.
///
/// Draws into the bloom output when the preview shows it, otherwise into
/// the light target.
pub struct DebugLightsNode;

impl RenderNode for DebugLightsNode {
    fn name(&self) -> &'static str {
        "Debug Lights"
    }

    fn run(&self, ctx: &mut FrameContext<'_>) -> Result<()> {
        if !ctx.settings.show_debug_lights {
            return Ok(());
        }

        let framebuffer = if ctx.settings.preview == PreviewTarget::Main {
            ctx.targets.bloom
        } else {
            ctx.targets.light
        };

        let cone = ctx.primitive_mesh(PrimitiveKind::Cone)?;
        let sphere = ctx.primitive_mesh(PrimitiveKind::Sphere)?;

        let view_projection = ctx.scene.camera.view_projection();
        let gizmos: Vec<(LightType, Mat4, Vec3)> = ctx
            .scene
            .lights
            .iter()
            .map(|light| (light.kind, view_projection * light_gizmo_matrix(light), light.color))
            .collect();

        let mut pass = RenderPass::new(
            self.name(),
            RenderTarget::framebuffer(framebuffer, &[0]),
            ctx.display_viewport(),
        )
        .with_state(PipelineState::OPAQUE);

        let program = ctx.programs.debug_lights;
        for (kind, mvp, color) in gizmos {
            let mesh = match kind {
                LightType::Directional => cone,
                LightType::Point => sphere,
            };
            let draw = ctx
                .mesh_draw(mesh, program)?
                .param(param::LIGHT_MVP, ParamValue::Mat4(mvp))
                .param(param::LIGHT_COLOR, ParamValue::Vec3(color));
            pass.draw(draw);
        }

        ctx.submit(&pass);
        Ok(())
    }
}
