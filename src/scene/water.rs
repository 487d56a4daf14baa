use glam::{Mat4, Vec3, Vec4};

use super::entity::transform_matrix;
use crate::renderer::settings::WaterSettings;

/// The animated water surface.
#[derive(Debug, Clone, PartialEq)]
pub struct WaterPlane {
    pub position: Vec3,
    pub scale: Vec3,
    pub move_speed: f32,
    /// Distortion phase, always in `[0, 1)`.
    move_factor: f32,
}

impl WaterPlane {
    #[must_use]
    pub fn from_settings(settings: &WaterSettings) -> Self {
        Self {
            position: settings.position,
            scale: settings.scale,
            move_speed: settings.move_speed,
            move_factor: 0.0,
        }
    }

    #[must_use]
    pub fn move_factor(&self) -> f32 {
        self.move_factor
    }

    /// Advances the phase by `move_speed * dt`, wrapping into `[0, 1)`.
    pub fn advance(&mut self, dt: f32) -> f32 {
        let phase = (self.move_factor + self.move_speed * dt).rem_euclid(1.0);
        // rem_euclid rounds tiny negative inputs up to exactly 1.0
        self.move_factor = if phase.is_finite() && phase < 1.0 { phase } else { 0.0 };
        self.move_factor
    }

    #[must_use]
    pub fn height(&self) -> f32 {
        self.position.y
    }

    #[must_use]
    pub fn model_matrix(&self) -> Mat4 {
        transform_matrix(self.position, Vec3::ZERO, self.scale)
    }

    /// Keeps geometry above the surface.
    #[must_use]
    pub fn reflection_clip_plane(&self) -> Vec4 {
        Vec4::new(0.0, 1.0, 0.0, -self.height())
    }

    /// Keeps geometry below the surface.
    #[must_use]
    pub fn refraction_clip_plane(&self) -> Vec4 {
        Vec4::new(0.0, -1.0, 0.0, self.height())
    }
}

impl Default for WaterPlane {
    fn default() -> Self {
        Self::from_settings(&WaterSettings::default())
    }
}
