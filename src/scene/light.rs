use glam::Vec3;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LightType {
    /// Parallel rays along `direction`; `position` only places the gizmo.
    Directional,
    /// Omnidirectional from `position`; `direction` is ignored.
    Point,
}

impl LightType {
    /// Tag written into the global uniform block.
    #[must_use]
    pub const fn gpu_tag(self) -> u32 {
        match self {
            Self::Directional => 0,
            Self::Point => 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Light {
    pub name: String,
    pub kind: LightType,
    pub color: Vec3,
    pub intensity: f32,
    pub direction: Vec3,
    pub position: Vec3,
}

impl Light {
    #[must_use]
    pub fn directional(name: impl Into<String>, color: Vec3, intensity: f32, direction: Vec3, position: Vec3) -> Self {
        Self {
            name: name.into(),
            kind: LightType::Directional,
            color,
            intensity,
            direction: direction.normalize_or(Vec3::NEG_Y),
            position,
        }
    }

    #[must_use]
    pub fn point(name: impl Into<String>, color: Vec3, intensity: f32, position: Vec3) -> Self {
        Self {
            name: name.into(),
            kind: LightType::Point,
            color,
            intensity,
            direction: Vec3::NEG_Y,
            position,
        }
    }

    /// Color scaled by intensity, as the shaders consume it.
    #[must_use]
    pub fn radiance(&self) -> Vec3 {
        self.color * self.intensity
    }
}
