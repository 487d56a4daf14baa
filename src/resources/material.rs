use glam::Vec3;

use super::{Handle, Texture};

/// Surface description consumed by the geometry shaders.
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub name: String,
    pub albedo: Vec3,
    pub emissive: Vec3,
    pub smoothness: f32,
    /// Absent handles sample the registry's white texture.
    pub albedo_texture: Handle<Texture>,
}

impl Material {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            albedo: Vec3::ONE,
            emissive: Vec3::ZERO,
            smoothness: 0.0,
            albedo_texture: Handle::NONE,
        }
    }

    #[must_use]
    pub fn with_albedo_texture(mut self, texture: Handle<Texture>) -> Self {
        self.albedo_texture = texture;
        self
    }
}
