use glam::{Mat4, Vec3};

use crate::renderer::core::BufferRange;
use crate::resources::{Handle, Model};

/// `T * Rx * Ry * Rz * S` with rotation in degrees.
#[must_use]
pub fn transform_matrix(position: Vec3, rotation_degrees: Vec3, scale: Vec3) -> Mat4 {
    Mat4::from_translation(position)
        * Mat4::from_rotation_x(rotation_degrees.x.to_radians())
        * Mat4::from_rotation_y(rotation_degrees.y.to_radians())
        * Mat4::from_rotation_z(rotation_degrees.z.to_radians())
        * Mat4::from_scale(scale)
}

/// A placed model.
///
/// The transform fields are public for editors; whoever changes them calls
/// [`update_world_matrix`](Self::update_world_matrix) (the setters do).
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub name: String,
    pub position: Vec3,
    /// Euler angles in degrees.
    pub rotation: Vec3,
    pub scale: Vec3,
    pub model: Handle<Model>,
    world_matrix: Mat4,
    /// Written by the frame packer; stale outside the frame that packed it.
    pub(crate) local_params: BufferRange,
}

impl Entity {
    #[must_use]
    pub fn new(name: impl Into<String>, model: Handle<Model>) -> Self {
        Self {
            name: name.into(),
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
            model,
            world_matrix: Mat4::IDENTITY,
            local_params: BufferRange::default(),
        }
    }

    #[must_use]
    pub fn with_transform(mut self, position: Vec3, rotation: Vec3, scale: Vec3) -> Self {
        self.position = position;
        self.rotation = rotation;
        self.scale = scale;
        self.update_world_matrix();
        self
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
        self.update_world_matrix();
    }

    pub fn set_rotation(&mut self, rotation: Vec3) {
        self.rotation = rotation;
        self.update_world_matrix();
    }

    pub fn set_scale(&mut self, scale: Vec3) {
        self.scale = scale;
        self.update_world_matrix();
    }

    pub fn update_world_matrix(&mut self) {
        self.world_matrix = transform_matrix(self.position, self.rotation, self.scale);
    }

    #[must_use]
    pub fn world_matrix(&self) -> Mat4 {
        self.world_matrix
    }

    /// Uniform range of this entity in the current frame's arena.
    #[must_use]
    pub fn local_params(&self) -> BufferRange {
        self.local_params
    }
}
