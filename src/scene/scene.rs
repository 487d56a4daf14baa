use super::{Camera, Entity, Light, WaterPlane};
use crate::renderer::RenderMode;

/// Everything a frame renders, passed explicitly through Update, Gui and
/// Render. The interactive layer mutates it between frames.
#[derive(Debug, Clone)]
pub struct Scene {
    pub camera: Camera,
    pub entities: Vec<Entity>,
    pub lights: Vec<Light>,
    pub water: WaterPlane,
    /// Pipeline used by the next frame.
    pub mode: RenderMode,
}

impl Scene {
    #[must_use]
    pub fn new(camera: Camera, water: WaterPlane) -> Self {
        Self {
            camera,
            entities: Vec::new(),
            lights: Vec::new(),
            water,
            mode: RenderMode::Deferred,
        }
    }

    /// Adds an entity and returns its index.
    pub fn add_entity(&mut self, mut entity: Entity) -> usize {
        entity.update_world_matrix();
        self.entities.push(entity);
        self.entities.len() - 1
    }

    pub fn add_light(&mut self, light: Light) -> usize {
        self.lights.push(light);
        self.lights.len() - 1
    }

    /// Recomputes every entity's world matrix from its transform fields.
    pub fn update_world_matrices(&mut self) {
        for entity in &mut self.entities {
            entity.update_world_matrix();
        }
    }

    #[must_use]
    pub fn entity(&self, name: &str) -> Option<&Entity> {
        self.entities.iter().find(|e| e.name == name)
    }

    #[must_use]
    pub fn light(&self, name: &str) -> Option<&Light> {
        self.lights.iter().find(|l| l.name == name)
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new(Camera::default(), WaterPlane::default())
    }
}
