//! Frame loop
//!
//! [`App`] owns the device, the resource registry, the scene and the
//! renderer, and drives one frame as three sequential phases:
//!
//! 1. **Update**: camera controls.
//! 2. **Gui**: an external mutator edits the scene and renderer settings.
//! 3. **Render**: entity world matrices and the main-camera pack are
//!    refreshed, then the scene's render mode picks the graph to execute.
//!
//! Window and event handling live outside the crate; the platform layer
//! fills an [`InputState`] per frame.

pub mod camera_controller;
pub mod input;

pub use camera_controller::CameraController;
pub use input::{InputState, Key, MouseButton};

use glam::Vec3;

use crate::assets::{ImageLoader, ShaderLoader};
use crate::errors::Result;
use crate::renderer::Renderer;
use crate::renderer::core::GpuDevice;
use crate::renderer::settings::RendererSettings;
use crate::resources::{PrimitiveKind, ResourceRegistry};
use crate::scene::{Camera, Entity, Light, Scene, WaterPlane};

pub struct App<D: GpuDevice> {
    pub device: D,
    pub registry: ResourceRegistry,
    pub scene: Scene,
    pub renderer: Renderer,
    pub controller: CameraController,
    frame_index: u64,
    /// Entities spawned so far per primitive kind; never decremented.
    spawned: [usize; PrimitiveKind::ALL.len()],
}

impl<D: GpuDevice> App<D> {
    pub fn new(
        mut device: D,
        shaders: &mut dyn ShaderLoader,
        images: &mut dyn ImageLoader,
        settings: RendererSettings,
    ) -> Result<Self> {
        let mut registry = ResourceRegistry::new(&mut device);
        let mut camera = Camera::default();
        camera.aspect = settings.aspect_ratio();
        camera.update_projection();
        let scene = Scene::new(camera, WaterPlane::from_settings(&settings.water));
        let renderer = Renderer::new(&mut device, &mut registry, shaders, images, settings)?;

        Ok(Self {
            device,
            registry,
            scene,
            renderer,
            controller: CameraController::new(),
            frame_index: 0,
            spawned: [0; PrimitiveKind::ALL.len()],
        })
    }

    /// Frames rendered so far.
    #[must_use]
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    /// Runs Update, then `gui`, then Render for one frame.
    pub fn frame<F>(&mut self, input: &InputState, gui: F) -> Result<()>
    where
        F: FnOnce(&mut Scene, &mut RendererSettings),
    {
        self.controller.update(&mut self.scene.camera, input);
        gui(&mut self.scene, self.renderer.settings_mut());

        // Packed after the Gui so its edits are visible to every pass.
        self.scene.update_world_matrices();
        self.renderer.prepare_frame(&mut self.device, &mut self.scene)?;
        self.renderer
            .render(&mut self.device, &mut self.registry, &mut self.scene, input.delta_time)?;
        self.frame_index += 1;
        Ok(())
    }

    /// Renders one frame per input, stopping at the first error.
    ///
    /// Returns the number of frames completed.
    pub fn run<I>(&mut self, inputs: I) -> Result<usize>
    where
        I: IntoIterator<Item = InputState>,
    {
        let mut completed = 0;
        for input in inputs {
            if let Err(err) = self.frame(&input, |_, _| {}) {
                log::error!("Frame {} failed: {err}", self.frame_index);
                return Err(err);
            }
            completed += 1;
        }
        Ok(completed)
    }

    /// Spawns an entity showing a built-in primitive; returns its index.
    pub fn add_primitive(&mut self, kind: PrimitiveKind) -> Result<usize> {
        let model = self.renderer.primitive_model(kind);
        self.registry.resolve_default_materials(model)?;

        let count = self.spawned[kind.index()];
        self.spawned[kind.index()] += 1;
        let name = if count == 0 {
            kind.name().to_owned()
        } else {
            format!("{} {count}", kind.name())
        };
        log::debug!("Adding primitive entity '{name}'");
        Ok(self.scene.add_entity(Entity::new(name, model)))
    }

    /// One directional light, five point lights and a few primitives.
    pub fn populate_default_scene(&mut self) -> Result<()> {
        self.scene.add_light(Light::directional(
            "Directional Light",
            Vec3::ONE,
            1.0,
            Vec3::new(-1.0, -0.3, -1.0),
            Vec3::new(0.0, -10.0, 0.0),
        ));
        let points = [
            Vec3::new(14.0, 2.0, 13.0),
            Vec3::new(-7.0, 2.0, -12.0),
            Vec3::new(-2.0, 5.0, 10.0),
            Vec3::new(9.0, 2.0, -13.0),
            Vec3::new(-13.0, 2.0, 15.0),
        ];
        for (i, position) in points.into_iter().enumerate() {
            self.scene
                .add_light(Light::point(format!("Point Light {}", i + 1), Vec3::ONE, 1.0, position));
        }

        let placements = [
            (PrimitiveKind::Sphere, Vec3::new(5.0, 2.0, -5.0), Vec3::splat(3.0)),
            (PrimitiveKind::Cube, Vec3::new(-5.0, 1.0, 5.0), Vec3::splat(2.0)),
            (PrimitiveKind::Cone, Vec3::new(7.0, 1.0, 5.0), Vec3::splat(3.0)),
            (PrimitiveKind::Torus, Vec3::new(-7.0, 1.0, -8.0), Vec3::splat(3.0)),
        ];
        for (kind, position, scale) in placements {
            let index = self.add_primitive(kind)?;
            let entity = &mut self.scene.entities[index];
            entity.set_position(position);
            entity.set_scale(scale);
        }

        log::info!(
            "Default scene: {} entities, {} lights",
            self.scene.entities.len(),
            self.scene.lights.len()
        );
        Ok(())
    }
}
