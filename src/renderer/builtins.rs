//! Geometry and textures the renderer creates for itself.

use super::settings::AssetPaths;
use crate::assets::{ImageLoader, load_cubemap, load_texture_2d};
use crate::errors::Result;
use crate::renderer::core::{GpuDevice, TextureId};
use crate::resources::primitives::{PrimitiveKind, create_fullscreen_quad, create_skybox_cube};
use crate::resources::{Handle, Mesh, Model, ResourceRegistry, Texture};

/// Embedded meshes, one model per scene primitive, and the textures the
/// water, skybox and textured-quad passes sample.
#[derive(Debug, Clone)]
pub struct BuiltinResources {
    /// Full-screen quad shared by every post-process pass.
    pub quad: Handle<Mesh>,
    pub skybox_cube: Handle<Mesh>,
    /// Indexed like [`PrimitiveKind::ALL`].
    pub primitives: [Handle<Model>; PrimitiveKind::ALL.len()],
    pub quad_texture: Handle<Texture>,
    pub water_normal: Handle<Texture>,
    pub water_dudv: Handle<Texture>,
    pub skybox: TextureId,
}

impl BuiltinResources {
    pub fn new(
        device: &mut dyn GpuDevice,
        registry: &mut ResourceRegistry,
        images: &mut dyn ImageLoader,
        paths: &AssetPaths,
    ) -> Result<Self> {
        let quad = registry.add_mesh(Mesh::upload(device, "Fullscreen Quad", &create_fullscreen_quad())?);
        let skybox_cube = registry.add_mesh(Mesh::upload(device, "Skybox Cube", &create_skybox_cube())?);

        let mut primitives = [Handle::NONE; PrimitiveKind::ALL.len()];
        for (slot, kind) in primitives.iter_mut().zip(PrimitiveKind::ALL) {
            let data = kind.build();
            let mesh = registry.add_mesh(Mesh::upload(device, kind.name(), &data)?);
            let model = registry.add_model(Model::new(kind.name(), mesh, data.submeshes.len()));
            registry.resolve_default_materials(model)?;
            *slot = model;
        }

        let quad_texture = load_texture_2d(device, registry, images, &paths.quad_texture);
        let water_normal = load_texture_2d(device, registry, images, &paths.water_normal_map);
        let water_dudv = load_texture_2d(device, registry, images, &paths.water_dudv_map);

        let faces = [
            paths.skybox_faces[0].as_str(),
            paths.skybox_faces[1].as_str(),
            paths.skybox_faces[2].as_str(),
            paths.skybox_faces[3].as_str(),
            paths.skybox_faces[4].as_str(),
            paths.skybox_faces[5].as_str(),
        ];
        let skybox = load_cubemap(device, images, &faces);

        Ok(Self {
            quad,
            skybox_cube,
            primitives,
            quad_texture,
            water_normal,
            water_dudv,
            skybox,
        })
    }

    #[must_use]
    pub fn primitive(&self, kind: PrimitiveKind) -> Handle<Model> {
        self.primitives[kind.index()]
    }
}
