//! Resource Registry
//!
//! Owns every texture, material, mesh, model and program in insertion
//! order. A handle is the index into the matching array and stays valid for
//! the registry's lifetime: nothing is ever removed or compacted.
//!
//! The registry also creates the fallback resources rendering relies on:
//! 1x1 white, black and flat-normal textures, and a default material used
//! for unassigned material slots.

use rustc_hash::FxHashMap;

use super::{Handle, Image, Material, Mesh, Model, Program, Texture};
use crate::errors::{Result, TidalError};
use crate::renderer::core::{GpuDevice, SamplerDesc, TextureDesc, TextureFormat, TextureId};

/// Fallbacks created with the registry.
#[derive(Debug, Clone, Copy)]
pub struct DefaultResources {
    pub white: Handle<Texture>,
    pub black: Handle<Texture>,
    pub normal: Handle<Texture>,
    pub material: Handle<Material>,
}

pub struct ResourceRegistry {
    textures: Vec<Texture>,
    materials: Vec<Material>,
    meshes: Vec<Mesh>,
    models: Vec<Model>,
    programs: Vec<Program>,
    texture_paths: FxHashMap<String, Handle<Texture>>,
    defaults: DefaultResources,
}

impl ResourceRegistry {
    pub fn new(device: &mut dyn GpuDevice) -> Self {
        let mut registry = Self {
            textures: Vec::new(),
            materials: Vec::new(),
            meshes: Vec::new(),
            models: Vec::new(),
            programs: Vec::new(),
            texture_paths: FxHashMap::default(),
            defaults: DefaultResources {
                white: Handle::NONE,
                black: Handle::NONE,
                normal: Handle::NONE,
                material: Handle::NONE,
            },
        };

        let white = registry.add_solid_texture(device, "builtin:white", [255, 255, 255, 255]);
        let black = registry.add_solid_texture(device, "builtin:black", [0, 0, 0, 255]);
        let normal = registry.add_solid_texture(device, "builtin:normal", [128, 128, 255, 255]);
        let material =
            registry.add_material(Material::new("Default Material").with_albedo_texture(normal));

        registry.defaults = DefaultResources {
            white,
            black,
            normal,
            material,
        };
        registry
    }

    #[must_use]
    pub fn defaults(&self) -> DefaultResources {
        self.defaults
    }

    // ========================================================================
    // Textures
    // ========================================================================

    /// Uploads an RGBA8 image as a material texture and registers it under
    /// `path`.
    pub fn add_texture_from_image(
        &mut self,
        device: &mut dyn GpuDevice,
        path: &str,
        image: &Image,
    ) -> Result<Handle<Texture>> {
        let pixels = image.to_rgba8()?;
        let mip_levels = TextureDesc::full_mip_chain(image.width, image.height);
        let desc = TextureDesc::new_2d(
            path.to_string(),
            TextureFormat::Rgba8Unorm,
            image.width,
            image.height,
            SamplerDesc::MATERIAL,
        )
        .with_mip_levels(mip_levels);

        let gpu = device.create_texture(&desc);
        device.write_texture(gpu, 0, 0, &pixels);
        if mip_levels > 1 {
            device.generate_mipmaps(gpu);
        }

        Ok(self.add_texture(Texture {
            gpu,
            path: path.to_string(),
            width: image.width,
            height: image.height,
        }))
    }

    fn add_solid_texture(
        &mut self,
        device: &mut dyn GpuDevice,
        path: &str,
        rgba: [u8; 4],
    ) -> Handle<Texture> {
        let desc = TextureDesc::new_2d(path.to_string(), TextureFormat::Rgba8Unorm, 1, 1, SamplerDesc::MATERIAL);
        let gpu = device.create_texture(&desc);
        device.write_texture(gpu, 0, 0, &rgba);
        self.add_texture(Texture {
            gpu,
            path: path.to_string(),
            width: 1,
            height: 1,
        })
    }

    pub fn add_texture(&mut self, texture: Texture) -> Handle<Texture> {
        let handle = Handle::from_raw(self.textures.len() as u32);
        self.texture_paths.insert(texture.path.clone(), handle);
        self.textures.push(texture);
        handle
    }

    #[must_use]
    pub fn texture(&self, handle: Handle<Texture>) -> Option<&Texture> {
        self.textures.get(handle.index())
    }

    #[must_use]
    pub fn find_texture_by_path(&self, path: &str) -> Option<Handle<Texture>> {
        self.texture_paths.get(path).copied()
    }

    /// GPU texture for `handle`, or `fallback` when it is absent.
    #[must_use]
    pub fn texture_or(&self, handle: Handle<Texture>, fallback: Handle<Texture>) -> TextureId {
        self.texture(handle)
            .or_else(|| self.texture(fallback))
            .map_or(TextureId(0), |tex| tex.gpu)
    }

    #[must_use]
    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    // ========================================================================
    // Materials
    // ========================================================================

    pub fn add_material(&mut self, material: Material) -> Handle<Material> {
        let handle = Handle::from_raw(self.materials.len() as u32);
        self.materials.push(material);
        handle
    }

    #[must_use]
    pub fn material(&self, handle: Handle<Material>) -> Option<&Material> {
        self.materials.get(handle.index())
    }

    pub fn material_mut(&mut self, handle: Handle<Material>) -> Option<&mut Material> {
        self.materials.get_mut(handle.index())
    }

    #[must_use]
    pub fn material_count(&self) -> usize {
        self.materials.len()
    }

    /// Material drawn for `model`'s submesh, falling back to the default.
    #[must_use]
    pub fn material_for(&self, model: &Model, submesh: usize) -> &Material {
        let handle = model.materials.get(submesh).copied().unwrap_or(Handle::NONE);
        self.material(handle)
            .or_else(|| self.material(self.defaults.material))
            .unwrap_or(&self.materials[0])
    }

    /// Albedo texture of `material`, or the white texture.
    #[must_use]
    pub fn albedo_texture(&self, material: &Material) -> TextureId {
        self.texture_or(material.albedo_texture, self.defaults.white)
    }

    // ========================================================================
    // Meshes & models
    // ========================================================================

    pub fn add_mesh(&mut self, mesh: Mesh) -> Handle<Mesh> {
        let handle = Handle::from_raw(self.meshes.len() as u32);
        self.meshes.push(mesh);
        handle
    }

    #[must_use]
    pub fn mesh(&self, handle: Handle<Mesh>) -> Option<&Mesh> {
        self.meshes.get(handle.index())
    }

    pub fn mesh_mut(&mut self, handle: Handle<Mesh>) -> Option<&mut Mesh> {
        self.meshes.get_mut(handle.index())
    }

    pub fn add_model(&mut self, model: Model) -> Handle<Model> {
        let handle = Handle::from_raw(self.models.len() as u32);
        self.models.push(model);
        handle
    }

    #[must_use]
    pub fn model(&self, handle: Handle<Model>) -> Option<&Model> {
        self.models.get(handle.index())
    }

    pub fn require_model(&self, handle: Handle<Model>) -> Result<&Model> {
        self.model(handle).ok_or(TidalError::InvalidHandle {
            kind: "model",
            index: handle.raw(),
        })
    }

    #[must_use]
    pub fn model_count(&self) -> usize {
        self.models.len()
    }

    /// Assigns the default material to every unassigned slot of `model`.
    ///
    /// Returns how many slots were filled.
    pub fn resolve_default_materials(&mut self, model: Handle<Model>) -> Result<usize> {
        let default = self.defaults.material;
        let model = self.models.get_mut(model.index()).ok_or(TidalError::InvalidHandle {
            kind: "model",
            index: model.raw(),
        })?;
        let mut resolved = 0;
        for slot in model.materials.iter_mut().filter(|slot| slot.is_none()) {
            *slot = default;
            resolved += 1;
        }
        if resolved > 0 {
            log::debug!("Model '{}': {resolved} material slots set to default", model.name);
        }
        Ok(resolved)
    }

    // ========================================================================
    // Programs
    // ========================================================================

    pub fn add_program(&mut self, program: Program) -> Handle<Program> {
        let handle = Handle::from_raw(self.programs.len() as u32);
        self.programs.push(program);
        handle
    }

    #[must_use]
    pub fn program(&self, handle: Handle<Program>) -> Option<&Program> {
        self.programs.get(handle.index())
    }

    #[must_use]
    pub fn find_program(&self, name: &str) -> Option<Handle<Program>> {
        self.programs
            .iter()
            .position(|program| program.name == name)
            .map(|index| Handle::from_raw(index as u32))
    }

    /// Borrows a mesh mutably together with a program, for binding-cache
    /// fills during rendering.
    pub fn mesh_and_program(
        &mut self,
        mesh: Handle<Mesh>,
        program: Handle<Program>,
    ) -> Result<(&mut Mesh, &Program)> {
        let program = self.programs.get(program.index()).ok_or(TidalError::InvalidHandle {
            kind: "program",
            index: program.raw(),
        })?;
        let mesh = self.meshes.get_mut(mesh.index()).ok_or(TidalError::InvalidHandle {
            kind: "mesh",
            index: mesh.raw(),
        })?;
        Ok((mesh, program))
    }
}
