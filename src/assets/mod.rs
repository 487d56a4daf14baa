//! Asset collaborators.
//!
//! Shader text, image decoding and model import are provided by small
//! traits so the renderer can run against the file system, in-memory data
//! or an external importer.

pub mod image_loader;
pub mod shader;
pub mod textures;

pub use image_loader::{FileImageLoader, ImageLoader, MemoryImageLoader};
pub use shader::{FsShaderLoader, ShaderLoader, StaticShaderLoader};
pub use textures::{CubemapFaces, load_cubemap, load_texture_2d};

use crate::errors::Result;
use crate::renderer::core::GpuDevice;
use crate::resources::{Handle, Model, ResourceRegistry};

/// Imports a model file, registering its meshes, materials and textures.
///
/// Implementations leave material slots they cannot resolve as
/// [`Handle::NONE`]; the registry fills them with the default material.
pub trait AssetLoader {
    fn load_model(
        &mut self,
        path: &str,
        registry: &mut ResourceRegistry,
        device: &mut dyn GpuDevice,
    ) -> Result<Handle<Model>>;
}
