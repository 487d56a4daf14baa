//! Resource types and the registry that owns them.

pub mod handle;
pub mod image;
pub mod material;
pub mod mesh;
pub mod primitives;
pub mod program;
pub mod registry;
pub mod texture;

pub use handle::Handle;
pub use image::Image;
pub use material::Material;
pub use mesh::{
    Mesh, MeshData, Model, Submesh, SubmeshData, VertexBinding, VertexBufferAttribute,
    VertexBufferLayout,
};
pub use primitives::PrimitiveKind;
pub use program::Program;
pub use registry::{DefaultResources, ResourceRegistry};
pub use texture::Texture;
