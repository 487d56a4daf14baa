//! Texture loading on top of an [`ImageLoader`].
//!
//! Failures are logged and turned into absent handles; callers substitute a
//! default texture.

use std::borrow::Cow;

use super::ImageLoader;
use crate::renderer::core::{
    FilterMode, GpuDevice, SamplerDesc, TextureDesc, TextureDimension, TextureFormat, TextureId, WrapMode,
};
use crate::resources::{Handle, Image, ResourceRegistry, Texture};

/// Cube faces in +X, -X, +Y, -Y, +Z, -Z order.
pub type CubemapFaces<'a> = [&'a str; 6];

const CUBEMAP_SAMPLER: SamplerDesc = SamplerDesc {
    filter: FilterMode::Linear,
    mipmaps: false,
    wrap: WrapMode::ClampToEdge,
};

/// Loads a material texture, reusing an earlier load of the same path.
///
/// Returns [`Handle::NONE`] when the image cannot be decoded or uploaded.
pub fn load_texture_2d(
    device: &mut dyn GpuDevice,
    registry: &mut ResourceRegistry,
    loader: &mut dyn ImageLoader,
    path: &str,
) -> Handle<Texture> {
    if let Some(handle) = registry.find_texture_by_path(path) {
        return handle;
    }

    let image = match loader.load_image(path) {
        Ok(image) => image,
        Err(err) => {
            log::error!("Could not open texture {path}: {err}");
            return Handle::NONE;
        }
    };

    match registry.add_texture_from_image(device, path, &image) {
        Ok(handle) => {
            log::debug!("Loaded texture {path} ({}x{})", image.width, image.height);
            handle
        }
        Err(err) => {
            log::error!("Could not upload texture {path}: {err}");
            Handle::NONE
        }
    }
}

/// Loads six faces into a cube map.
///
/// The face size comes from the first face that decodes. Faces that fail
/// to load, or do not match that size, are logged and left empty.
pub fn load_cubemap(device: &mut dyn GpuDevice, loader: &mut dyn ImageLoader, faces: &CubemapFaces<'_>) -> TextureId {
    let images: Vec<Option<Image>> = faces
        .iter()
        .map(|path| match loader.load_image(path) {
            Ok(image) => Some(image),
            Err(err) => {
                log::error!("Cubemap texture failed to load at path: {path}: {err}");
                None
            }
        })
        .collect();

    let (width, height) = images
        .iter()
        .flatten()
        .next()
        .map_or((1, 1), |image| (image.width, image.height));

    let label = faces
        .first()
        .and_then(|path| path.rsplit_once('/'))
        .map_or(Cow::Borrowed("Cubemap"), |(dir, _)| Cow::Owned(dir.to_string()));

    let texture = device.create_texture(&TextureDesc {
        label,
        dimension: TextureDimension::Cube,
        format: TextureFormat::Rgba8Unorm,
        width,
        height,
        mip_levels: 1,
        sampler: CUBEMAP_SAMPLER,
    });

    for (layer, (image, path)) in images.iter().zip(faces.iter()).enumerate() {
        let Some(image) = image else { continue };
        if (image.width, image.height) != (width, height) {
            log::error!(
                "Cubemap face {path} is {}x{}, expected {width}x{height}",
                image.width,
                image.height
            );
            continue;
        }
        match image.to_rgba8() {
            Ok(pixels) => device.write_texture(texture, layer as u32, 0, &pixels),
            Err(err) => log::error!("Cubemap face {path}: {err}"),
        }
    }

    texture
}
