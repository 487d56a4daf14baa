//! Image decoding.

use std::path::{Path, PathBuf};

use image::GenericImageView;

use crate::errors::{Result, TidalError};
use crate::resources::Image;

/// Decodes an image file into 8-bit pixels with the bottom row first.
pub trait ImageLoader {
    fn load_image(&mut self, path: &str) -> Result<Image>;
}

/// Decodes files under a root directory with the `image` crate.
///
/// RGB sources keep three channels, everything else is expanded to RGBA.
#[derive(Debug, Clone)]
pub struct FileImageLoader {
    root: PathBuf,
}

impl FileImageLoader {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }
}

impl ImageLoader for FileImageLoader {
    fn load_image(&mut self, path: &str) -> Result<Image> {
        let full = self.root.join(path);
        if !full.exists() {
            return Err(TidalError::AssetNotFound(full.display().to_string()));
        }
        let img = image::open(&full)
            .map_err(|e| TidalError::ImageDecodeError(format!("Failed to decode image {path}: {e}")))?
            .flipv();

        let (width, height) = img.dimensions();
        let (channels, pixels) = match img.color().channel_count() {
            3 => (3, img.into_rgb8().into_raw()),
            _ => (4, img.into_rgba8().into_raw()),
        };
        Ok(Image::new(width, height, channels, pixels))
    }
}

/// Serves in-memory images keyed by path. Unknown paths fail to load.
#[derive(Debug, Clone, Default)]
pub struct MemoryImageLoader {
    images: rustc_hash::FxHashMap<String, Image>,
}

impl MemoryImageLoader {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_image(mut self, path: impl Into<String>, image: Image) -> Self {
        self.images.insert(path.into(), image);
        self
    }
}

impl ImageLoader for MemoryImageLoader {
    fn load_image(&mut self, path: &str) -> Result<Image> {
        self.images
            .get(path)
            .cloned()
            .ok_or_else(|| TidalError::AssetNotFound(path.to_string()))
    }
}
