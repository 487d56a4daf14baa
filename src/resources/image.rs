//! Decoded pixel data handed over by an [`ImageLoader`](crate::assets::ImageLoader).

use crate::errors::{Result, TidalError};

/// 8-bit pixels, rows stored bottom-up (first row is the bottom of the image).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    pub width: u32,
    pub height: u32,
    /// Components per pixel.
    pub channels: u32,
    pub pixels: Vec<u8>,
}

impl Image {
    #[must_use]
    pub fn new(width: u32, height: u32, channels: u32, pixels: Vec<u8>) -> Self {
        Self {
            width,
            height,
            channels,
            pixels,
        }
    }

    /// A single-pixel RGBA image.
    #[must_use]
    pub fn solid(rgba: [u8; 4]) -> Self {
        Self::new(1, 1, 4, rgba.to_vec())
    }

    /// Reverses row order in place.
    pub fn flip_vertically(&mut self) {
        let row = (self.width * self.channels) as usize;
        if row == 0 {
            return;
        }
        let rows = self.pixels.len() / row;
        for y in 0..rows / 2 {
            let (top, bottom) = self.pixels.split_at_mut((rows - 1 - y) * row);
            top[y * row..(y + 1) * row].swap_with_slice(&mut bottom[..row]);
        }
    }

    /// Expands to tightly packed RGBA8. Only 3- and 4-channel images are
    /// accepted.
    pub fn to_rgba8(&self) -> Result<Vec<u8>> {
        match self.channels {
            4 => Ok(self.pixels.clone()),
            3 => Ok(self
                .pixels
                .chunks_exact(3)
                .flat_map(|px| [px[0], px[1], px[2], 255])
                .collect()),
            n => Err(TidalError::UnsupportedChannels(n)),
        }
    }
}
