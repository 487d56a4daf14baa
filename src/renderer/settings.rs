//! Renderer Settings
//!
//! Tunables that the interactive layer edits between frames and that can be
//! loaded from a JSON file at startup. Every field has a default, so a
//! settings file only needs to name what it changes:
//!
//! ```json
//! { "display_size": [1280, 720], "bloom": { "threshold": 0.8 } }
//! ```

use std::path::Path;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::errors::Result;

/// Number of blur levels in the bloom chain.
pub const BLOOM_LEVELS: usize = 5;

/// Largest blur kernel radius the blur shader supports.
pub const MAX_KERNEL_RADIUS: u32 = 72;

// ---------------------------------------------------------------------------
// Preview target
// ---------------------------------------------------------------------------

/// Render target shown by the interactive preview.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PreviewTarget {
    /// Lit image with bloom.
    #[default]
    Main,
    /// Lit image before bloom.
    WithoutBloom,
    /// G-buffer albedo.
    Color,
    /// G-buffer view-space position.
    Position,
    /// G-buffer normal.
    Normal,
    /// G-buffer linear depth.
    Depth,
    Reflection,
    Refraction,
}

impl PreviewTarget {
    pub const ALL: [Self; 8] = [
        Self::Main,
        Self::WithoutBloom,
        Self::Color,
        Self::Position,
        Self::Normal,
        Self::Depth,
        Self::Reflection,
        Self::Refraction,
    ];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Main => "Main",
            Self::WithoutBloom => "Without Bloom",
            Self::Color => "Color",
            Self::Position => "Position",
            Self::Normal => "Normal",
            Self::Depth => "Depth",
            Self::Reflection => "Reflection",
            Self::Refraction => "Refraction",
        }
    }
}

// ---------------------------------------------------------------------------
// Bloom
// ---------------------------------------------------------------------------

/// Bloom post-processing parameters.
///
/// Bright pixels above [`threshold`](Self::threshold) are extracted at half
/// resolution, blurred at [`BLOOM_LEVELS`] mip levels with a separable
/// kernel, weighted per level and added back onto the lit image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BloomSettings {
    pub(crate) threshold: f32,
    pub(crate) kernel_radius: u32,
    pub(crate) intensities: [f32; BLOOM_LEVELS],
}

impl Default for BloomSettings {
    fn default() -> Self {
        Self {
            threshold: 1.0,
            kernel_radius: 24,
            intensities: [1.0; BLOOM_LEVELS],
        }
    }
}

impl BloomSettings {
    #[must_use]
    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Luminance above which a pixel blooms. Negative values clamp to zero.
    pub fn set_threshold(&mut self, threshold: f32) {
        self.threshold = threshold.max(0.0);
    }

    #[must_use]
    pub fn kernel_radius(&self) -> u32 {
        self.kernel_radius
    }

    /// Blur radius in texels, clamped to `1..=MAX_KERNEL_RADIUS`.
    pub fn set_kernel_radius(&mut self, radius: u32) {
        self.kernel_radius = radius.clamp(1, MAX_KERNEL_RADIUS);
    }

    #[must_use]
    pub fn intensities(&self) -> &[f32; BLOOM_LEVELS] {
        &self.intensities
    }

    #[must_use]
    pub fn intensity(&self, level: usize) -> f32 {
        self.intensities.get(level).copied().unwrap_or(0.0)
    }

    /// Weight of one blur level. Out-of-range levels are ignored.
    pub fn set_intensity(&mut self, level: usize, intensity: f32) {
        if let Some(slot) = self.intensities.get_mut(level) {
            *slot = intensity.max(0.0);
        }
    }

    /// Re-applies the clamps after deserialization.
    fn sanitized(mut self) -> Self {
        self.set_threshold(self.threshold);
        self.set_kernel_radius(self.kernel_radius);
        for level in 0..BLOOM_LEVELS {
            self.set_intensity(level, self.intensities[level]);
        }
        self
    }
}

// ---------------------------------------------------------------------------
// Water
// ---------------------------------------------------------------------------

/// Initial placement and animation speed of the water plane.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaterSettings {
    pub position: Vec3,
    pub scale: Vec3,
    /// Distortion phase advance per second.
    pub move_speed: f32,
}

impl Default for WaterSettings {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 2.0, 0.0),
            scale: Vec3::new(20.0, 1.0, 20.0),
            move_speed: 0.03,
        }
    }
}

// ---------------------------------------------------------------------------
// Asset paths
// ---------------------------------------------------------------------------

/// Files the renderer loads at startup, relative to the asset root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetPaths {
    /// Texture shown by the textured-quad mode.
    pub quad_texture: String,
    pub water_normal_map: String,
    pub water_dudv_map: String,
    /// Cube faces in +X, -X, +Y, -Y, +Z, -Z order.
    pub skybox_faces: [String; 6],
}

impl Default for AssetPaths {
    fn default() -> Self {
        let face = |name: &str| format!("skybox/miramar/{name}.png");
        Self {
            quad_texture: "dice.png".to_string(),
            water_normal_map: "water/normalmap.png".to_string(),
            water_dudv_map: "water/dudvmap.png".to_string(),
            skybox_faces: [
                face("right"),
                face("left"),
                face("top"),
                face("bottom"),
                face("front"),
                face("back"),
            ],
        }
    }
}

// ---------------------------------------------------------------------------
// RendererSettings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererSettings {
    /// Size of every full-resolution render target.
    pub display_size: [u32; 2],
    pub clear_color: [f32; 4],
    pub bloom: BloomSettings,
    pub water: WaterSettings,
    /// Draw light gizmos over the final image.
    pub show_debug_lights: bool,
    pub preview: PreviewTarget,
    pub assets: AssetPaths,
}

impl Default for RendererSettings {
    fn default() -> Self {
        Self {
            display_size: [800, 600],
            clear_color: [0.0, 0.0, 0.0, 1.0],
            bloom: BloomSettings::default(),
            water: WaterSettings::default(),
            show_debug_lights: true,
            preview: PreviewTarget::Main,
            assets: AssetPaths::default(),
        }
    }
}

impl RendererSettings {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let mut settings: Self = serde_json::from_str(json)?;
        settings.bloom = settings.bloom.sanitized();
        settings.display_size = [settings.display_size[0].max(1), settings.display_size[1].max(1)];
        Ok(settings)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let settings = Self::from_json_str(&json)?;
        log::info!("Loaded renderer settings from {}", path.display());
        Ok(settings)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.display_size[0]
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.display_size[1]
    }

    #[must_use]
    pub fn aspect_ratio(&self) -> f32 {
        self.width() as f32 / self.height().max(1) as f32
    }
}
