//! Renderer Settings Tests
//!
//! Tests for:
//! - Defaults
//! - JSON loading with partial files and clamping
//! - JSON round trip
//! - Bloom accessors

use tidal::renderer::settings::{BLOOM_LEVELS, BloomSettings, MAX_KERNEL_RADIUS};
use tidal::{PreviewTarget, RendererSettings, TidalError};

const EPSILON: f32 = 1e-6;

// ============================================================================
// Defaults
// ============================================================================

#[test]
fn default_settings() {
    let settings = RendererSettings::default();
    assert_eq!(settings.display_size, [800, 600]);
    assert!((settings.aspect_ratio() - 800.0 / 600.0).abs() < EPSILON);
    assert_eq!(settings.preview, PreviewTarget::Main);
    assert!(settings.show_debug_lights);
    assert_eq!(settings.bloom.intensities().len(), BLOOM_LEVELS);
    assert_eq!(settings.assets.skybox_faces.len(), 6);
}

// ============================================================================
// JSON
// ============================================================================

#[test]
fn partial_json_keeps_defaults() {
    let settings = RendererSettings::from_json_str(
        r#"{ "display_size": [1280, 720], "bloom": { "threshold": 0.8 } }"#,
    )
    .unwrap();
    assert_eq!(settings.width(), 1280);
    assert_eq!(settings.height(), 720);
    assert!((settings.bloom.threshold() - 0.8).abs() < EPSILON);
    assert_eq!(settings.bloom.kernel_radius(), BloomSettings::default().kernel_radius());
    assert_eq!(settings.water, RendererSettings::default().water);
}

#[test]
fn json_values_are_clamped() {
    let settings = RendererSettings::from_json_str(
        r#"{ "display_size": [0, 0], "bloom": { "threshold": -1.0, "kernel_radius": 1000, "intensities": [1.0, -2.0, 0.5, 0.0, 3.0] } }"#,
    )
    .unwrap();
    assert_eq!(settings.display_size, [1, 1]);
    assert!(settings.bloom.threshold().abs() < EPSILON);
    assert_eq!(settings.bloom.kernel_radius(), MAX_KERNEL_RADIUS);
    assert!(settings.bloom.intensity(1).abs() < EPSILON);
    assert!((settings.bloom.intensity(4) - 3.0).abs() < EPSILON);
}

#[test]
fn json_round_trip() {
    let mut settings = RendererSettings::default();
    settings.preview = PreviewTarget::Reflection;
    settings.show_debug_lights = false;
    settings.bloom.set_intensity(2, 0.25);

    let json = settings.to_json_string().unwrap();
    let loaded = RendererSettings::from_json_str(&json).unwrap();
    assert_eq!(loaded, settings);
}

#[test]
fn malformed_json_is_a_settings_error() {
    let result = RendererSettings::from_json_str("{ display_size: ");
    assert!(matches!(result, Err(TidalError::SettingsError(_))));
}

#[test]
fn missing_settings_file_is_an_io_error() {
    let result = RendererSettings::from_json_file("/nonexistent/tidal-settings.json");
    assert!(matches!(result, Err(TidalError::IoError(_))));
}

// ============================================================================
// Bloom accessors
// ============================================================================

#[test]
fn bloom_setters_clamp() {
    let mut bloom = BloomSettings::default();
    bloom.set_kernel_radius(0);
    assert_eq!(bloom.kernel_radius(), 1);
    bloom.set_threshold(-3.0);
    assert!(bloom.threshold().abs() < EPSILON);
    bloom.set_intensity(BLOOM_LEVELS, 5.0);
    assert!(bloom.intensity(BLOOM_LEVELS).abs() < EPSILON);
    bloom.set_intensity(0, 2.5);
    assert!((bloom.intensity(0) - 2.5).abs() < EPSILON);
}

#[test]
fn preview_labels_are_unique() {
    let mut labels: Vec<&str> = PreviewTarget::ALL.iter().map(|t| t.label()).collect();
    labels.sort_unstable();
    labels.dedup();
    assert_eq!(labels.len(), PreviewTarget::ALL.len());
}
