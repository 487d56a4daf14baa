//! Scene data
//!
//! - Scene: the explicit frame context (camera, entities, lights, water, mode)
//! - Camera: yaw/pitch fly camera with cached view/projection
//! - Entity: transform + model reference + per-frame uniform range
//! - Light: directional or point light
//! - WaterPlane: animated water surface and its clip planes

pub mod camera;
pub mod entity;
pub mod light;
#[allow(clippy::module_inception)]
pub mod scene;
pub mod water;

pub use camera::Camera;
pub use entity::{Entity, transform_matrix};
pub use light::{Light, LightType};
pub use scene::Scene;
pub use water::WaterPlane;
