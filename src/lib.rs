#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::too_many_arguments)]

//! Tidal: a multi-pass renderer core.
//!
//! The crate keeps GPU bookkeeping (uniform arena, render targets, vertex
//! bindings) behind the [`GpuDevice`](renderer::core::GpuDevice) trait and
//! renders a [`Scene`] through one of three pipelines: a textured quad, a
//! forward pass, or deferred shading with water reflections and bloom.

pub mod app;
pub mod assets;
pub mod errors;
pub mod logging;
pub mod renderer;
pub mod resources;
pub mod scene;

pub use app::{App, CameraController, InputState};
pub use assets::{AssetLoader, ImageLoader, ShaderLoader};
pub use errors::{Result, TidalError};
pub use logging::{LoggingConfig, init_logging};
pub use renderer::core::{GpuDevice, HeadlessDevice};
pub use renderer::settings::{PreviewTarget, RendererSettings};
pub use renderer::{RenderMode, Renderer};
pub use resources::{Handle, Mesh, Model, PrimitiveKind, ResourceRegistry};
pub use scene::{Camera, Entity, Light, LightType, Scene, WaterPlane};

#[cfg(feature = "wgpu-backend")]
pub use renderer::core::WgpuDevice;
