//! GPU core
//!
//! Provides:
//! - [`GpuDevice`]: the abstract immediate-mode GPU interface and its descriptors
//! - [`Buffer`]: the aligned uniform arena
//! - [`HeadlessDevice`]: CPU reference backend
//! - `WgpuDevice`: offscreen wgpu backend (feature `wgpu-backend`)

pub mod buffer;
pub mod device;
pub mod headless;
#[cfg(feature = "wgpu-backend")]
pub mod wgpu_device;

pub use buffer::{Buffer, BufferMapping, VEC4_ALIGNMENT, align};
pub use device::*;
pub use headless::{DeviceCommand, HeadlessDevice};
#[cfg(feature = "wgpu-backend")]
pub use wgpu_device::WgpuDevice;
