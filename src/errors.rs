//! Error Types
//!
//! This module defines the error types used throughout the renderer.
//!
//! # Overview
//!
//! The main error type [`TidalError`] covers the failure modes that stop a
//! frame:
//! - Uniform arena misuse and overflow
//! - Vertex layouts that cannot feed a shader program
//! - Stale or foreign resource handles
//! - GPU initialization failures (wgpu backend)
//! - I/O and configuration errors
//!
//! Rendering problems that an interactive tool should survive (shader
//! diagnostics, incomplete framebuffers, missing textures) are logged and
//! surfaced as values instead, see
//! [`FramebufferStatus`](crate::renderer::core::FramebufferStatus) and
//! [`Handle::NONE`](crate::resources::Handle::NONE).
//!
//! # Usage
//!
//! All fallible APIs return [`Result<T>`] which is an alias for
//! `std::result::Result<T, TidalError>`.
//!
//! ```rust,ignore
//! use tidal::errors::{TidalError, Result};
//!
//! fn pack() -> Result<()> {
//!     Ok(())
//! }
//! ```

use thiserror::Error;

/// The main error type for the Tidal renderer.
#[derive(Error, Debug)]
pub enum TidalError {
    // ========================================================================
    // Uniform Arena Errors
    // ========================================================================
    /// A push would run past the end of the uniform arena.
    #[error(
        "Uniform buffer overflow: writing {requested} bytes at offset {offset} exceeds capacity {capacity}"
    )]
    UniformBufferOverflow {
        /// Aligned write offset
        offset: u32,
        /// Number of bytes that were pushed
        requested: u32,
        /// Arena capacity in bytes
        capacity: u32,
    },

    /// Alignment must be a non-zero power of two.
    #[error("Invalid alignment {0}: must be a power of two")]
    InvalidAlignment(u32),

    // ========================================================================
    // Geometry & Binding Errors
    // ========================================================================
    /// A shader attribute has no counterpart in the submesh's vertex layout.
    #[error(
        "Vertex layout mismatch: program '{program}' reads attribute location {location} which submesh {submesh} does not provide"
    )]
    VertexLayoutMismatch {
        /// Name of the program being bound
        program: String,
        /// Index of the submesh inside its mesh
        submesh: usize,
        /// Attribute location missing from the layout
        location: u32,
    },

    /// Submesh index out of bounds.
    #[error("Submesh index {index} out of bounds (mesh has {count} submeshes)")]
    SubmeshOutOfBounds {
        /// Requested index
        index: usize,
        /// Number of submeshes
        count: usize,
    },

    // ========================================================================
    // Resource Errors
    // ========================================================================
    /// The handle does not refer to a live registry entry.
    #[error("Invalid {kind} handle: {index}")]
    InvalidHandle {
        /// Resource kind, e.g. "mesh"
        kind: &'static str,
        /// Raw index
        index: u32,
    },

    /// The requested asset was not found.
    #[error("Asset not found: {0}")]
    AssetNotFound(String),

    /// Image decoding error.
    #[error("Image decode error: {0}")]
    ImageDecodeError(String),

    /// Unsupported pixel layout for a texture upload.
    #[error("Unsupported image channel count: {0}")]
    UnsupportedChannels(u32),

    // ========================================================================
    // GPU Errors
    // ========================================================================
    /// Failed to request a compatible GPU adapter.
    #[error("Failed to request GPU adapter: {0}")]
    AdapterRequestFailed(String),

    /// Failed to create the GPU device.
    #[cfg(feature = "wgpu-backend")]
    #[error("Failed to create WGPU device: {0}")]
    DeviceCreateFailed(#[from] wgpu::RequestDeviceError),

    // ========================================================================
    // I/O & Configuration Errors
    // ========================================================================
    /// File I/O error.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Settings file could not be parsed.
    #[error("Settings parse error: {0}")]
    SettingsError(#[from] serde_json::Error),
}

/// Alias for `Result<T, TidalError>`.
pub type Result<T> = std::result::Result<T, TidalError>;
