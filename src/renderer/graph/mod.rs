//! Frame orchestration
//!
//! Provides:
//! - FrameContext: per-frame references to device, registry, scene and targets
//! - RenderNode: one stage of a frame
//! - RenderGraph: ordered list of nodes, one graph per render mode
//! - passes: the stages themselves

pub mod context;
#[allow(clippy::module_inception)]
pub mod graph;
pub mod node;
pub mod passes;

pub use context::FrameContext;
pub use graph::RenderGraph;
pub use node::RenderNode;
