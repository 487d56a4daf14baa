//! Render node trait.

use super::context::FrameContext;
use crate::errors::Result;

/// One step of a frame: records and submits zero or more render passes.
///
/// Nodes hold no GPU state of their own; everything they read or write is
/// reached through the [`FrameContext`]. An error aborts the frame.
pub trait RenderNode {
    /// Name used in logs and pass labels.
    fn name(&self) -> &'static str;

    fn run(&self, ctx: &mut FrameContext<'_>) -> Result<()>;
}
