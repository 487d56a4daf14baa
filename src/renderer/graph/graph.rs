//! Render graph executor.
//!
//! Nodes run in insertion order. Each render mode builds its graph once at
//! startup.

use super::context::FrameContext;
use super::node::RenderNode;
use crate::errors::Result;

pub struct RenderGraph {
    nodes: Vec<Box<dyn RenderNode>>,
}

impl Default for RenderGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderGraph {
    #[must_use]
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    #[inline]
    #[must_use]
    pub fn with_node(mut self, node: impl RenderNode + 'static) -> Self {
        self.nodes.push(Box::new(node));
        self
    }

    #[must_use]
    pub fn node_names(&self) -> Vec<&'static str> {
        self.nodes.iter().map(|node| node.name()).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Runs every node in order, stopping at the first error.
    pub fn execute(&self, ctx: &mut FrameContext<'_>) -> Result<()> {
        for node in &self.nodes {
            log::trace!("Render node '{}'", node.name());
            node.run(ctx)?;
        }
        Ok(())
    }
}
