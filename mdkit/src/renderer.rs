use crate::{inject::Injectable, node::Node};

/// Renders a block-level node.
///
/// Returning `None` declines the node, and the next renderer registered for
/// its class (or one of its ancestors) gets a turn.
pub trait BlockRenderer: Injectable + Send + Sync {
  fn render(&self, node: &dyn Node) -> Option<String>;
}

/// Renders an inline node. Same contract as [`BlockRenderer`].
pub trait InlineRenderer: Injectable + Send + Sync {
  fn render(&self, node: &dyn Node) -> Option<String>;
}
