use thiserror::Error;

use crate::node::ClassId;

/// Misuse of an [`Environment`](crate::Environment).
///
/// These are wiring mistakes, not data errors: they mean the environment was
/// modified after it had already been used.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnvironmentError {
  #[error(
    "Cannot {operation}: the environment is frozen once it has been used for \
     parsing, rendering or dispatching events"
  )]
  Frozen { operation: &'static str },
}

/// Errors from rendering a node through the environment.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
  #[error("No block renderer accepted node of class '{0}'")]
  NoBlockRenderer(ClassId),

  #[error("No inline renderer accepted node of class '{0}'")]
  NoInlineRenderer(ClassId),
}
