//! Optional capabilities of contributed rules.
//!
//! A parser, renderer, delimiter processor or event listener may need the
//! environment it was registered with (to look up other rules) or the
//! configuration (to read its options). It declares so by returning itself
//! from the matching [`Injectable`] accessor; the environment then hands over
//! the dependency exactly once, when it freezes, before the rule is used.
//!
//! ```
//! use mdkit::{
//!   BlockParser, ConfigView, ConfigurationAware, Cursor, Injectable, Node,
//! };
//!
//! #[derive(Default)]
//! struct ThematicBreakParser {
//!   max_indent: u64,
//! }
//!
//! impl Injectable for ThematicBreakParser {
//!   fn as_configuration_aware(
//!     &mut self,
//!   ) -> Option<&mut dyn ConfigurationAware> {
//!     Some(self)
//!   }
//! }
//!
//! impl ConfigurationAware for ThematicBreakParser {
//!   fn set_configuration(&mut self, config: ConfigView) {
//!     self.max_indent = config
//!       .get("thematic_break/max_indent")
//!       .and_then(serde_json::Value::as_u64)
//!       .unwrap_or(3);
//!   }
//! }
//!
//! impl BlockParser for ThematicBreakParser {
//!   fn parse(&self, _cursor: &mut Cursor<'_>) -> Option<Box<dyn Node>> {
//!     None
//!   }
//! }
//! ```
use std::sync::{Arc, Weak};

pub use mdkit_config::ConfigView;

use crate::environment::FrozenEnvironment;

/// Declares which dependencies a contributed object wants injected.
///
/// Both accessors default to `None`, so objects without dependencies only
/// need an empty `impl Injectable for T {}`.
pub trait Injectable {
  fn as_environment_aware(&mut self) -> Option<&mut dyn EnvironmentAware> {
    None
  }

  fn as_configuration_aware(&mut self) -> Option<&mut dyn ConfigurationAware> {
    None
  }
}

/// Receives a handle to the environment the object was registered with.
pub trait EnvironmentAware {
  fn set_environment(&mut self, environment: EnvironmentRef);
}

/// Receives a read-only view of the environment's configuration.
pub trait ConfigurationAware {
  fn set_configuration(&mut self, config: ConfigView);
}

/// Non-owning handle to a frozen environment.
///
/// Rules live inside the environment they reference, so the handle is weak.
/// It upgrades for as long as the environment is alive, which covers every
/// call the environment makes into the rule. It does not upgrade while the
/// environment is still being built, i.e. inside `set_environment` itself.
#[derive(Debug, Clone, Default)]
pub struct EnvironmentRef(Weak<FrozenEnvironment>);

impl EnvironmentRef {
  pub(crate) const fn new(environment: Weak<FrozenEnvironment>) -> Self {
    Self(environment)
  }

  #[must_use]
  pub fn upgrade(&self) -> Option<Arc<FrozenEnvironment>> {
    self.0.upgrade()
  }
}

/// Hand the environment and configuration to `target`, as far as it asks for
/// them.
pub(crate) fn inject(
  target: &mut dyn Injectable,
  environment: &EnvironmentRef,
  config: &ConfigView,
) {
  if let Some(aware) = target.as_environment_aware() {
    log::trace!("Injecting environment");
    aware.set_environment(environment.clone());
  }
  if let Some(aware) = target.as_configuration_aware() {
    log::trace!("Injecting configuration");
    aware.set_configuration(config.clone());
  }
}
