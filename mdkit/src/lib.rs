//! # mdkit - Extension environment for CommonMark pipelines
//!
//! `mdkit` holds everything a Markdown parse/render pipeline is assembled
//! from: block and inline parser rules, delimiter processors, node renderers
//! and event listeners, each contributed by extensions and ordered by
//! priority. The core grammar is just another extension.
//!
//! ## Quick Start
//!
//! ```rust
//! use mdkit::{
//!   ClassId, DEFAULT_PRIORITY, Environment, EnvironmentBuilder, Extension,
//!   Injectable, InlineRenderer, Node,
//! };
//!
//! #[derive(Debug)]
//! struct Text(String);
//!
//! impl Node for Text {
//!   fn class_id(&self) -> ClassId {
//!     ClassId::from_static("text")
//!   }
//!
//!   fn as_any(&self) -> &dyn std::any::Any {
//!     self
//!   }
//! }
//!
//! struct TextRenderer;
//!
//! impl Injectable for TextRenderer {}
//!
//! impl InlineRenderer for TextRenderer {
//!   fn render(&self, node: &dyn Node) -> Option<String> {
//!     node.as_any().downcast_ref::<Text>().map(|t| t.0.clone())
//!   }
//! }
//!
//! struct CoreExtension;
//!
//! impl Extension for CoreExtension {
//!   fn register(&self, environment: &mut EnvironmentBuilder) {
//!     environment.add_inline_renderer("text", TextRenderer, DEFAULT_PRIORITY);
//!   }
//! }
//!
//! let mut environment = Environment::new();
//! environment.add_extension(CoreExtension).unwrap();
//!
//! let html = environment.render_inline(&Text("hello".into())).unwrap();
//! assert_eq!(html, "hello");
//! assert!(environment.is_frozen());
//! ```
//!
//! ## Link destinations
//!
//! URL normalization for link destinations lives in the `mdkit-utils` crate,
//! configuration in `mdkit-config`.
pub mod cursor;
pub mod delimiter;
pub mod environment;
pub mod error;
pub mod event;
pub mod extension;
pub mod inject;
pub mod inline;
pub mod node;
pub mod parser;
mod priority;
pub mod renderer;

pub use cursor::Cursor;
pub use delimiter::{DelimiterProcessor, DelimiterProcessors};
pub use environment::{Environment, EnvironmentBuilder, FrozenEnvironment};
pub use error::{EnvironmentError, RenderError};
pub use event::{Event, EventListener, ListenerError, ListenerResult, Propagation};
pub use extension::Extension;
pub use inject::{
  ConfigView,
  ConfigurationAware,
  EnvironmentAware,
  EnvironmentRef,
  Injectable,
};
pub use inline::Inline;
pub use mdkit_config::Configuration;
pub use node::{ClassHierarchy, ClassId, ClassTree, ExactClass, Node};
pub use parser::{BlockParser, Characters, InlineParser};
pub use priority::DEFAULT_PRIORITY;
pub use renderer::{BlockRenderer, InlineRenderer};

/// Returns a regex that never matches anything.
///
/// Used as a fallback when a pattern fails to compile, and as the inline
/// character pattern of an environment without inline parsers.
#[must_use]
#[allow(
  clippy::expect_used,
  reason = "This pattern is guaranteed to be valid"
)]
pub(crate) fn never_matching_regex() -> regex::Regex {
  regex::Regex::new(r"[^\s\S]")
    .expect("regex pattern [^\\s\\S] should always compile")
}
