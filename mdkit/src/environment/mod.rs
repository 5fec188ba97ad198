//! The extension registry.
//!
//! An [`Environment`] goes through two phases. While *building*, extensions,
//! rules, listeners and configuration are added to it. The first query
//! (a lookup, a parse, a render or an event dispatch) *freezes* it: deferred
//! extension registration runs, every rule gets its dependencies injected and
//! the lookup tables are built. From then on the environment is read-only and
//! every mutator returns [`EnvironmentError::Frozen`].
mod builder;
mod frozen;

use std::sync::{Arc, Mutex, OnceLock, PoisonError};

pub use builder::EnvironmentBuilder;
pub use frozen::FrozenEnvironment;
use mdkit_config::{ConfigView, Configuration, Value};
use regex::Regex;

use crate::{
  cursor::Cursor,
  delimiter::{DelimiterProcessor, DelimiterProcessors},
  error::{EnvironmentError, RenderError},
  event::{Event, EventListener, ListenerResult},
  extension::Extension,
  inline::Inline,
  node::{ClassHierarchy, ClassId, ExactClass, Node},
  parser::{BlockParser, InlineParser},
  renderer::{BlockRenderer, InlineRenderer},
};

/// Registry of everything a parse/render pipeline is made of.
///
/// # Examples
///
/// ```
/// use mdkit::{
///   Characters, Cursor, DEFAULT_PRIORITY, Environment, InlineParser,
///   Injectable, Node,
/// };
///
/// struct Never;
///
/// impl Injectable for Never {}
///
/// impl InlineParser for Never {
///   fn characters(&self) -> Characters {
///     Characters::one('/')
///   }
///
///   fn parse(&self, _cursor: &mut Cursor<'_>) -> Option<Box<dyn Node>> {
///     None
///   }
/// }
///
/// let mut environment = Environment::new();
/// environment.add_inline_parser(Never, DEFAULT_PRIORITY).unwrap();
///
/// assert_eq!(environment.get_inline_parsers_for_character('/').len(), 1);
/// assert!(environment.get_inline_parsers_for_character('x').is_empty());
///
/// // Lookups froze the environment.
/// assert!(environment.add_inline_parser(Never, DEFAULT_PRIORITY).is_err());
/// ```
pub struct Environment {
  config:     Configuration,
  extensions: Vec<Arc<dyn Extension>>,
  hierarchy:  Arc<dyn ClassHierarchy>,
  building:   Mutex<Option<EnvironmentBuilder>>,
  frozen:     OnceLock<Arc<FrozenEnvironment>>,
}

impl Default for Environment {
  fn default() -> Self {
    Self::with_config(Configuration::default())
  }
}

impl Environment {
  /// Create an empty environment with an empty configuration.
  #[must_use]
  pub fn new() -> Self {
    Self::default()
  }

  #[must_use]
  pub fn with_config(config: Configuration) -> Self {
    Self {
      config,
      extensions: Vec::new(),
      hierarchy: Arc::new(ExactClass),
      building: Mutex::new(Some(EnvironmentBuilder::default())),
      frozen: OnceLock::new(),
    }
  }

  /// Whether the environment has been used and can no longer be modified.
  #[must_use]
  pub fn is_frozen(&self) -> bool {
    self.frozen.get().is_some()
  }

  fn ensure_building(&self, operation: &'static str) -> Result<(), EnvironmentError> {
    if self.is_frozen() {
      log::debug!("Rejected '{operation}' on a frozen environment");
      return Err(EnvironmentError::Frozen { operation });
    }
    Ok(())
  }

  fn builder(
    &mut self,
    operation: &'static str,
  ) -> Result<&mut EnvironmentBuilder, EnvironmentError> {
    self.ensure_building(operation)?;
    self
      .building
      .get_mut()
      .unwrap_or_else(PoisonError::into_inner)
      .as_mut()
      .ok_or(EnvironmentError::Frozen { operation })
  }

  /// Add an extension. Its `register` runs when the environment freezes, so
  /// the order in which extensions and rules are added does not matter.
  ///
  /// # Errors
  ///
  /// Returns [`EnvironmentError::Frozen`] once the environment is frozen.
  pub fn add_extension<X: Extension + 'static>(
    &mut self,
    extension: X,
  ) -> Result<&mut Self, EnvironmentError> {
    self.ensure_building("add extension")?;
    log::trace!("Adding extension {}", extension.name());
    self.extensions.push(Arc::new(extension));
    Ok(self)
  }

  /// # Errors
  ///
  /// Returns [`EnvironmentError::Frozen`] once the environment is frozen.
  pub fn add_block_parser<P: BlockParser + 'static>(
    &mut self,
    parser: P,
    priority: i32,
  ) -> Result<&mut Self, EnvironmentError> {
    self.builder("add block parser")?.add_block_parser(parser, priority);
    Ok(self)
  }

  /// # Errors
  ///
  /// Returns [`EnvironmentError::Frozen`] once the environment is frozen.
  pub fn add_inline_parser<P: InlineParser + 'static>(
    &mut self,
    parser: P,
    priority: i32,
  ) -> Result<&mut Self, EnvironmentError> {
    self.builder("add inline parser")?.add_inline_parser(parser, priority);
    Ok(self)
  }

  /// Add a delimiter processor. The last processor added for an opening
  /// character wins.
  ///
  /// # Errors
  ///
  /// Returns [`EnvironmentError::Frozen`] once the environment is frozen.
  pub fn add_delimiter_processor<P: DelimiterProcessor + 'static>(
    &mut self,
    processor: P,
  ) -> Result<&mut Self, EnvironmentError> {
    self
      .builder("add delimiter processor")?
      .add_delimiter_processor(processor);
    Ok(self)
  }

  /// Add a renderer for nodes of `class` and of every class that is a kind
  /// of it.
  ///
  /// # Errors
  ///
  /// Returns [`EnvironmentError::Frozen`] once the environment is frozen.
  pub fn add_block_renderer<R: BlockRenderer + 'static>(
    &mut self,
    class: impl Into<ClassId>,
    renderer: R,
    priority: i32,
  ) -> Result<&mut Self, EnvironmentError> {
    self
      .builder("add block renderer")?
      .add_block_renderer(class, renderer, priority);
    Ok(self)
  }

  /// # Errors
  ///
  /// Returns [`EnvironmentError::Frozen`] once the environment is frozen.
  pub fn add_inline_renderer<R: InlineRenderer + 'static>(
    &mut self,
    class: impl Into<ClassId>,
    renderer: R,
    priority: i32,
  ) -> Result<&mut Self, EnvironmentError> {
    self
      .builder("add inline renderer")?
      .add_inline_renderer(class, renderer, priority);
    Ok(self)
  }

  /// # Errors
  ///
  /// Returns [`EnvironmentError::Frozen`] once the environment is frozen.
  pub fn add_event_listener<E, F>(
    &mut self,
    listener: F,
    priority: i32,
  ) -> Result<&mut Self, EnvironmentError>
  where
    E: Event,
    F: Fn(&mut E) -> ListenerResult + Send + Sync + 'static,
  {
    self
      .builder("add event listener")?
      .add_event_listener::<E, F>(listener, priority);
    Ok(self)
  }

  /// # Errors
  ///
  /// Returns [`EnvironmentError::Frozen`] once the environment is frozen.
  pub fn add_event_listener_object<E, L>(
    &mut self,
    listener: L,
    priority: i32,
  ) -> Result<&mut Self, EnvironmentError>
  where
    E: Event,
    L: EventListener<E> + 'static,
  {
    self
      .builder("add event listener")?
      .add_event_listener_object::<E, L>(listener, priority);
    Ok(self)
  }

  /// Replace the class hierarchy used for renderer lookups. Defaults to
  /// [`ExactClass`].
  ///
  /// # Errors
  ///
  /// Returns [`EnvironmentError::Frozen`] once the environment is frozen.
  pub fn set_class_hierarchy<H: ClassHierarchy + 'static>(
    &mut self,
    hierarchy: H,
  ) -> Result<&mut Self, EnvironmentError> {
    self.ensure_building("set class hierarchy")?;
    self.hierarchy = Arc::new(hierarchy);
    Ok(self)
  }

  /// Replace the whole configuration.
  ///
  /// # Errors
  ///
  /// Returns [`EnvironmentError::Frozen`] once the environment is frozen.
  pub fn set_config(
    &mut self,
    config: Configuration,
  ) -> Result<&mut Self, EnvironmentError> {
    self.ensure_building("set config")?;
    self.config.replace(config);
    Ok(self)
  }

  /// Deep-merge `config` into the current configuration. Tables merge key
  /// by key, anything else is overwritten.
  ///
  /// # Errors
  ///
  /// Returns [`EnvironmentError::Frozen`] once the environment is frozen.
  pub fn merge_config(
    &mut self,
    config: Configuration,
  ) -> Result<&mut Self, EnvironmentError> {
    self.ensure_building("merge config")?;
    self.config.merge(config);
    Ok(self)
  }

  /// The whole configuration tree. Reading it does not freeze the
  /// environment.
  #[must_use]
  pub const fn config(&self) -> &Configuration {
    &self.config
  }

  /// Value at a slash-delimited path, see [`Configuration::get`].
  #[must_use]
  pub fn get_config(&self, path: &str) -> Option<&Value> {
    self.config.get(path)
  }

  #[must_use]
  pub fn get_config_or(&self, path: &str, default: impl Into<Value>) -> Value {
    self.config.get_or(path, default)
  }

  /// Extensions added so far. After freezing, this includes extensions
  /// added by other extensions.
  #[must_use]
  pub fn get_extensions(&self) -> &[Arc<dyn Extension>] {
    self
      .frozen
      .get()
      .map_or(self.extensions.as_slice(), |frozen| frozen.extensions())
  }

  /// Freeze the environment if it is not frozen yet, and return the frozen
  /// rule set. Freezing happens exactly once, even under concurrent use.
  pub fn freeze(&self) -> Arc<FrozenEnvironment> {
    Arc::clone(self.frozen())
  }

  fn frozen(&self) -> &Arc<FrozenEnvironment> {
    self.frozen.get_or_init(|| {
      let builder = self
        .building
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .take()
        .unwrap_or_default();
      log::debug!("Freezing environment");
      FrozenEnvironment::build(
        builder,
        &self.extensions,
        ConfigView::new(self.config.clone()),
        Arc::clone(&self.hierarchy),
      )
    })
  }

  pub fn get_block_parsers(&self) -> impl ExactSizeIterator<Item = &dyn BlockParser> {
    self.frozen().block_parsers()
  }

  #[must_use]
  pub fn get_inline_parsers_for_character(&self, ch: char) -> Vec<&dyn InlineParser> {
    self.frozen().inline_parsers_for_character(ch)
  }

  #[must_use]
  pub fn get_inline_parser_character_regex(&self) -> &Regex {
    self.frozen().inline_parser_character_regex()
  }

  #[must_use]
  pub fn get_delimiter_processors(&self) -> &DelimiterProcessors {
    self.frozen().delimiter_processors()
  }

  #[must_use]
  pub fn get_block_renderers_for_class(
    &self,
    class: &ClassId,
  ) -> Vec<&dyn BlockRenderer> {
    self.frozen().block_renderers_for_class(class)
  }

  #[must_use]
  pub fn get_inline_renderers_for_class(
    &self,
    class: &ClassId,
  ) -> Vec<&dyn InlineRenderer> {
    self.frozen().inline_renderers_for_class(class)
  }

  /// Dispatch `event` to its listeners, see [`FrozenEnvironment::dispatch`].
  ///
  /// # Errors
  ///
  /// Returns the first error raised by a listener.
  pub fn dispatch<E: Event>(&self, event: &mut E) -> ListenerResult {
    self.frozen().dispatch(event)
  }

  pub fn parse_block_start(&self, cursor: &mut Cursor<'_>) -> Option<Box<dyn Node>> {
    self.frozen().parse_block_start(cursor)
  }

  #[must_use]
  pub fn parse_inline(&self, text: &str) -> Vec<Inline> {
    self.frozen().parse_inline(text)
  }

  /// # Errors
  ///
  /// Returns [`RenderError::NoBlockRenderer`] when no renderer accepted the
  /// node.
  pub fn render_block(&self, node: &dyn Node) -> Result<String, RenderError> {
    self.frozen().render_block(node)
  }

  /// # Errors
  ///
  /// Returns [`RenderError::NoInlineRenderer`] when no renderer accepted the
  /// node.
  pub fn render_inline(&self, node: &dyn Node) -> Result<String, RenderError> {
    self.frozen().render_inline(node)
  }
}

impl std::fmt::Debug for Environment {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Environment")
      .field("config", &self.config)
      .field("extensions", &self.extensions.len())
      .field("frozen", &self.frozen.get())
      .finish_non_exhaustive()
  }
}
