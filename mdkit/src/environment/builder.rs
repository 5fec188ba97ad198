use std::{
  any::TypeId,
  collections::{HashMap, VecDeque},
  sync::Arc,
};

use mdkit_config::ConfigView;

use crate::{
  delimiter::DelimiterProcessor,
  event::{ErasedListener, Event, EventListener, FnListener, ListenerResult, TypedListener},
  extension::Extension,
  node::ClassId,
  parser::{BlockParser, InlineParser},
  priority::Prioritized,
  renderer::{BlockRenderer, InlineRenderer},
};

pub(crate) type RendererTable<R> = HashMap<ClassId, Vec<Prioritized<Box<R>>>>;

/// Collects rules until the environment freezes.
///
/// Extensions receive the builder in [`Extension::register`]. Unlike the
/// [`Environment`](super::Environment) mutators, nothing here can fail: an
/// extension only ever sees the builder while the environment is being
/// frozen, which is the one moment registration is still allowed.
pub struct EnvironmentBuilder {
  pub(crate) config:               ConfigView,
  pub(crate) block_parsers:        Vec<Prioritized<Box<dyn BlockParser>>>,
  pub(crate) inline_parsers:       Vec<Prioritized<Box<dyn InlineParser>>>,
  pub(crate) delimiter_processors: Vec<Box<dyn DelimiterProcessor>>,
  pub(crate) block_renderers:      RendererTable<dyn BlockRenderer>,
  pub(crate) inline_renderers:     RendererTable<dyn InlineRenderer>,
  pub(crate) listeners:
    HashMap<TypeId, Vec<Prioritized<Box<dyn ErasedListener>>>>,
  pub(crate) pending_extensions:   VecDeque<Arc<dyn Extension>>,
  next_sequence:                   u64,
}

impl Default for EnvironmentBuilder {
  fn default() -> Self {
    Self {
      config:               ConfigView::default(),
      block_parsers:        Vec::new(),
      inline_parsers:       Vec::new(),
      delimiter_processors: Vec::new(),
      block_renderers:      HashMap::new(),
      inline_renderers:     HashMap::new(),
      listeners:            HashMap::new(),
      pending_extensions:   VecDeque::new(),
      next_sequence:        0,
    }
  }
}

impl EnvironmentBuilder {
  /// The configuration the environment is being frozen with.
  #[must_use]
  pub const fn config(&self) -> &ConfigView {
    &self.config
  }

  fn prioritized<T>(&mut self, value: T, priority: i32) -> Prioritized<T> {
    let sequence = self.next_sequence;
    self.next_sequence += 1;
    Prioritized {
      value,
      priority,
      sequence,
    }
  }

  /// Register another extension. It is registered after the extensions
  /// already queued, during the same freeze.
  pub fn add_extension<X: Extension + 'static>(&mut self, extension: X) -> &mut Self {
    log::trace!("Queueing nested extension {}", extension.name());
    self.pending_extensions.push_back(Arc::new(extension));
    self
  }

  pub fn add_block_parser<P: BlockParser + 'static>(
    &mut self,
    parser: P,
    priority: i32,
  ) -> &mut Self {
    let entry = self.prioritized(Box::new(parser) as Box<dyn BlockParser>, priority);
    self.block_parsers.push(entry);
    self
  }

  pub fn add_inline_parser<P: InlineParser + 'static>(
    &mut self,
    parser: P,
    priority: i32,
  ) -> &mut Self {
    let entry =
      self.prioritized(Box::new(parser) as Box<dyn InlineParser>, priority);
    self.inline_parsers.push(entry);
    self
  }

  /// Register a delimiter processor. A later processor for the same opening
  /// character replaces an earlier one.
  pub fn add_delimiter_processor<P: DelimiterProcessor + 'static>(
    &mut self,
    processor: P,
  ) -> &mut Self {
    self.delimiter_processors.push(Box::new(processor));
    self
  }

  pub fn add_block_renderer<R: BlockRenderer + 'static>(
    &mut self,
    class: impl Into<ClassId>,
    renderer: R,
    priority: i32,
  ) -> &mut Self {
    let entry =
      self.prioritized(Box::new(renderer) as Box<dyn BlockRenderer>, priority);
    self.block_renderers.entry(class.into()).or_default().push(entry);
    self
  }

  pub fn add_inline_renderer<R: InlineRenderer + 'static>(
    &mut self,
    class: impl Into<ClassId>,
    renderer: R,
    priority: i32,
  ) -> &mut Self {
    let entry =
      self.prioritized(Box::new(renderer) as Box<dyn InlineRenderer>, priority);
    self.inline_renderers.entry(class.into()).or_default().push(entry);
    self
  }

  /// Register a closure listening for events of type `E`.
  pub fn add_event_listener<E, F>(&mut self, listener: F, priority: i32) -> &mut Self
  where
    E: Event,
    F: Fn(&mut E) -> ListenerResult + Send + Sync + 'static,
  {
    self.add_event_listener_object::<E, _>(FnListener(listener), priority)
  }

  /// Register a listener object for events of type `E`. Unlike closures,
  /// listener objects take part in dependency injection.
  pub fn add_event_listener_object<E, L>(
    &mut self,
    listener: L,
    priority: i32,
  ) -> &mut Self
  where
    E: Event,
    L: EventListener<E> + 'static,
  {
    let erased: Box<dyn ErasedListener> =
      Box::new(TypedListener::<E, L>::new(listener));
    let entry = self.prioritized(erased, priority);
    self.listeners.entry(TypeId::of::<E>()).or_default().push(entry);
    self
  }
}
