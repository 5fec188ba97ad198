use std::{
  any::TypeId,
  collections::{BTreeSet, HashMap, VecDeque},
  fmt,
  sync::Arc,
};

use mdkit_config::ConfigView;
use regex::Regex;

use super::builder::{EnvironmentBuilder, RendererTable};
use crate::{
  cursor::Cursor,
  delimiter::DelimiterProcessors,
  error::RenderError,
  event::{ErasedListener, Event, ListenerResult, Propagation},
  extension::Extension,
  inject::{EnvironmentRef, inject},
  inline::{self, Inline},
  never_matching_regex,
  node::{ClassHierarchy, ClassId, Node},
  parser::{BlockParser, Characters, InlineParser},
  priority::{Prioritized, sort_by_priority},
  renderer::{BlockRenderer, InlineRenderer},
};

/// The read-only rule set of an environment.
///
/// Built exactly once, when the owning [`Environment`](super::Environment) is
/// first used. Every list is already in dispatch order: descending priority,
/// registration order among equal priorities.
pub struct FrozenEnvironment {
  config:               ConfigView,
  extensions:           Vec<Arc<dyn Extension>>,
  hierarchy:            Arc<dyn ClassHierarchy>,
  block_parsers:        Vec<Box<dyn BlockParser>>,
  inline_parsers:       Vec<Box<dyn InlineParser>>,
  inline_by_character:  HashMap<char, Vec<usize>>,
  inline_any:           Vec<usize>,
  inline_regex:         Regex,
  delimiter_processors: DelimiterProcessors,
  block_renderers:      RendererTable<dyn BlockRenderer>,
  inline_renderers:     RendererTable<dyn InlineRenderer>,
  listeners:            HashMap<TypeId, Vec<Box<dyn ErasedListener>>>,
}

impl FrozenEnvironment {
  pub(crate) fn build(
    mut builder: EnvironmentBuilder,
    extensions: &[Arc<dyn Extension>],
    config: ConfigView,
    hierarchy: Arc<dyn ClassHierarchy>,
  ) -> Arc<Self> {
    builder.config = config;

    let mut queue: VecDeque<Arc<dyn Extension>> =
      extensions.iter().cloned().collect();
    let mut registered = Vec::with_capacity(queue.len());
    while let Some(extension) = queue.pop_front() {
      log::debug!("Registering extension {}", extension.name());
      extension.register(&mut builder);
      queue.extend(builder.pending_extensions.drain(..));
      registered.push(extension);
    }

    Arc::new_cyclic(|weak| {
      let environment = EnvironmentRef::new(weak.clone());
      let config = builder.config.clone();
      inject_all(&mut builder, &environment, &config);

      let EnvironmentBuilder {
        block_parsers,
        inline_parsers,
        delimiter_processors,
        mut block_renderers,
        mut inline_renderers,
        listeners,
        ..
      } = builder;

      let block_parsers = sorted_values(block_parsers);
      let inline_parsers = sorted_values(inline_parsers);
      let (inline_by_character, inline_any) = index_inline_parsers(&inline_parsers);
      let inline_regex = inline_character_regex(&inline_parsers);

      let mut delimiters = DelimiterProcessors::default();
      for processor in delimiter_processors {
        delimiters.insert(processor);
      }

      for entries in block_renderers.values_mut() {
        sort_by_priority(entries);
      }
      for entries in inline_renderers.values_mut() {
        sort_by_priority(entries);
      }

      let listeners: HashMap<_, _> = listeners
        .into_iter()
        .map(|(event, entries)| (event, sorted_values(entries)))
        .collect();

      log::debug!(
        "Environment frozen with {} extension(s), {} block parser(s), {} \
         inline parser(s), {} delimiter processor(s), {} listener(s)",
        registered.len(),
        block_parsers.len(),
        inline_parsers.len(),
        delimiters.len(),
        listeners.values().map(Vec::len).sum::<usize>(),
      );

      Self {
        config,
        extensions: registered,
        hierarchy,
        block_parsers,
        inline_parsers,
        inline_by_character,
        inline_any,
        inline_regex,
        delimiter_processors: delimiters,
        block_renderers,
        inline_renderers,
        listeners,
      }
    })
  }

  /// The configuration every rule was injected with.
  #[must_use]
  pub const fn config(&self) -> &ConfigView {
    &self.config
  }

  /// Every extension that was registered, including nested ones, in
  /// registration order.
  #[must_use]
  pub fn extensions(&self) -> &[Arc<dyn Extension>] {
    &self.extensions
  }

  pub fn block_parsers(&self) -> impl ExactSizeIterator<Item = &dyn BlockParser> {
    self.block_parsers.iter().map(|parser| &**parser)
  }

  /// Inline parsers to try when the current character is `ch`, in priority
  /// order. Parsers matching any character are included; for a character no
  /// parser claims, only those are returned.
  #[must_use]
  pub fn inline_parsers_for_character(&self, ch: char) -> Vec<&dyn InlineParser> {
    self.inline_parsers_iter(ch).collect()
  }

  /// Same as [`Self::inline_parsers_for_character`] without collecting, for
  /// the scanning loop.
  pub(crate) fn inline_parsers_iter(
    &self,
    ch: char,
  ) -> impl Iterator<Item = &dyn InlineParser> {
    self
      .inline_by_character
      .get(&ch)
      .unwrap_or(&self.inline_any)
      .iter()
      .filter_map(|&idx| self.inline_parsers.get(idx))
      .map(|parser| &**parser)
  }

  /// Matches any single character that some inline parser starts on. Text
  /// between two matches can be consumed as a literal run.
  #[must_use]
  pub const fn inline_parser_character_regex(&self) -> &Regex {
    &self.inline_regex
  }

  #[must_use]
  pub const fn delimiter_processors(&self) -> &DelimiterProcessors {
    &self.delimiter_processors
  }

  /// Renderers for nodes of `class`: those registered for the class itself
  /// or for any class it is a kind of, merged in priority order.
  #[must_use]
  pub fn block_renderers_for_class(&self, class: &ClassId) -> Vec<&dyn BlockRenderer> {
    renderers_for(&self.block_renderers, self.hierarchy.as_ref(), class)
  }

  #[must_use]
  pub fn inline_renderers_for_class(
    &self,
    class: &ClassId,
  ) -> Vec<&dyn InlineRenderer> {
    renderers_for(&self.inline_renderers, self.hierarchy.as_ref(), class)
  }

  /// Run the listeners for `E` in priority order.
  ///
  /// Stops at the first listener returning [`Propagation::Stop`] and reports
  /// `Stop` to the caller.
  ///
  /// # Errors
  ///
  /// The first listener error aborts dispatch and is returned as is.
  pub fn dispatch<E: Event>(&self, event: &mut E) -> ListenerResult {
    let Some(listeners) = self.listeners.get(&TypeId::of::<E>()) else {
      return Ok(Propagation::Continue);
    };

    for listener in listeners {
      if listener.call(&mut *event)?.is_stopped() {
        log::trace!(
          "Propagation of {} stopped by a listener",
          std::any::type_name::<E>()
        );
        return Ok(Propagation::Stop);
      }
    }
    Ok(Propagation::Continue)
  }

  /// Try the block parsers at the cursor. The first match wins; when none
  /// matches the cursor is left where it was.
  pub fn parse_block_start(&self, cursor: &mut Cursor<'_>) -> Option<Box<dyn Node>> {
    let start = cursor.position();
    for parser in &self.block_parsers {
      if let Some(node) = parser.parse(cursor) {
        return Some(node);
      }
      cursor.set_position(start);
    }
    None
  }

  /// Split `text` into literal runs and nodes produced by inline parsers.
  #[must_use]
  pub fn parse_inline(&self, text: &str) -> Vec<Inline> {
    inline::parse(self, text)
  }

  /// Render `node` with the first applicable block renderer that accepts it.
  ///
  /// # Errors
  ///
  /// Returns [`RenderError::NoBlockRenderer`] when every renderer declined.
  pub fn render_block(&self, node: &dyn Node) -> Result<String, RenderError> {
    let class = node.class_id();
    self
      .block_renderers_for_class(&class)
      .into_iter()
      .find_map(|renderer| renderer.render(node))
      .ok_or(RenderError::NoBlockRenderer(class))
  }

  /// Render `node` with the first applicable inline renderer that accepts it.
  ///
  /// # Errors
  ///
  /// Returns [`RenderError::NoInlineRenderer`] when every renderer declined.
  pub fn render_inline(&self, node: &dyn Node) -> Result<String, RenderError> {
    let class = node.class_id();
    self
      .inline_renderers_for_class(&class)
      .into_iter()
      .find_map(|renderer| renderer.render(node))
      .ok_or(RenderError::NoInlineRenderer(class))
  }
}

impl fmt::Debug for FrozenEnvironment {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("FrozenEnvironment")
      .field("config", &self.config)
      .field(
        "extensions",
        &self.extensions.iter().map(|e| e.name()).collect::<Vec<_>>(),
      )
      .field("block_parsers", &self.block_parsers.len())
      .field("inline_parsers", &self.inline_parsers.len())
      .field("delimiter_processors", &self.delimiter_processors)
      .field("block_renderers", &self.block_renderers.len())
      .field("inline_renderers", &self.inline_renderers.len())
      .field("listeners", &self.listeners.len())
      .finish_non_exhaustive()
  }
}

fn inject_all(
  builder: &mut EnvironmentBuilder,
  environment: &EnvironmentRef,
  config: &ConfigView,
) {
  for entry in &mut builder.block_parsers {
    inject(&mut *entry.value, environment, config);
  }
  for entry in &mut builder.inline_parsers {
    inject(&mut *entry.value, environment, config);
  }
  for processor in &mut builder.delimiter_processors {
    inject(&mut **processor, environment, config);
  }
  for entry in builder.block_renderers.values_mut().flatten() {
    inject(&mut *entry.value, environment, config);
  }
  for entry in builder.inline_renderers.values_mut().flatten() {
    inject(&mut *entry.value, environment, config);
  }
  for entry in builder.listeners.values_mut().flatten() {
    inject(entry.value.injectable(), environment, config);
  }
}

fn sorted_values<T>(mut entries: Vec<Prioritized<T>>) -> Vec<T> {
  sort_by_priority(&mut entries);
  entries.into_iter().map(|entry| entry.value).collect()
}

/// Map each claimed character to the indices of the parsers to try, keeping
/// parsers that match any character in every list.
fn index_inline_parsers(
  parsers: &[Box<dyn InlineParser>],
) -> (HashMap<char, Vec<usize>>, Vec<usize>) {
  let mut by_character: HashMap<char, Vec<usize>> = HashMap::new();
  let mut any = Vec::new();

  for (idx, parser) in parsers.iter().enumerate() {
    match parser.characters() {
      Characters::Any => any.push(idx),
      Characters::Set(chars) => {
        for ch in chars {
          let slot = by_character.entry(ch).or_default();
          if !slot.contains(&idx) {
            slot.push(idx);
          }
        }
      },
    }
  }

  // Indices follow priority order, so merging and sorting restores it.
  for slot in by_character.values_mut() {
    slot.extend_from_slice(&any);
    slot.sort_unstable();
  }

  (by_character, any)
}

fn inline_character_regex(parsers: &[Box<dyn InlineParser>]) -> Regex {
  let mut characters = BTreeSet::new();
  for parser in parsers {
    match parser.characters() {
      Characters::Any => return any_character_regex(),
      Characters::Set(chars) => characters.extend(chars),
    }
  }

  if characters.is_empty() {
    return never_matching_regex();
  }

  let class: String = characters
    .iter()
    .map(|ch| regex::escape(ch.encode_utf8(&mut [0; 4])))
    .collect();
  let pattern = format!("[{class}]");
  Regex::new(&pattern).unwrap_or_else(|e| {
    log::error!("Failed to compile inline character regex '{pattern}': {e}");
    never_matching_regex()
  })
}

fn any_character_regex() -> Regex {
  Regex::new(r"(?s).").unwrap_or_else(|e| {
    log::error!("Failed to compile any-character regex: {e}");
    never_matching_regex()
  })
}

fn renderers_for<'a, R: ?Sized>(
  table: &'a RendererTable<R>,
  hierarchy: &dyn ClassHierarchy,
  class: &ClassId,
) -> Vec<&'a R> {
  let mut matching: Vec<&Prioritized<Box<R>>> = table
    .iter()
    .filter(|(key, _)| *key == class || hierarchy.is_a(class, key))
    .flat_map(|(_, entries)| entries)
    .collect();
  matching.sort_by_key(|entry| entry.key());
  matching.into_iter().map(|entry| &*entry.value).collect()
}
