use std::collections::HashMap;

use crate::inject::Injectable;

/// Pairs runs of a delimiter character, as used by emphasis-like constructs
/// (`*`, `_`, `~`).
pub trait DelimiterProcessor: Injectable + Send + Sync {
  fn opening_character(&self) -> char;

  fn closing_character(&self) -> char {
    self.opening_character()
  }

  /// Shortest run of delimiters that can open or close.
  fn min_length(&self) -> usize {
    1
  }

  /// How many delimiters to consume from an opener and closer run of the
  /// given lengths. Zero means the runs do not pair.
  fn delimiter_use(&self, opener_len: usize, closer_len: usize) -> usize;
}

/// Delimiter processors indexed by opening character.
///
/// Only one processor per opening character is meaningful, so the last one
/// registered for a character replaces earlier ones.
#[derive(Default)]
pub struct DelimiterProcessors {
  by_opening: HashMap<char, Box<dyn DelimiterProcessor>>,
}

impl DelimiterProcessors {
  pub(crate) fn insert(&mut self, processor: Box<dyn DelimiterProcessor>) {
    let ch = processor.opening_character();
    if self.by_opening.insert(ch, processor).is_some() {
      log::debug!("Delimiter processor for '{ch}' replaced a previous one");
    }
  }

  #[must_use]
  pub fn get(&self, opening: char) -> Option<&dyn DelimiterProcessor> {
    self.by_opening.get(&opening).map(|processor| &**processor)
  }

  #[must_use]
  pub fn contains(&self, opening: char) -> bool {
    self.by_opening.contains_key(&opening)
  }

  /// Opening characters with a processor, in no particular order.
  pub fn characters(&self) -> impl Iterator<Item = char> + '_ {
    self.by_opening.keys().copied()
  }

  #[must_use]
  pub fn len(&self) -> usize {
    self.by_opening.len()
  }

  #[must_use]
  pub fn is_empty(&self) -> bool {
    self.by_opening.is_empty()
  }
}

impl std::fmt::Debug for DelimiterProcessors {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_set().entries(self.by_opening.keys()).finish()
  }
}
