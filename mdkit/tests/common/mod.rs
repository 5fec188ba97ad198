#![allow(dead_code, reason = "Not every test file uses every probe")]
//! Probe rules that record when they are called, so tests can observe
//! dispatch order without comparing trait objects.
use std::{
  any::Any,
  sync::{Arc, Mutex, PoisonError},
};

use mdkit::{
  BlockParser,
  BlockRenderer,
  Characters,
  ClassId,
  Cursor,
  DelimiterProcessor,
  Injectable,
  InlineParser,
  InlineRenderer,
  Node,
};

/// Shared call log.
#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<&'static str>>>);

impl CallLog {
  pub fn push(&self, label: &'static str) {
    self.0.lock().unwrap_or_else(PoisonError::into_inner).push(label);
  }

  pub fn entries(&self) -> Vec<&'static str> {
    self.0.lock().unwrap_or_else(PoisonError::into_inner).clone()
  }

  pub fn clear(&self) {
    self.0.lock().unwrap_or_else(PoisonError::into_inner).clear();
  }
}

/// A node carrying the label of the rule that produced it.
#[derive(Debug)]
pub struct Probe {
  pub class: ClassId,
  pub label: &'static str,
}

impl Probe {
  pub fn new(class: impl Into<ClassId>, label: &'static str) -> Self {
    Self {
      class: class.into(),
      label,
    }
  }
}

impl Node for Probe {
  fn class_id(&self) -> ClassId {
    self.class.clone()
  }

  fn as_any(&self) -> &dyn Any {
    self
  }
}

/// Block parser that always consumes one character, and only reports a match
/// when `matches` is set.
pub struct ProbeBlockParser {
  pub label:   &'static str,
  pub log:     CallLog,
  pub matches: bool,
}

impl ProbeBlockParser {
  pub fn new(label: &'static str, log: &CallLog) -> Self {
    Self {
      label,
      log: log.clone(),
      matches: false,
    }
  }

  pub fn matching(label: &'static str, log: &CallLog) -> Self {
    Self {
      matches: true,
      ..Self::new(label, log)
    }
  }
}

impl Injectable for ProbeBlockParser {}

impl BlockParser for ProbeBlockParser {
  fn parse(&self, cursor: &mut Cursor<'_>) -> Option<Box<dyn Node>> {
    self.log.push(self.label);
    cursor.advance();
    self
      .matches
      .then(|| Box::new(Probe::new("block", self.label)) as Box<dyn Node>)
  }
}

/// Inline parser matching `token` when the text at the cursor starts with it.
pub struct ProbeInlineParser {
  pub label:      &'static str,
  pub log:        CallLog,
  pub characters: Characters,
  pub token:      Option<&'static str>,
}

impl ProbeInlineParser {
  pub fn new(
    label: &'static str,
    characters: impl Into<Characters>,
    log: &CallLog,
  ) -> Self {
    Self {
      label,
      log: log.clone(),
      characters: characters.into(),
      token: None,
    }
  }

  pub fn any(label: &'static str, log: &CallLog) -> Self {
    Self {
      characters: Characters::Any,
      ..Self::new(label, '\0', log)
    }
  }

  pub fn matching(mut self, token: &'static str) -> Self {
    self.token = Some(token);
    self
  }
}

impl Injectable for ProbeInlineParser {}

impl InlineParser for ProbeInlineParser {
  fn characters(&self) -> Characters {
    self.characters.clone()
  }

  fn parse(&self, cursor: &mut Cursor<'_>) -> Option<Box<dyn Node>> {
    self.log.push(self.label);
    let token = self.token?;
    cursor
      .eat(token)
      .then(|| Box::new(Probe::new("inline", self.label)) as Box<dyn Node>)
  }
}

/// Renderer for both blocks and inlines that logs every call and renders
/// `label` when it accepts the node.
pub struct ProbeRenderer {
  pub label:  &'static str,
  pub log:    CallLog,
  pub accept: bool,
}

impl ProbeRenderer {
  pub fn accepting(label: &'static str, log: &CallLog) -> Self {
    Self {
      label,
      log: log.clone(),
      accept: true,
    }
  }

  pub fn declining(label: &'static str, log: &CallLog) -> Self {
    Self {
      accept: false,
      ..Self::accepting(label, log)
    }
  }

  fn render_node(&self) -> Option<String> {
    self.log.push(self.label);
    self.accept.then(|| self.label.to_owned())
  }
}

impl Injectable for ProbeRenderer {}

impl BlockRenderer for ProbeRenderer {
  fn render(&self, _node: &dyn Node) -> Option<String> {
    self.render_node()
  }
}

impl InlineRenderer for ProbeRenderer {
  fn render(&self, _node: &dyn Node) -> Option<String> {
    self.render_node()
  }
}

/// Delimiter processor told apart by its minimum run length.
pub struct ProbeDelimiter {
  pub opening:    char,
  pub min_length: usize,
}

impl Injectable for ProbeDelimiter {}

impl DelimiterProcessor for ProbeDelimiter {
  fn opening_character(&self) -> char {
    self.opening
  }

  fn min_length(&self) -> usize {
    self.min_length
  }

  fn delimiter_use(&self, opener_len: usize, closer_len: usize) -> usize {
    if opener_len >= 2 && closer_len >= 2 { 2 } else { 1 }
  }
}

/// Render every block renderer for `class` and collect the labels of those
/// that accept, in dispatch order.
pub fn block_renderer_labels(
  renderers: &[&dyn BlockRenderer],
  node: &dyn Node,
) -> Vec<String> {
  renderers
    .iter()
    .filter_map(|renderer| renderer.render(node))
    .collect()
}

pub fn inline_renderer_labels(
  renderers: &[&dyn InlineRenderer],
  node: &dyn Node,
) -> Vec<String> {
  renderers
    .iter()
    .filter_map(|renderer| renderer.render(node))
    .collect()
}
