//! Splitting a run of text into literal text and inline nodes.
use crate::{cursor::Cursor, environment::FrozenEnvironment, node::Node};

/// One piece of parsed inline content.
#[derive(Debug)]
pub enum Inline {
  /// Literal text no parser claimed. Adjacent runs are merged.
  Text(String),
  Node(Box<dyn Node>),
}

impl Inline {
  #[must_use]
  pub fn as_text(&self) -> Option<&str> {
    match self {
      Self::Text(text) => Some(text),
      Self::Node(_) => None,
    }
  }

  #[must_use]
  pub fn as_node(&self) -> Option<&dyn Node> {
    match self {
      Self::Text(_) => None,
      Self::Node(node) => Some(&**node),
    }
  }
}

pub(crate) fn parse(environment: &FrozenEnvironment, text: &str) -> Vec<Inline> {
  let mut cursor = Cursor::new(text);
  let mut inlines = Vec::new();

  while let Some(ch) = cursor.peek() {
    let start = cursor.position();

    let node = environment
      .inline_parsers_iter(ch)
      .find_map(|parser| {
        let parsed = parser.parse(&mut cursor);
        if parsed.is_some() && cursor.position() > start {
          return parsed;
        }
        if parsed.is_some() {
          log::warn!(
            "Inline parser matched '{ch}' at byte {start} without consuming \
             input, ignoring the match"
          );
        }
        cursor.set_position(start);
        None
      });

    if let Some(node) = node {
      inlines.push(Inline::Node(node));
      continue;
    }

    // Nothing matched here. Take this character literally, along with
    // everything up to the next character some parser could start on.
    cursor.advance();
    let rest = cursor.rest();
    let run = environment
      .inline_parser_character_regex()
      .find(rest)
      .map_or(rest.len(), |found| found.start());
    cursor.set_position(cursor.position() + run);

    push_text(&mut inlines, text.get(start..cursor.position()).unwrap_or_default());
  }

  inlines
}

fn push_text(inlines: &mut Vec<Inline>, text: &str) {
  if let Some(Inline::Text(last)) = inlines.last_mut() {
    last.push_str(text);
  } else {
    inlines.push(Inline::Text(text.to_owned()));
  }
}
