use crate::{cursor::Cursor, inject::Injectable, node::Node};

/// A rule recognizing the start of a block-level construct.
///
/// Block parsers are tried in priority order at the start of every line; the
/// first one returning a node wins. A parser that returns `None` may leave
/// the cursor anywhere, the caller rewinds it.
pub trait BlockParser: Injectable + Send + Sync {
  fn parse(&self, cursor: &mut Cursor<'_>) -> Option<Box<dyn Node>>;
}

/// The characters an inline parser can start matching on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Characters {
  /// Tried at every position.
  Any,
  /// Only tried when the current character is one of these.
  Set(Vec<char>),
}

impl Characters {
  #[must_use]
  pub fn one(ch: char) -> Self {
    Self::Set(vec![ch])
  }
}

impl From<char> for Characters {
  fn from(ch: char) -> Self {
    Self::one(ch)
  }
}

impl<const N: usize> From<[char; N]> for Characters {
  fn from(chars: [char; N]) -> Self {
    Self::Set(chars.to_vec())
  }
}

/// A rule recognizing an inline construct.
pub trait InlineParser: Injectable + Send + Sync {
  /// Leading characters this parser is dispatched on. Read once, when the
  /// environment freezes.
  fn characters(&self) -> Characters;

  /// Try to parse at the cursor, which sits on one of [`Self::characters`].
  /// On a match the cursor must have moved past the consumed text.
  fn parse(&self, cursor: &mut Cursor<'_>) -> Option<Box<dyn Node>>;
}
