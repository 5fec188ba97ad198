/// A read position over a line or run of text, shared by block and inline
/// parser rules.
///
/// Positions are byte offsets that always sit on a character boundary. Rules
/// may move the cursor freely; when a rule does not match, the caller puts the
/// cursor back where it was.
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
  text: &'a str,
  pos:  usize,
}

impl<'a> Cursor<'a> {
  #[must_use]
  pub const fn new(text: &'a str) -> Self {
    Self { text, pos: 0 }
  }

  /// The full text the cursor runs over.
  #[must_use]
  pub const fn text(&self) -> &'a str {
    self.text
  }

  #[must_use]
  pub const fn position(&self) -> usize {
    self.pos
  }

  /// Move to `pos`, typically one returned by [`Cursor::position`] earlier.
  ///
  /// Positions past the end or inside a multi-byte character are ignored.
  pub fn set_position(&mut self, pos: usize) {
    if self.text.is_char_boundary(pos) {
      self.pos = pos;
    }
  }

  #[must_use]
  pub fn rest(&self) -> &'a str {
    self.text.get(self.pos..).unwrap_or_default()
  }

  #[must_use]
  pub fn is_at_end(&self) -> bool {
    self.pos >= self.text.len()
  }

  #[must_use]
  pub fn peek(&self) -> Option<char> {
    self.rest().chars().next()
  }

  /// Consume one character and return it.
  pub fn advance(&mut self) -> Option<char> {
    let ch = self.peek()?;
    self.pos += ch.len_utf8();
    Some(ch)
  }

  /// Consume `prefix` if the remaining text starts with it.
  pub fn eat(&mut self, prefix: &str) -> bool {
    if self.rest().starts_with(prefix) {
      self.pos += prefix.len();
      true
    } else {
      false
    }
  }

  /// Consume characters while `pred` holds, returning what was consumed.
  pub fn take_while(&mut self, mut pred: impl FnMut(char) -> bool) -> &'a str {
    let rest = self.rest();
    let len = rest
      .char_indices()
      .find(|&(_, ch)| !pred(ch))
      .map_or(rest.len(), |(idx, _)| idx);
    self.pos += len;
    rest.get(..len).unwrap_or_default()
  }
}

#[cfg(test)]
mod tests {
  use super::Cursor;

  #[test]
  fn test_advance_over_multibyte() {
    let mut cursor = Cursor::new("añb");
    assert_eq!(cursor.advance(), Some('a'));
    assert_eq!(cursor.advance(), Some('ñ'));
    assert_eq!(cursor.position(), 3);
    assert_eq!(cursor.rest(), "b");
    assert_eq!(cursor.advance(), Some('b'));
    assert_eq!(cursor.advance(), None);
    assert!(cursor.is_at_end());
  }

  #[test]
  fn test_eat_and_take_while() {
    let mut cursor = Cursor::new("**strong** text");
    assert!(cursor.eat("**"));
    assert!(!cursor.eat("**"));
    assert_eq!(cursor.take_while(|c| c != '*'), "strong");
    assert_eq!(cursor.take_while(|c| c == '*'), "**");
    assert_eq!(cursor.take_while(|_| true), " text");
    assert!(cursor.is_at_end());
  }

  #[test]
  fn test_set_position_ignores_invalid_offsets() {
    let mut cursor = Cursor::new("ñx");
    cursor.set_position(1);
    assert_eq!(cursor.position(), 0);
    cursor.set_position(99);
    assert_eq!(cursor.position(), 0);
    cursor.set_position(2);
    assert_eq!(cursor.peek(), Some('x'));
  }
}
