//! Link destination normalization.
//!
//! Every URL a renderer writes into an `href` or `src` attribute goes through
//! [`normalize_link_destination`]. The output only contains characters that
//! are safe inside markup, and percent-escapes are canonical: uppercase hex,
//! escaped only when the byte needs escaping. Normalizing an already
//! normalized destination returns it unchanged.

use crate::entities::{EntityDecoder, HtmlEntities};

const UPPER_HEX: &[u8; 16] = b"0123456789ABCDEF";

/// Bytes written as themselves. Everything else is percent-encoded.
const fn is_literal(byte: u8) -> bool {
  byte.is_ascii_alphanumeric()
    || matches!(
      byte,
      b'-'
        | b'_'
        | b'.'
        | b'~'
        | b'!'
        | b'*'
        | b'\''
        | b'('
        | b')'
        | b';'
        | b':'
        | b'@'
        | b'&'
        | b'='
        | b'+'
        | b'$'
        | b','
        | b'/'
        | b'?'
        | b'#'
        | b'['
        | b']'
    )
}

/// Reserved delimiters whose existing escapes are kept. Decoding `%2F` into
/// `/` would change how the URL is split into components.
const fn keeps_escape(byte: u8) -> bool {
  matches!(
    byte,
    b';' | b'/' | b'?' | b':' | b'@' | b'&' | b'=' | b'+' | b'$' | b',' | b'#'
  )
}

const fn hex_value(byte: u8) -> Option<u8> {
  match byte {
    b'0'..=b'9' => Some(byte - b'0'),
    b'a'..=b'f' => Some(byte - b'a' + 10),
    b'A'..=b'F' => Some(byte - b'A' + 10),
    _ => None,
  }
}

/// Decode the `%XX` triplet starting at `bytes[0]`, if there is one.
fn escaped_byte(bytes: &[u8]) -> Option<u8> {
  match bytes {
    [b'%', high, low, ..] => Some((hex_value(*high)? << 4) | hex_value(*low)?),
    _ => None,
  }
}

fn push_escape(out: &mut String, byte: u8) {
  out.push('%');
  out.push(char::from(UPPER_HEX[usize::from(byte >> 4)]));
  out.push(char::from(UPPER_HEX[usize::from(byte & 0x0F)]));
}

fn push_byte(out: &mut String, byte: u8) {
  if is_literal(byte) {
    out.push(char::from(byte));
  } else {
    push_escape(out, byte);
  }
}

/// Normalize a raw link destination into its canonical percent-encoded form.
///
/// HTML character references are decoded first (once, not recursively). The
/// decoded text is then walked byte by byte:
///
/// - a valid `%XX` escape is decoded; reserved delimiters keep their
///   (uppercased) escape, any other byte is re-encoded as if it had been
///   written literally
/// - safe ASCII is copied through
/// - anything else, including control characters, space, a `%` that does not
///   start a valid escape, and every byte of a multi-byte character, becomes
///   `%` followed by two uppercase hex digits
///
/// # Examples
///
/// ```
/// use mdkit_utils::normalize_link_destination;
///
/// assert_eq!(normalize_link_destination("/my uri"), "/my%20uri");
/// assert_eq!(normalize_link_destination("%21"), "!");
/// assert_eq!(normalize_link_destination("%2b"), "%2B");
/// assert_eq!(normalize_link_destination("%"), "%25");
/// ```
#[must_use]
pub fn normalize_link_destination(raw: &str) -> String {
  normalize_link_destination_with(raw, &HtmlEntities)
}

/// Same as [`normalize_link_destination`], with a caller-supplied entity
/// decoding step.
#[must_use]
pub fn normalize_link_destination_with<D>(raw: &str, decoder: &D) -> String
where
  D: EntityDecoder + ?Sized,
{
  let decoded = decoder.decode(raw);
  let bytes = decoded.as_bytes();

  if bytes.iter().copied().all(is_literal) {
    return decoded.into_owned();
  }

  let mut out = String::with_capacity(bytes.len() + bytes.len() / 2);
  let mut pos = 0;

  while pos < bytes.len() {
    if let Some(byte) = escaped_byte(&bytes[pos..]) {
      if keeps_escape(byte) {
        push_escape(&mut out, byte);
      } else {
        push_byte(&mut out, byte);
      }
      pos += 3;
    } else {
      push_byte(&mut out, bytes[pos]);
      pos += 1;
    }
  }

  out
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::entities::Verbatim;

  fn assert_normalizes(cases: &[(&str, &str)]) {
    for (input, expected) in cases {
      assert_eq!(
        normalize_link_destination(input),
        *expected,
        "normalizing {input:?}"
      );
    }
  }

  #[test]
  fn test_literal_characters() {
    assert_normalizes(&[
      ("(foo)", "(foo)"),
      ("~", "~"),
      ("!", "!"),
      ("@", "@"),
      ("#", "#"),
      ("$", "$"),
      ("&", "&"),
      ("*", "*"),
      ("(", "("),
      (")", ")"),
      ("-", "-"),
      ("_", "_"),
      ("=", "="),
      ("+", "+"),
      ("[", "["),
      ("]", "]"),
      (";", ";"),
      ("'", "'"),
      (":", ":"),
      (",", ","),
      (".", "."),
      ("/", "/"),
      ("?", "?"),
    ]);
  }

  #[test]
  fn test_escaped_characters() {
    assert_normalizes(&[
      ("/my uri", "/my%20uri"),
      ("`", "%60"),
      ("%", "%25"),
      ("^", "%5E"),
      ("{", "%7B"),
      ("}", "%7D"),
      ("\\", "%5C"),
      ("|", "%7C"),
      ("\"", "%22"),
      ("<", "%3C"),
      (">", "%3E"),
      ("\u{7f}", "%7F"),
    ]);
  }

  #[test]
  fn test_existing_escapes_of_unreserved_bytes_are_decoded() {
    assert_normalizes(&[
      ("%21", "!"),
      ("%27", "'"),
      ("%2A", "*"),
      ("%2D", "-"),
      ("%2E", "."),
      ("%5F", "_"),
      ("%7E", "~"),
      ("http://example.com/a%62%63", "http://example.com/abc"),
    ]);
  }

  #[test]
  fn test_existing_escapes_of_reserved_bytes_are_kept() {
    assert_normalizes(&[
      ("%23", "%23"),
      ("%24", "%24"),
      ("%26", "%26"),
      ("%2B", "%2B"),
      ("%2C", "%2C"),
      ("%2F", "%2F"),
      ("%3A", "%3A"),
      ("%3B", "%3B"),
      ("%3D", "%3D"),
      ("%3F", "%3F"),
      ("%40", "%40"),
      ("http://example.com/a%62%63%2fd%3Fe", "http://example.com/abc%2Fd%3Fe"),
    ]);
  }

  #[test]
  fn test_escaped_percent_stays_escaped() {
    assert_normalizes(&[("%25", "%25"), ("%2541", "%2541"), ("100%", "100%25")]);
  }

  #[test]
  fn test_malformed_escapes() {
    assert_normalizes(&[
      ("%G1", "%25G1"),
      ("%4", "%254"),
      ("a%", "a%25"),
      ("%%41", "%25A"),
    ]);
  }

  #[test]
  fn test_control_characters() {
    assert_normalizes(&[
      ("java%0ascript:alert(\"XSS\")", "java%0Ascript:alert(%22XSS%22)"),
      ("java%0Ascript:alert(\"XSS\")", "java%0Ascript:alert(%22XSS%22)"),
      ("java\nscript:alert('XSS')", "java%0Ascript:alert('XSS')"),
      ("tab\there", "tab%09here"),
    ]);
  }

  #[test]
  fn test_entities_are_decoded_once() {
    assert_normalizes(&[
      (
        "javascript&amp;colon;alert%28&#039;XSS&#039;%29",
        "javascript&colon;alert('XSS')",
      ),
      ("/url?a=1&amp;b=2", "/url?a=1&b=2"),
      ("&quot;quoted&quot;", "%22quoted%22"),
    ]);
  }

  #[test]
  fn test_multibyte_characters() {
    assert_normalizes(&[
      (
        "http://ko.wikipedia.org/wiki/위키백과:대문",
        "http://ko.wikipedia.org/wiki/%EC%9C%84%ED%82%A4%EB%B0%B1%EA%B3%BC:%EB%8C%80%EB%AC%B8",
      ),
      (
        "http://ko.wikipedia.org/wiki/%EC%9C%84%ED%82%A4%EB%B0%B1%EA%B3%BC:%EB%8C%80%EB%AC%B8",
        "http://ko.wikipedia.org/wiki/%EC%9C%84%ED%82%A4%EB%B0%B1%EA%B3%BC:%EB%8C%80%EB%AC%B8",
      ),
      ("ä", "%C3%A4"),
      ("%c3%a4", "%C3%A4"),
    ]);
  }

  #[test]
  fn test_already_safe_urls_pass_through() {
    assert_normalizes(&[
      (
        "https://en.wikipedia.org/wiki/Markdown#CommonMark",
        "https://en.wikipedia.org/wiki/Markdown#CommonMark",
      ),
      (
        "https://img.shields.io/badge/help-%23hoaproject-ff0066.svg",
        "https://img.shields.io/badge/help-%23hoaproject-ff0066.svg",
      ),
      ("", ""),
    ]);
  }

  #[test]
  fn test_custom_decoder() {
    assert_eq!(
      normalize_link_destination_with("a&amp;b c", &Verbatim),
      "a&amp;b%20c"
    );
  }
}
