//! Helpers a renderer needs around link and image destinations.
//!
//! - [`url`]: canonical percent-encoding of a raw destination, safe to embed
//!   in generated markup and idempotent on already-encoded URLs.
//! - [`entities`]: the HTML character reference decoding step that runs
//!   before encoding.
pub mod entities;
pub mod url;

// Re-export commonly used utilities
pub use entities::{EntityDecoder, HtmlEntities};
pub use url::{normalize_link_destination, normalize_link_destination_with};
