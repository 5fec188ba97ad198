use std::{fmt, ops::Deref, str::FromStr, sync::Arc};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ConfigError;

/// Nested key/value configuration shared by every extension registered with
/// an environment.
///
/// The tree is opaque to mdkit itself: extensions agree among themselves on
/// the keys they read. Values are addressed with slash-delimited paths, so
/// `"renderer/soft_break"` reads the `soft_break` key of the `renderer` table.
///
/// # Examples
///
/// ```
/// use mdkit_config::Configuration;
/// use serde_json::json;
///
/// let config: Configuration =
///   r#"{"renderer": {"soft_break": "\n"}}"#.parse().unwrap();
///
/// assert_eq!(config.get("renderer/soft_break"), Some(&json!("\n")));
/// assert_eq!(config.get("renderer/soft_break/deeper"), None);
/// assert_eq!(config.get_or("html_input", "allow"), json!("allow"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Configuration {
  tree: Map<String, Value>,
}

impl Configuration {
  /// Create an empty configuration.
  #[must_use]
  pub fn new() -> Self {
    Self::default()
  }

  /// The whole tree, exactly as it was given to the constructor or to
  /// [`Configuration::replace`] (plus any merges since).
  #[must_use]
  pub const fn as_map(&self) -> &Map<String, Value> {
    &self.tree
  }

  /// Consume the configuration, returning the tree as a JSON object.
  #[must_use]
  pub fn into_value(self) -> Value {
    Value::Object(self.tree)
  }

  /// Look up the value at a slash-delimited path.
  ///
  /// Each segment selects a key of a table, or an index of an array when the
  /// segment is a number. A path that runs past a scalar, or names a missing
  /// key, yields `None`.
  #[must_use]
  pub fn get(&self, path: &str) -> Option<&Value> {
    let mut segments = path.split('/');
    let mut node = segments.next().and_then(|key| self.tree.get(key))?;

    for segment in segments {
      node = match node {
        Value::Object(table) => table.get(segment)?,
        Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
        _ => return None,
      };
    }

    Some(node)
  }

  /// Look up the value at `path`, falling back to `default` when any segment
  /// is absent.
  #[must_use]
  pub fn get_or(&self, path: &str, default: impl Into<Value>) -> Value {
    self.get(path).cloned().unwrap_or_else(|| default.into())
  }

  /// Replace the whole tree.
  pub fn replace(&mut self, other: Self) {
    self.tree = other.tree;
  }

  /// Deep-merge `other` on top of this configuration.
  ///
  /// Tables are merged key by key, recursively. Any other value (scalars and
  /// arrays alike) found in `other` overwrites whatever was at that path.
  pub fn merge(&mut self, other: Self) {
    for (key, value) in other.tree {
      match self.tree.get_mut(&key) {
        Some(existing) => merge_value(existing, value),
        None => {
          self.tree.insert(key, value);
        },
      }
    }
  }
}

fn merge_value(target: &mut Value, incoming: Value) {
  match (target, incoming) {
    (Value::Object(existing), Value::Object(incoming)) => {
      for (key, value) in incoming {
        match existing.get_mut(&key) {
          Some(slot) => merge_value(slot, value),
          None => {
            existing.insert(key, value);
          },
        }
      }
    },
    (slot, value) => {
      log::trace!("Overwriting configuration value {slot} with {value}");
      *slot = value;
    },
  }
}

impl From<Map<String, Value>> for Configuration {
  fn from(tree: Map<String, Value>) -> Self {
    Self { tree }
  }
}

impl TryFrom<Value> for Configuration {
  type Error = ConfigError;

  fn try_from(value: Value) -> Result<Self, Self::Error> {
    match value {
      Value::Object(tree) => Ok(Self { tree }),
      Value::Null => Err(ConfigError::NotATable("null")),
      Value::Bool(_) => Err(ConfigError::NotATable("a boolean")),
      Value::Number(_) => Err(ConfigError::NotATable("a number")),
      Value::String(_) => Err(ConfigError::NotATable("a string")),
      Value::Array(_) => Err(ConfigError::NotATable("an array")),
    }
  }
}

impl FromStr for Configuration {
  type Err = ConfigError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let value: Value = serde_json::from_str(s)?;
    Self::try_from(value)
  }
}

impl fmt::Display for Configuration {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match serde_json::to_string(&self.tree) {
      Ok(json) => f.write_str(&json),
      Err(_) => Err(fmt::Error),
    }
  }
}

/// Read-only, cheaply cloneable view of a [`Configuration`].
///
/// Handed to configuration-aware rules when an environment freezes; no
/// mutating method is reachable through it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigView(Arc<Configuration>);

impl ConfigView {
  #[must_use]
  pub fn new(config: Configuration) -> Self {
    Self(Arc::new(config))
  }
}

impl From<Configuration> for ConfigView {
  fn from(config: Configuration) -> Self {
    Self::new(config)
  }
}

impl Deref for ConfigView {
  type Target = Configuration;

  fn deref(&self) -> &Self::Target {
    &self.0
  }
}
