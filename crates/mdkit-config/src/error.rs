use thiserror::Error;

/// Error type for mdkit-config operations
#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("Failed to parse configuration: {0}")]
  Parse(#[from] serde_json::Error),

  #[error("Configuration root must be a table, found {0}")]
  NotATable(&'static str),
}
