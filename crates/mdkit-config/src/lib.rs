pub mod config;
pub mod error;

pub use config::{ConfigView, Configuration};
pub use error::ConfigError;
pub use serde_json::{Map, Value};
