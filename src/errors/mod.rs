//! Centralized error handling module
//!
//! Typed errors for every stage of the notification pipeline. The CLI
//! converts them into `anyhow::Error` at the process boundary.

pub mod types;

pub use types::{NotifyError, NotifyResult, RoomFailure};

impl From<serde_json::Error> for NotifyError {
    fn from(err: serde_json::Error) -> Self {
        let context = if err.is_syntax() || err.is_eof() {
            format!("JSON syntax error at line {} column {}", err.line(), err.column())
        } else if err.is_data() {
            "JSON data error".to_string()
        } else {
            "JSON serialization error".to_string()
        };
        NotifyError::Json { context, source: err }
    }
}

impl From<toml::de::Error> for NotifyError {
    fn from(err: toml::de::Error) -> Self {
        NotifyError::TomlParsing {
            context: err.message().to_string(),
            source: err,
        }
    }
}
