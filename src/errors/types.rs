//! Error types for the notification pipeline
//!
//! Every failure the pipeline can surface is a variant of [`NotifyError`],
//! grouped by the stage that produces it: classification, credential
//! resolution, delivery, template/card evaluation and configuration.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the notification pipeline
#[derive(Error, Debug)]
pub enum NotifyError {
    // Classification errors
    #[error("Unable to determine notification category for run result '{result}'")]
    InvalidState { result: String },

    // Credential errors
    #[error("No usable auth token could be resolved for server '{server}'")]
    CredentialMissing { server: String },

    // Delivery errors
    #[error("Room '{room}' rejected the notification with HTTP {code}")]
    InvalidResponseCode { room: String, code: u16 },

    #[error("Room '{room}' answered HTTP 200 without confirming the message was sent")]
    UnconfirmedDelivery { room: String },

    #[error("Transport failure while posting to room '{room}'")]
    Transport {
        room: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to build HTTP client")]
    HttpClient {
        #[source]
        source: reqwest::Error,
    },

    #[error("Invalid endpoint for server '{server}': {reason}")]
    InvalidEndpoint { server: String, reason: String },

    #[error("Failed to deliver notification to {} of {attempted} room(s)", .failures.len())]
    PublishFailed {
        attempted: usize,
        failures: Vec<RoomFailure>,
    },

    #[error("A notification message is required")]
    MessageRequired,

    // Template and card errors
    #[error("Macro evaluation failed: {message}")]
    MacroEvaluation {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    // Configuration errors
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("File I/O error for '{path}': {operation}")]
    Io {
        path: PathBuf,
        operation: String,
        #[source]
        source: std::io::Error,
    },

    #[error("TOML parsing error: {context}")]
    TomlParsing {
        context: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("JSON error: {context}")]
    Json {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}

/// A single room that could not be delivered to during a fan-out publish
#[derive(Debug)]
pub struct RoomFailure {
    pub room: String,
    pub error: NotifyError,
}

/// Convenience type alias for Results using NotifyError
pub type NotifyResult<T> = Result<T, NotifyError>;

impl NotifyError {
    /// Create a new Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            source: None,
        }
    }

    /// Create a new Config error with source
    pub fn config_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Config {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a new MacroEvaluation error with source
    pub fn macro_evaluation_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::MacroEvaluation {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a new Io error
    pub fn io(path: impl Into<PathBuf>, operation: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            operation: operation.into(),
            source,
        }
    }

    /// Whether a caller-side retry could plausibly succeed.
    ///
    /// The publisher never retries on its own; this only informs callers
    /// that implement their own retry policy.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport { .. } => true,
            Self::InvalidResponseCode { code, .. } => {
                *code >= 500 || *code == 408 || *code == 429
            }
            Self::PublishFailed { failures, .. } => {
                failures.iter().all(|failure| failure.error.is_retryable())
            }
            _ => false,
        }
    }

    /// Get the error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            Self::InvalidState { .. } => "classification",
            Self::CredentialMissing { .. } => "credentials",
            Self::InvalidResponseCode { .. }
            | Self::UnconfirmedDelivery { .. }
            | Self::PublishFailed { .. } => "delivery",
            Self::Transport { .. } | Self::HttpClient { .. } | Self::InvalidEndpoint { .. } => {
                "network"
            }
            Self::MessageRequired | Self::MacroEvaluation { .. } => "template",
            Self::Config { .. } | Self::TomlParsing { .. } => "config",
            Self::Io { .. } => "io",
            Self::Json { .. } => "serialization",
        }
    }
}
