//! HipChat Build Notifier Library
//!
//! Turns run lifecycle events into HipChat room notifications: classify the
//! run, pick the category settings, resolve the message template, attach an
//! optional card and publish over the v1 or v2 API.

pub mod cards;
pub mod classifier;
pub mod cli;
pub mod config;
pub mod credentials;
pub mod errors;
pub mod model;
pub mod notifications;
pub mod notifier;
pub mod publisher;
pub mod templates;
pub mod variables;

// Re-export commonly used types for convenience
pub use config::{Config, ConfigManager};
pub use errors::{NotifyError, NotifyResult};
pub use model::{Color, MessageFormat, Notification, NotificationCategory, Run, RunResult, RunSnapshot};
pub use notifier::{Notifier, NotifierSettings, RunListener, SendRequest};
pub use publisher::{ProtocolVersion, Publisher, RoomTarget};
