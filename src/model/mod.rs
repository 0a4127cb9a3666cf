//! Domain types shared by every stage of the pipeline

pub mod category;
pub mod notification;
pub mod run;

pub use category::{status_text, NotificationCategory};
pub use notification::{AttributeStyle, Card, CardAttribute, Color, MessageFormat, Notification};
pub use run::{AffectedFiles, ChangeEntry, Run, RunResult, RunSnapshot, TestSummary};
