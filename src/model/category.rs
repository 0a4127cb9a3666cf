use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Classified notification type for a lifecycle event
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationCategory {
    Started,
    Success,
    Failure,
    Unstable,
    Aborted,
    NotBuilt,
    BackToNormal,
}

impl NotificationCategory {
    pub const ALL: [NotificationCategory; 7] = [
        NotificationCategory::Started,
        NotificationCategory::Success,
        NotificationCategory::Failure,
        NotificationCategory::Unstable,
        NotificationCategory::Aborted,
        NotificationCategory::NotBuilt,
        NotificationCategory::BackToNormal,
    ];

    /// Only `Started` uses the start-type default template
    pub fn is_start_type(self) -> bool {
        matches!(self, NotificationCategory::Started)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            NotificationCategory::Started => "STARTED",
            NotificationCategory::Success => "SUCCESS",
            NotificationCategory::Failure => "FAILURE",
            NotificationCategory::Unstable => "UNSTABLE",
            NotificationCategory::Aborted => "ABORTED",
            NotificationCategory::NotBuilt => "NOT_BUILT",
            NotificationCategory::BackToNormal => "BACK_TO_NORMAL",
        }
    }
}

/// Human readable status for a category, exposed to templates as `STATUS`
pub fn status_text(category: NotificationCategory) -> &'static str {
    match category {
        NotificationCategory::Started => "Starting...",
        NotificationCategory::Success => "Success",
        NotificationCategory::Failure => "FAILURE",
        NotificationCategory::Unstable => "Unstable",
        NotificationCategory::Aborted => "Aborted",
        NotificationCategory::NotBuilt => "Not built",
        NotificationCategory::BackToNormal => "Back to normal",
    }
}

impl fmt::Display for NotificationCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NotificationCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace('-', "_");
        NotificationCategory::ALL
            .into_iter()
            .find(|category| category.as_str() == normalized)
            .ok_or_else(|| format!("unknown notification category '{s}'"))
    }
}
