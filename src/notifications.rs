//! Per-category notification settings
//!
//! A [`NotificationTable`] holds at most one [`NotificationConfig`] per
//! category. A category that is absent or disabled is not notified.

use crate::errors::{NotifyError, NotifyResult};
use crate::model::{Color, MessageFormat, NotificationCategory};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Settings for one notification category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationConfig {
    pub category: NotificationCategory,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub notify: bool,
    /// Plain text instead of HTML
    #[serde(default)]
    pub text_format: bool,
    pub color: Color,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    /// Blank means the built-in template for the category
    #[serde(default)]
    pub message_template: String,
}

fn default_enabled() -> bool {
    true
}

impl NotificationConfig {
    /// Built-in settings used when configuration does not mention a category
    pub fn default_for(category: NotificationCategory) -> Self {
        let (enabled, notify, color) = match category {
            NotificationCategory::Started => (false, false, Color::Green),
            NotificationCategory::Success => (false, false, Color::Green),
            NotificationCategory::BackToNormal => (true, false, Color::Green),
            NotificationCategory::Failure => (true, true, Color::Red),
            NotificationCategory::Unstable => (true, true, Color::Yellow),
            NotificationCategory::Aborted => (true, false, Color::Gray),
            NotificationCategory::NotBuilt => (true, false, Color::Gray),
        };
        Self {
            category,
            enabled,
            notify,
            text_format: false,
            color,
            icon: None,
            message_template: String::new(),
        }
    }

    pub fn format(&self) -> MessageFormat {
        MessageFormat::from_text_flag(self.text_format)
    }
}

/// Notification settings keyed by category
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationTable {
    entries: BTreeMap<NotificationCategory, NotificationConfig>,
}

impl NotificationTable {
    /// Build a table from explicit entries only; duplicate categories are rejected
    pub fn from_entries(entries: impl IntoIterator<Item = NotificationConfig>) -> NotifyResult<Self> {
        let mut table = BTreeMap::new();
        for entry in entries {
            let category = entry.category;
            if table.insert(category, entry).is_some() {
                return Err(NotifyError::config(format!(
                    "Duplicate notification entry for category {category}"
                )));
            }
        }
        Ok(Self { entries: table })
    }

    /// Explicit entries layered over the built-in defaults
    pub fn with_defaults(entries: impl IntoIterator<Item = NotificationConfig>) -> NotifyResult<Self> {
        let explicit = Self::from_entries(entries)?;
        let mut table: BTreeMap<_, _> = NotificationCategory::ALL
            .into_iter()
            .map(|category| (category, NotificationConfig::default_for(category)))
            .collect();
        table.extend(explicit.entries);
        Ok(Self { entries: table })
    }

    /// The enabled settings for `category`, if any
    pub fn select(&self, category: NotificationCategory) -> Option<&NotificationConfig> {
        self.entries.get(&category).filter(|config| config.enabled)
    }

    pub fn iter(&self) -> impl Iterator<Item = &NotificationConfig> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for NotificationTable {
    fn default() -> Self {
        Self {
            entries: NotificationCategory::ALL
                .into_iter()
                .map(|category| (category, NotificationConfig::default_for(category)))
                .collect(),
        }
    }
}
