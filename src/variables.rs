//! Per-run template variables
//!
//! [`VariableCollector`] reads everything a message template may refer to
//! from a [`Run`] and freezes it into a [`VariableSet`]. Collection never
//! fails: missing or unsupported data is logged and left out.

use crate::model::{AffectedFiles, ChangeEntry, Run};
use chrono::Utc;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::time::Duration;
use tracing::{debug, info};

/// Reserved variable names
pub mod keys {
    pub const STATUS: &str = "STATUS";
    pub const PRINT_FULL_ENV: &str = "PRINT_FULL_ENV";
    pub const DURATION: &str = "DURATION";
    pub const BUILD_DURATION: &str = "BUILD_DURATION";
    pub const URL: &str = "URL";
    pub const CAUSE: &str = "CAUSE";
    pub const JOB_DISPLAY_NAME: &str = "JOB_DISPLAY_NAME";
    pub const PROJECT_DISPLAY_NAME: &str = "PROJECT_DISPLAY_NAME";
    pub const BLUE_OCEAN_URL: &str = "BLUE_OCEAN_URL";
    pub const BUILD_DISPLAY_NAME: &str = "BUILD_DISPLAY_NAME";
    pub const BUILD_DESCRIPTION: &str = "BUILD_DESCRIPTION";
    pub const CHANGES: &str = "CHANGES";
    pub const CHANGES_OR_CAUSE: &str = "CHANGES_OR_CAUSE";
    pub const HIPCHAT_CHANGES: &str = "HIPCHAT_CHANGES";
    pub const HIPCHAT_CHANGES_OR_CAUSE: &str = "HIPCHAT_CHANGES_OR_CAUSE";
    pub const COMMIT_MESSAGE: &str = "COMMIT_MESSAGE";
    pub const COMMIT_MESSAGE_TEXT: &str = "COMMIT_MESSAGE_TEXT";
    pub const TEST_COUNT: &str = "TEST_COUNT";
    pub const FAILED_TEST_COUNT: &str = "FAILED_TEST_COUNT";
    pub const SKIPPED_TEST_COUNT: &str = "SKIPPED_TEST_COUNT";
    pub const SUCCESS_TEST_COUNT: &str = "SUCCESS_TEST_COUNT";
    pub const TEST_REPORT_URL: &str = "TEST_REPORT_URL";

    /// Names only the collector may set
    pub const RESERVED: &[&str] = &[
        STATUS,
        PRINT_FULL_ENV,
        DURATION,
        BUILD_DURATION,
        URL,
        CAUSE,
        JOB_DISPLAY_NAME,
        PROJECT_DISPLAY_NAME,
        BLUE_OCEAN_URL,
        BUILD_DISPLAY_NAME,
        BUILD_DESCRIPTION,
        CHANGES,
        CHANGES_OR_CAUSE,
        HIPCHAT_CHANGES,
        HIPCHAT_CHANGES_OR_CAUSE,
        COMMIT_MESSAGE,
        COMMIT_MESSAGE_TEXT,
        TEST_COUNT,
        FAILED_TEST_COUNT,
        SKIPPED_TEST_COUNT,
        SUCCESS_TEST_COUNT,
        TEST_REPORT_URL,
    ];

    pub fn is_reserved(name: &str) -> bool {
        RESERVED.contains(&name)
    }
}

const NO_CHANGES: &str = "No Changes";
const UNKNOWN_AUTHOR: &str = "unknown";

/// Immutable name/value snapshot of one run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct VariableSet(BTreeMap<String, String>);

impl VariableSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Copy of this set with `overrides` taking precedence
    pub fn merged<K, V>(&self, overrides: impl IntoIterator<Item = (K, V)>) -> VariableSet
    where
        K: Into<String>,
        V: Into<String>,
    {
        let mut values = self.0.clone();
        values.extend(overrides.into_iter().map(|(k, v)| (k.into(), v.into())));
        VariableSet(values)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for VariableSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        VariableSet(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl fmt::Display for VariableSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (key, value)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{key}={value}")?;
        }
        f.write_str("}")
    }
}

/// Change-set information as far as it could be gathered
#[derive(Debug, Clone, PartialEq, Eq)]
enum ChangeData {
    /// The run carries no change set
    NotComputed,
    /// At least one entry cannot enumerate its affected files
    Unsupported { lenient_summary: Option<String> },
    Collected {
        summary: Option<String>,
        commit_message: String,
    },
}

/// Gathers the [`VariableSet`] for a run
#[derive(Debug, Clone, Default)]
pub struct VariableCollector {
    build_server_url: Option<String>,
}

impl VariableCollector {
    pub fn new(build_server_url: Option<String>) -> Self {
        Self {
            build_server_url: build_server_url.filter(|url| !url.trim().is_empty()),
        }
    }

    /// Collect every variable for `run`.
    ///
    /// Precedence, lowest first: build variables, then environment. Reserved
    /// names are never taken from either; only the collector sets them.
    pub fn collect(&self, run: &dyn Run) -> VariableSet {
        let mut values: BTreeMap<String, String> = run
            .build_variables()
            .iter()
            .chain(run.environment())
            .filter(|(name, _)| !keys::is_reserved(name.as_str()))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();

        let url = self.absolute_url(run.url());

        if let Some(tests) = run.test_results() {
            values.insert(keys::TEST_COUNT.into(), tests.total.to_string());
            values.insert(keys::FAILED_TEST_COUNT.into(), tests.failed.to_string());
            values.insert(keys::SKIPPED_TEST_COUNT.into(), tests.skipped.to_string());
            values.insert(keys::SUCCESS_TEST_COUNT.into(), tests.passed().to_string());
            values.insert(keys::TEST_REPORT_URL.into(), format!("{url}{}", tests.url_name));
        }

        let cause = run.cause().unwrap_or_default().to_string();

        values.insert(keys::DURATION.into(), duration_string(run));
        values.insert(keys::BUILD_DURATION.into(), build_duration_string(run));
        values.insert(keys::BLUE_OCEAN_URL.into(), url.clone());
        values.insert(keys::URL.into(), url);
        values.insert(keys::CAUSE.into(), cause.clone());
        values.insert(keys::JOB_DISPLAY_NAME.into(), run.job_display_name().to_string());
        values.insert(keys::PROJECT_DISPLAY_NAME.into(), run.job_display_name().to_string());
        values.insert(keys::BUILD_DISPLAY_NAME.into(), run.display_name().to_string());
        values.insert(
            keys::BUILD_DESCRIPTION.into(),
            run.description().unwrap_or_default().to_string(),
        );

        match change_data(run) {
            ChangeData::NotComputed => {
                debug!("No change set computed for job {}", run.job_display_name());
                values.insert(keys::CHANGES.into(), NO_CHANGES.into());
                values.insert(keys::CHANGES_OR_CAUSE.into(), cause.clone());
                values.insert(keys::HIPCHAT_CHANGES.into(), NO_CHANGES.into());
                values.insert(keys::HIPCHAT_CHANGES_OR_CAUSE.into(), cause);
                values.insert(keys::COMMIT_MESSAGE.into(), String::new());
                values.insert(keys::COMMIT_MESSAGE_TEXT.into(), String::new());
            }
            ChangeData::Unsupported { lenient_summary } => {
                info!(
                    "Unable to collect the affected files for job {}",
                    run.job_display_name()
                );
                values.insert(keys::CHANGES_OR_CAUSE.into(), cause.clone());
                values.insert(
                    keys::HIPCHAT_CHANGES.into(),
                    lenient_summary.clone().unwrap_or_else(|| NO_CHANGES.into()),
                );
                values.insert(
                    keys::HIPCHAT_CHANGES_OR_CAUSE.into(),
                    lenient_summary.unwrap_or(cause),
                );
            }
            ChangeData::Collected {
                summary,
                commit_message,
            } => {
                let changes = summary.clone().unwrap_or_else(|| NO_CHANGES.into());
                let changes_or_cause = summary.unwrap_or(cause);
                values.insert(keys::CHANGES.into(), changes.clone());
                values.insert(keys::HIPCHAT_CHANGES.into(), changes);
                values.insert(keys::CHANGES_OR_CAUSE.into(), changes_or_cause.clone());
                values.insert(keys::HIPCHAT_CHANGES_OR_CAUSE.into(), changes_or_cause);
                values.insert(
                    keys::COMMIT_MESSAGE.into(),
                    handlebars::html_escape(&commit_message),
                );
                values.insert(keys::COMMIT_MESSAGE_TEXT.into(), commit_message);
            }
        }

        VariableSet(values)
    }

    fn absolute_url(&self, url: &str) -> String {
        if url.contains("://") {
            return url.to_string();
        }
        match &self.build_server_url {
            Some(base) => format!(
                "{}/{}",
                base.trim_end_matches('/'),
                url.trim_start_matches('/')
            ),
            None => url.to_string(),
        }
    }
}

fn change_data(run: &dyn Run) -> ChangeData {
    let Some(entries) = run.change_set() else {
        return ChangeData::NotComputed;
    };

    let authors: BTreeSet<&str> = entries
        .iter()
        .map(|entry| entry.author.as_deref().unwrap_or(UNKNOWN_AUTHOR))
        .collect();

    let mut changed_files = 0;
    let mut unsupported = false;
    for entry in entries {
        match entry.affected_files {
            AffectedFiles::Found(count) => changed_files += count,
            AffectedFiles::Unsupported => unsupported = true,
        }
    }

    if unsupported {
        let lenient_summary = (!authors.is_empty()).then(|| change_summary(&authors, changed_files));
        return ChangeData::Unsupported { lenient_summary };
    }

    let summary = if changed_files == 0 {
        debug!("No changes detected");
        None
    } else {
        Some(change_summary(&authors, changed_files))
    };

    ChangeData::Collected {
        summary,
        commit_message: entries.last().map(first_line).unwrap_or_default(),
    }
}

fn change_summary(authors: &BTreeSet<&str>, changed_files: usize) -> String {
    let authors: Vec<&str> = authors.iter().copied().collect();
    format!(
        "Started by changes from {} ({} file(s) changed)",
        authors.join(", "),
        changed_files
    )
}

fn first_line(entry: &ChangeEntry) -> String {
    entry.message.lines().next().unwrap_or_default().to_string()
}

fn duration_string(run: &dyn Run) -> String {
    if run.is_building() {
        format!("{} and counting", format_duration(elapsed_since_start(run)))
    } else {
        format_duration(run.duration())
    }
}

fn build_duration_string(run: &dyn Run) -> String {
    let duration = run.duration();
    if duration.is_zero() {
        format_duration(elapsed_since_start(run))
    } else {
        format_duration(duration)
    }
}

fn elapsed_since_start(run: &dyn Run) -> Duration {
    (Utc::now() - run.started_at()).to_std().unwrap_or_default()
}

/// Compact human readable time span, e.g. `2 min 5 sec` or `3.9 sec`.
///
/// Two units are shown only while the larger one is below ten and the
/// smaller one is non-zero.
pub fn format_duration(duration: Duration) -> String {
    const MINUTE: u64 = 60;
    const HOUR: u64 = 60 * MINUTE;
    const DAY: u64 = 24 * HOUR;

    let total_secs = duration.as_secs();
    let millis = duration.subsec_millis() as u64;

    let days = total_secs / DAY;
    let hours = (total_secs % DAY) / HOUR;
    let minutes = (total_secs % HOUR) / MINUTE;
    let seconds = total_secs % MINUTE;

    if days > 0 {
        two_units(days, plural(days, "day", "days"), hours, "hr")
    } else if hours > 0 {
        two_units(hours, "hr", minutes, "min")
    } else if minutes > 0 {
        two_units(minutes, "min", seconds, "sec")
    } else if seconds >= 10 {
        format!("{seconds} sec")
    } else if seconds >= 1 {
        match millis / 100 {
            0 => format!("{seconds} sec"),
            tenths => format!("{seconds}.{tenths} sec"),
        }
    } else if millis >= 100 {
        let hundredths = millis / 10;
        let text = format!("0.{hundredths:02}");
        format!("{} sec", text.trim_end_matches('0'))
    } else {
        format!("{millis} ms")
    }
}

fn two_units(big: u64, big_unit: &str, small: u64, small_unit: &str) -> String {
    if big < 10 && small != 0 {
        format!("{big} {big_unit} {small} {small_unit}")
    } else {
        format!("{big} {big_unit}")
    }
}

fn plural<'a>(count: u64, one: &'a str, many: &'a str) -> &'a str {
    if count == 1 {
        one
    } else {
        many
    }
}
