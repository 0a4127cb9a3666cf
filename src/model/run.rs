//! The orchestrator's view of a run
//!
//! The pipeline only ever reads runs through the [`Run`] trait, so any
//! orchestrator can plug in its own representation. [`RunSnapshot`] is the
//! serde-backed implementation used by the CLI and the tests.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// Terminal outcome of a build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunResult {
    Success,
    Failure,
    Unstable,
    Aborted,
    NotBuilt,
    Unknown,
}

impl RunResult {
    pub fn as_str(self) -> &'static str {
        match self {
            RunResult::Success => "SUCCESS",
            RunResult::Failure => "FAILURE",
            RunResult::Unstable => "UNSTABLE",
            RunResult::Aborted => "ABORTED",
            RunResult::NotBuilt => "NOT_BUILT",
            RunResult::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for RunResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Affected-file count of a change entry, as far as the SCM integration can tell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AffectedFiles {
    Found(usize),
    /// The source-control integration cannot enumerate affected files
    Unsupported,
}

impl Default for AffectedFiles {
    fn default() -> Self {
        AffectedFiles::Found(0)
    }
}

/// One entry of a run's change set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEntry {
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub commit_id: Option<String>,
    #[serde(default)]
    pub affected_files: AffectedFiles,
}

/// Aggregated test-result action attached to a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestSummary {
    pub total: u64,
    #[serde(default)]
    pub failed: u64,
    #[serde(default)]
    pub skipped: u64,
    /// Report path relative to the run URL
    #[serde(default = "default_report_path")]
    pub url_name: String,
}

fn default_report_path() -> String {
    "testReport/".to_string()
}

impl TestSummary {
    pub fn passed(&self) -> u64 {
        self.total.saturating_sub(self.failed.saturating_add(self.skipped))
    }
}

/// Read-only view of a run owned by the orchestrator
pub trait Run {
    /// `None` while the run is still in progress
    fn result(&self) -> Option<RunResult>;

    fn is_building(&self) -> bool {
        self.result().is_none()
    }

    fn previous_run(&self) -> Option<&dyn Run>;

    fn job_display_name(&self) -> &str;

    fn display_name(&self) -> &str;

    /// Absolute, or relative to the build server root
    fn url(&self) -> &str;

    fn started_at(&self) -> DateTime<Utc>;

    /// Zero while the run is in progress
    fn duration(&self) -> Duration;

    fn cause(&self) -> Option<&str>;

    fn description(&self) -> Option<&str>;

    /// `None` when the run has no change-set information at all
    fn change_set(&self) -> Option<&[ChangeEntry]>;

    fn test_results(&self) -> Option<&TestSummary>;

    fn build_variables(&self) -> &BTreeMap<String, String>;

    fn environment(&self) -> &BTreeMap<String, String>;
}

/// Serializable run description, e.g. read from a JSON file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RunSnapshot {
    pub result: Option<RunResult>,
    pub job_display_name: String,
    pub display_name: String,
    pub url: String,
    pub started_at: Option<DateTime<Utc>>,
    pub duration_ms: u64,
    pub cause: Option<String>,
    pub description: Option<String>,
    pub changes: Option<Vec<ChangeEntry>>,
    pub tests: Option<TestSummary>,
    pub build_variables: BTreeMap<String, String>,
    pub environment: BTreeMap<String, String>,
    pub previous: Option<Box<RunSnapshot>>,
}

impl RunSnapshot {
    pub fn new(job_display_name: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            job_display_name: job_display_name.into(),
            display_name: display_name.into(),
            ..Default::default()
        }
    }

    pub fn with_result(mut self, result: RunResult) -> Self {
        self.result = Some(result);
        self
    }

    pub fn with_previous(mut self, previous: RunSnapshot) -> Self {
        self.previous = Some(Box::new(previous));
        self
    }
}

impl Run for RunSnapshot {
    fn result(&self) -> Option<RunResult> {
        self.result
    }

    fn previous_run(&self) -> Option<&dyn Run> {
        self.previous.as_deref().map(|run| run as &dyn Run)
    }

    fn job_display_name(&self) -> &str {
        &self.job_display_name
    }

    fn display_name(&self) -> &str {
        &self.display_name
    }

    fn url(&self) -> &str {
        &self.url
    }

    fn started_at(&self) -> DateTime<Utc> {
        self.started_at.unwrap_or_else(Utc::now)
    }

    fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }

    fn cause(&self) -> Option<&str> {
        self.cause.as_deref()
    }

    fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    fn change_set(&self) -> Option<&[ChangeEntry]> {
        self.changes.as_deref()
    }

    fn test_results(&self) -> Option<&TestSummary> {
        self.tests.as_ref()
    }

    fn build_variables(&self) -> &BTreeMap<String, String> {
        &self.build_variables
    }

    fn environment(&self) -> &BTreeMap<String, String> {
        &self.environment
    }
}
