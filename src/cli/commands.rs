//! Command definitions and structures for the CLI

use crate::model::Color;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Main CLI structure
#[derive(Parser)]
#[command(name = "hipchat-notify")]
#[command(about = "Build lifecycle notifications for HipChat rooms")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Project path for project-level configuration
    #[arg(long, global = true)]
    pub project: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Send an ad-hoc message to the configured rooms
    Send(SendArgs),

    /// Feed a run lifecycle event through the notification pipeline
    Event {
        /// Lifecycle event to report
        #[arg(value_enum)]
        kind: EventKind,

        /// JSON file describing the run
        #[arg(long)]
        run: PathBuf,

        /// Print the resolved notification instead of sending it
        #[arg(long)]
        dry_run: bool,
    },

    /// Inspect configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, Clone, clap::Args)]
pub struct SendArgs {
    /// Message text; `${VAR}` references resolve against --run
    pub message: String,

    /// Message color
    #[arg(short, long)]
    pub color: Option<Color>,

    /// Alert room members (default: alert for anything but green)
    #[arg(long, conflicts_with = "no_notify")]
    pub notify: bool,

    /// Never alert room members
    #[arg(long)]
    pub no_notify: bool,

    /// Send as plain text instead of HTML
    #[arg(long)]
    pub text_format: bool,

    /// Card icon URL
    #[arg(long)]
    pub icon: Option<String>,

    /// Comma separated rooms, overrides configuration
    #[arg(short, long)]
    pub room: Option<String>,

    /// HipChat server, overrides configuration
    #[arg(long)]
    pub server: Option<String>,

    /// Auth token, overrides configuration
    #[arg(long, env = "HIPCHAT_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Credential id from the [credentials] table
    #[arg(long)]
    pub credential_id: Option<String>,

    /// Use the v2 API
    #[arg(long, conflicts_with = "v1")]
    pub v2: bool,

    /// Use the legacy v1 API
    #[arg(long)]
    pub v1: bool,

    /// Sender name for the v1 API
    #[arg(long)]
    pub send_as: Option<String>,

    /// Exit with an error when delivery fails
    #[arg(long)]
    pub fail_on_error: bool,

    /// JSON file describing a run for variable resolution
    #[arg(long)]
    pub run: Option<PathBuf>,
}

impl SendArgs {
    pub fn notify_override(&self) -> Option<bool> {
        match (self.notify, self.no_notify) {
            (true, _) => Some(true),
            (false, true) => Some(false),
            (false, false) => None,
        }
    }

    pub fn v2_override(&self) -> Option<bool> {
        match (self.v2, self.v1) {
            (true, _) => Some(true),
            (false, true) => Some(false),
            (false, false) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EventKind {
    Started,
    Completed,
}

/// Configuration inspection actions
#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show the effective configuration with secrets masked
    Show,

    /// Print the configuration file in use
    Path,
}
