//! Command handlers for all CLI operations

use super::commands::SendArgs;
use super::{CliContext, Commands, ConfigAction, EventKind};
use crate::classifier::classify_run;
use crate::model::{NotificationCategory, Run, RunSnapshot};
use crate::notifier::{Notifier, RunListener, SendRequest};
use crate::publisher::{v2, PublishReport};
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Routes parsed commands to the notification pipeline
pub struct CommandHandler {
    context: CliContext,
}

impl CommandHandler {
    pub fn new(context: CliContext) -> Self {
        Self { context }
    }

    /// Route commands to their appropriate handlers
    pub fn handle_command(&self, command: Commands) -> Result<()> {
        match command {
            Commands::Send(args) => self.handle_send(args),
            Commands::Event { kind, run, dry_run } => self.handle_event(kind, &run, dry_run),
            Commands::Config { action } => self.handle_config(action),
        }
    }

    fn notifier(&self) -> Result<Notifier> {
        Notifier::from_config(self.context.config_manager.config())
            .context("Failed to set up the notification pipeline")
    }

    fn handle_send(&self, args: SendArgs) -> Result<()> {
        let run = args.run.as_deref().map(load_run).transpose()?;
        let request = SendRequest {
            message: args.message.clone(),
            color: args.color,
            notify: args.notify_override(),
            text_format: args.text_format,
            icon: args.icon.clone(),
            room: args.room.clone(),
            server: args.server.clone(),
            token: args.token.clone(),
            credential_id: args.credential_id.clone(),
            v2_enabled: args.v2_override(),
            send_as: args.send_as.clone(),
            fail_on_error: args.fail_on_error.then_some(true),
        };

        let notifier = self.notifier()?;
        let report = notifier
            .send_message(&request, run.as_ref().map(|run| run as &dyn Run))
            .context("Failed to send HipChat message")?;
        print_report(report.as_ref());
        Ok(())
    }

    fn handle_event(&self, kind: EventKind, run_path: &Path, dry_run: bool) -> Result<()> {
        let run = load_run(run_path)?;
        let notifier = self.notifier()?;

        if dry_run {
            let category = match kind {
                EventKind::Started => NotificationCategory::Started,
                EventKind::Completed => classify_run(&run)?,
            };
            println!("Category: {category}");
            match notifier.prepare(&run, category)? {
                Some(notification) => {
                    println!("Dry run - would send notification:");
                    println!("{}", serde_json::to_string_pretty(&v2::request_body(&notification))?);
                }
                None => println!("Notifications for {category} are disabled"),
            }
            return Ok(());
        }

        match kind {
            EventKind::Started => notifier.on_run_started(&run),
            EventKind::Completed => notifier.on_run_completed(&run),
        }
        .context("Failed to notify HipChat")?;
        Ok(())
    }

    fn handle_config(&self, action: ConfigAction) -> Result<()> {
        let config_manager = &self.context.config_manager;
        match action {
            ConfigAction::Show => {
                let config = config_manager.config().redacted();
                println!("{}", toml::to_string_pretty(&config)?);
            }
            ConfigAction::Path => match config_manager.config_path() {
                Some(path) => println!("{}", path.display()),
                None => println!("No configuration file found, using built-in defaults"),
            },
        }
        Ok(())
    }
}

fn load_run(path: &Path) -> Result<RunSnapshot> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read run file {}", path.display()))?;
    let run: RunSnapshot = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse run file {}", path.display()))?;
    debug!("Loaded run {} - {}", run.job_display_name, run.display_name);
    Ok(run)
}

fn print_report(report: Option<&PublishReport>) {
    match report {
        Some(report) if !report.delivered.is_empty() => {
            println!("Message sent to {}", report.delivered.join(", "));
        }
        Some(_) => println!("No rooms configured, nothing sent"),
        None => println!("Nothing sent"),
    }
}
