//! CLI module providing command-line interface functionality
//!
//! This module handles argument parsing and routing to the handlers.

pub mod commands;
pub mod context;
pub mod handlers;

use anyhow::Result;
use clap::Parser;

pub use commands::{Cli, Commands, ConfigAction, EventKind};
pub use context::CliContext;
pub use handlers::CommandHandler;

/// Main CLI application
pub struct CliApp;

impl CliApp {
    /// Parse command line arguments and execute the requested command
    pub fn run() -> Result<()> {
        let cli = Cli::parse();

        let context = CliContext::new(cli.project.clone(), cli.verbose)?;
        context.init_logging()?;

        let handler = CommandHandler::new(context);
        handler.handle_command(cli.command)
    }
}
