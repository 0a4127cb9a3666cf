//! CLI Context for dependency injection and shared state
//!
//! Resolves the configuration once and hands it to the command handlers.

use crate::config::ConfigManager;
use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;

/// CLI execution context containing shared dependencies and configuration
#[derive(Clone)]
pub struct CliContext {
    pub project_path: Option<PathBuf>,
    pub verbose: bool,
    pub config_manager: Arc<ConfigManager>,
}

impl CliContext {
    /// Create a new CLI context with the specified project path and verbosity
    pub fn new(project_path: Option<PathBuf>, verbose: bool) -> Result<Self> {
        let resolved_project_path = Self::resolve_project_path(project_path);
        let config_manager = Arc::new(ConfigManager::new(resolved_project_path.clone())?);

        Ok(Self {
            project_path: resolved_project_path,
            verbose,
            config_manager,
        })
    }

    /// Use the current directory when it carries a `.hipchat/config.toml`
    fn resolve_project_path(project_path: Option<PathBuf>) -> Option<PathBuf> {
        if let Some(path) = project_path {
            return Some(path);
        }

        if let Ok(current_dir) = std::env::current_dir() {
            if ConfigManager::project_config_path(&current_dir).exists() {
                return Some(current_dir);
            }
        }

        None
    }

    /// Initialize logging subsystem based on verbosity and configuration
    pub fn init_logging(&self) -> Result<()> {
        let log_level = if self.verbose {
            "debug"
        } else {
            &self.config_manager.config().logging.level
        };

        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(
                tracing_subscriber::EnvFilter::from_default_env().add_directive(
                    log_level
                        .parse()
                        .unwrap_or_else(|_| tracing::Level::INFO.into()),
                ),
            )
            .init();

        if self.verbose {
            tracing::debug!("Verbose logging enabled");
            tracing::debug!("Project path: {:?}", self.project_path);
            tracing::debug!("Config path: {:?}", self.config_manager.config_path());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_context_creation() {
        let temp_dir = TempDir::new().unwrap();
        let context = CliContext::new(Some(temp_dir.path().to_path_buf()), false).unwrap();

        assert_eq!(context.project_path, Some(temp_dir.path().to_path_buf()));
        assert!(!context.verbose);
    }

    #[test]
    fn test_context_reads_project_config() {
        let temp_dir = TempDir::new().unwrap();
        let path = ConfigManager::project_config_path(temp_dir.path());
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "[logging]\nlevel = \"warn\"\n").unwrap();

        let context = CliContext::new(Some(temp_dir.path().to_path_buf()), true).unwrap();
        assert!(context.verbose);
        assert_eq!(context.config_manager.config().logging.level, "warn");
        assert_eq!(context.config_manager.config_path(), Some(path.as_path()));
    }

    #[test]
    fn test_context_rejects_broken_config() {
        let temp_dir = TempDir::new().unwrap();
        let path = ConfigManager::project_config_path(temp_dir.path());
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "[hipchat]\ntimeout_secs = 0\n").unwrap();

        assert!(CliContext::new(Some(temp_dir.path().to_path_buf()), false).is_err());
    }
}
