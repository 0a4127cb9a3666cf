use crate::errors::{NotifyError, NotifyResult};
use crate::notifications::{NotificationConfig, NotificationTable};
use crate::publisher::{ProtocolVersion, ProxySettings};
use directories::BaseDirs;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const CONFIG_DIR: &str = ".hipchat";
const CONFIG_FILE: &str = "config.toml";

/// Complete configuration for the notifier
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub hipchat: HipChatConfig,
    #[serde(default)]
    pub proxy: ProxySettings,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notifications: Vec<NotificationConfig>,
    /// Credential id to token, consulted before `hipchat.auth_token`
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub credentials: BTreeMap<String, String>,
}

/// Connection and delivery settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HipChatConfig {
    pub server: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credential_id: Option<String>,
    /// Comma separated room ids or names
    pub room: String,
    /// Sender name shown by the v1 API
    pub send_as: String,
    pub v2_enabled: bool,
    pub timeout_secs: u64,
    pub card_provider: Option<String>,
    pub fail_on_error: bool,
    /// Prefix for run URLs that are relative to the build server
    #[serde(skip_serializing_if = "Option::is_none")]
    pub build_server_url: Option<String>,
}

impl Default for HipChatConfig {
    fn default() -> Self {
        Self {
            server: "api.hipchat.com".to_string(),
            auth_token: None,
            credential_id: None,
            room: String::new(),
            send_as: "Build Server".to_string(),
            v2_enabled: true,
            timeout_secs: 10,
            card_provider: Some("default".to_string()),
            fail_on_error: false,
            build_server_url: None,
        }
    }
}

impl HipChatConfig {
    pub fn protocol(&self) -> ProtocolVersion {
        ProtocolVersion::from_v2_flag(self.v2_enabled)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Config {
    /// Parse and validate TOML content
    pub fn from_toml(content: &str) -> NotifyResult<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> NotifyResult<()> {
        if self.hipchat.server.trim().is_empty() {
            return Err(NotifyError::config("hipchat.server must not be empty"));
        }
        if self.hipchat.timeout_secs == 0 {
            return Err(NotifyError::config("hipchat.timeout_secs must be greater than zero"));
        }
        NotificationTable::from_entries(self.notifications.iter().cloned())?;
        Ok(())
    }

    /// Per-category settings, explicit entries over built-in defaults
    pub fn notification_table(&self) -> NotifyResult<NotificationTable> {
        NotificationTable::with_defaults(self.notifications.iter().cloned())
    }

    /// Copy safe to print, with every secret masked
    pub fn redacted(&self) -> Self {
        let mask = |_: &String| "********".to_string();
        let mut config = self.clone();
        config.hipchat.auth_token = self.hipchat.auth_token.as_ref().map(mask);
        config.credentials = self
            .credentials
            .iter()
            .map(|(id, token)| (id.clone(), mask(token)))
            .collect();
        config.proxy = self.proxy.redacted();
        config
    }
}

/// Read-only access to the configuration file
///
/// # Configuration Hierarchy
///
/// 1. **Project-level**: `.hipchat/config.toml` in the project root
/// 2. **Global**: `~/.hipchat/config.toml` in the user home directory
/// 3. Built-in defaults when neither file exists
///
/// Files are never created or written.
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_path: Option<PathBuf>,
    config: Config,
}

impl ConfigManager {
    pub fn new(project_path: Option<PathBuf>) -> NotifyResult<Self> {
        if let Some(path) = project_path {
            let project_config = Self::project_config_path(&path);
            if project_config.exists() {
                return Self::from_file(project_config);
            }
        }

        match Self::global_config_path() {
            Some(global_config) if global_config.exists() => Self::from_file(global_config),
            _ => Ok(Self {
                config_path: None,
                config: Config::default(),
            }),
        }
    }

    /// Load a specific file
    pub fn from_file(path: PathBuf) -> NotifyResult<Self> {
        let config = Self::load(&path)?;
        Ok(Self {
            config_path: Some(path),
            config,
        })
    }

    /// Wrap an already built configuration
    pub fn from_config(config: Config) -> Self {
        Self {
            config_path: None,
            config,
        }
    }

    pub fn project_config_path(project_path: &Path) -> PathBuf {
        project_path.join(CONFIG_DIR).join(CONFIG_FILE)
    }

    pub fn global_config_path() -> Option<PathBuf> {
        BaseDirs::new().map(|dirs| dirs.home_dir().join(CONFIG_DIR).join(CONFIG_FILE))
    }

    fn load(path: &Path) -> NotifyResult<Config> {
        let content = fs::read_to_string(path)
            .map_err(|e| NotifyError::io(path, "read config file", e))?;
        Config::from_toml(&content)
    }

    /// File the configuration came from; `None` means built-in defaults
    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}
