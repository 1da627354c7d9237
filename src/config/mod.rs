//! Configuration for lost-found
//!
//! Settings are layered: built-in defaults, then an optional TOML file, then
//! `LOST_FOUND_*` environment variables (`__` separates nested keys, e.g.
//! `LOST_FOUND_STORAGE__FLUSH_TIMEOUT_MS=2000`).

use crate::error::{LostFoundError, Result};
use crate::storage::StoreOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// File looked up in the working directory when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "lost-found.toml";

const ENV_PREFIX: &str = "LOST_FOUND";

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub storage: StorageConfig,
    pub tickets: TicketPolicyConfig,
    pub notification: NotificationConfig,
    pub server: ServerConfig,
}

/// Which persistence adapter backs the store
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    File,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Data file; defaults to the platform data directory
    pub path: Option<PathBuf>,
    /// Upper bound per flush; 0 disables the bound
    pub flush_timeout_ms: u64,
    /// How long to wait for another process to release the data file
    pub lock_timeout_ms: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::File,
            path: None,
            flush_timeout_ms: 5_000,
            lock_timeout_ms: 2_000,
        }
    }
}

impl StorageConfig {
    /// Resolved data file path
    #[must_use]
    pub fn data_file(&self) -> PathBuf {
        self.path.clone().unwrap_or_else(default_data_file)
    }

    #[must_use]
    pub fn flush_timeout(&self) -> Option<Duration> {
        (self.flush_timeout_ms > 0).then(|| Duration::from_millis(self.flush_timeout_ms))
    }

    #[must_use]
    pub const fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TicketPolicyConfig {
    /// Let the routine status update reopen closed tickets
    pub allow_reopen_on_update: bool,
}

/// Which mailer receives rendered notifications
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MailerKind {
    #[default]
    Log,
    Outbox,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct NotificationConfig {
    pub enabled: bool,
    /// Externally reachable address the tracking links point at
    pub base_url: String,
    pub from_address: String,
    pub mailer: MailerKind,
    /// Spool directory for the outbox mailer
    pub outbox_dir: Option<PathBuf>,
    /// Directory with template overrides
    pub template_dir: Option<PathBuf>,
    pub max_attempts: u32,
    pub retry_backoff_ms: u64,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: "http://localhost:10000".to_string(),
            from_address: "lost-and-found@localhost".to_string(),
            mailer: MailerKind::Log,
            outbox_dir: None,
            template_dir: None,
            max_attempts: 3,
            retry_backoff_ms: 500,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 10_000,
        }
    }
}

impl Config {
    /// Load configuration from `path` (must exist) or, when `None`, from
    /// `lost-found.toml` in the working directory if present
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(path) => {
                if !path.exists() {
                    return Err(LostFoundError::Config(format!(
                        "Config file not found: {}",
                        path.display()
                    )));
                }
                config::File::from(path).required(true)
            },
            None => config::File::new(DEFAULT_CONFIG_FILE, config::FileFormat::Toml).required(false),
        };

        let settings = config::Config::builder()
            .add_source(file)
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        tracing::debug!(?config, "configuration loaded");
        Ok(config)
    }

    /// Check values the type system cannot
    pub fn validate(&self) -> Result<()> {
        if self.notification.enabled && self.notification.base_url.trim().is_empty() {
            return Err(LostFoundError::Config(
                "notification.base_url must be set when notifications are enabled".to_string(),
            ));
        }
        if self.notification.max_attempts == 0 {
            return Err(LostFoundError::Config(
                "notification.max_attempts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Store options derived from this configuration
    #[must_use]
    pub fn store_options(&self) -> StoreOptions {
        StoreOptions {
            flush_timeout: self.storage.flush_timeout(),
            allow_reopen_on_update: self.tickets.allow_reopen_on_update,
            event_capacity: None,
        }
    }
}

fn default_data_file() -> PathBuf {
    directories::ProjectDirs::from("", "", "lost-found").map_or_else(
        || PathBuf::from("tickets.json"),
        |dirs| dirs.data_dir().join("tickets.json"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    #[test]
    #[serial]
    fn test_defaults_without_file() {
        let config = Config::load(None).unwrap();
        assert_eq!(config.storage.backend, StorageBackend::File);
        assert_eq!(config.storage.flush_timeout(), Some(Duration::from_secs(5)));
        assert!(!config.tickets.allow_reopen_on_update);
        assert_eq!(config.notification.max_attempts, 3);
    }

    #[test]
    #[serial]
    fn test_load_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("desk.toml");
        std::fs::write(
            &path,
            r#"
[storage]
backend = "memory"
flush_timeout_ms = 0

[tickets]
allow_reopen_on_update = true

[notification]
base_url = "https://kiosk.example.org"
mailer = "outbox"
"#,
        )
        .unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert_eq!(config.storage.flush_timeout(), None);
        assert!(config.tickets.allow_reopen_on_update);
        assert_eq!(config.notification.base_url, "https://kiosk.example.org");
        assert_eq!(config.notification.mailer, MailerKind::Outbox);
        assert_eq!(config.server.port, 10_000);
    }

    #[test]
    #[serial]
    fn test_environment_overrides() {
        unsafe {
            std::env::set_var("LOST_FOUND_STORAGE__LOCK_TIMEOUT_MS", "250");
        }
        let config = Config::load(None);
        unsafe {
            std::env::remove_var("LOST_FOUND_STORAGE__LOCK_TIMEOUT_MS");
        }
        assert_eq!(
            config.unwrap().storage.lock_timeout(),
            Duration::from_millis(250)
        );
    }

    #[test]
    #[serial]
    fn test_missing_explicit_file() {
        let err = Config::load(Some(Path::new("/nonexistent/lost-found.toml"))).unwrap_err();
        assert!(err.is_config_error());
    }

    #[test]
    fn test_validate_rejects_zero_attempts() {
        let mut config = Config::default();
        config.notification.max_attempts = 0;
        assert!(config.validate().is_err());
    }
}
