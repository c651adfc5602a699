//! Frame controller configuration.

use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use dispatchpi_core::service::gmail::DEFAULT_API_BASE;
use dispatchpi_core::{Clock, SchedulerConfig, SenderFilter};
use serde::{Deserialize, Serialize};

/// Settings loaded from `config.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Addresses the satellite frame's owner sends from.
    pub satellite_emails: Vec<String>,
    /// Maximum number of images queued per frame.
    pub queue_length: usize,
    /// Directory for queue files. Defaults to the user data directory.
    pub queue_dir: Option<PathBuf>,
    /// Google authorized-user token file. Defaults to `token.json` next to the config.
    pub credentials_file: Option<PathBuf>,
    /// UTC offset deciding when the frames change day. Local time when unset.
    pub utc_offset_minutes: Option<i32>,
    /// Image shown when nothing is due.
    pub default_image: Option<PathBuf>,
    /// Gmail API endpoint.
    pub gmail_api_base: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            satellite_emails: Vec::new(),
            queue_length: 10,
            queue_dir: None,
            credentials_file: None,
            utc_offset_minutes: None,
            default_image: None,
            gmail_api_base: DEFAULT_API_BASE.to_string(),
        }
    }
}

impl Config {
    /// Default configuration file location.
    #[must_use]
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("dispatchpi")
            .join("config.json")
    }

    /// Loads the configuration from `path`, or defaults if the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or fails validation.
    pub async fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::warn!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }

        let contents = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("cannot read config {}", path.display()))?;
        let config: Self = serde_json::from_str(&contents)
            .with_context(|| format!("invalid config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Writes the configuration to `path`, creating the parent directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or file cannot be written.
    pub async fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, contents).await?;
        tracing::info!("Config saved to {:?}", path);
        Ok(())
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns an error describing the first invalid setting.
    pub fn validate(&self) -> Result<()> {
        if self.queue_length == 0 {
            bail!("queue_length must be at least 1");
        }
        if let Some(minutes) = self.utc_offset_minutes
            && Clock::from_offset_minutes(minutes).is_none()
        {
            bail!("utc_offset_minutes must be within ±24 hours, got {minutes}");
        }
        if self.gmail_api_base.trim().is_empty() {
            bail!("gmail_api_base must not be empty");
        }
        Ok(())
    }

    /// Directory holding the queue files.
    #[must_use]
    pub fn queue_dir(&self) -> PathBuf {
        self.queue_dir.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("dispatchpi")
                .join("queues")
        })
    }

    /// Location of the OAuth credentials, resolved against the config file.
    #[must_use]
    pub fn credentials_path(&self, config_path: &Path) -> PathBuf {
        let dir = config_path.parent().unwrap_or_else(|| Path::new("."));
        match &self.credentials_file {
            Some(file) if file.is_absolute() => file.clone(),
            Some(file) => dir.join(file),
            None => dir.join("token.json"),
        }
    }

    /// The clock deciding which day it is at the frames.
    #[must_use]
    pub fn clock(&self) -> Clock {
        self.utc_offset_minutes
            .and_then(Clock::from_offset_minutes)
            .unwrap_or_default()
    }

    /// Scheduler settings derived from this configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if `queue_length` is zero.
    pub fn scheduler_config(&self) -> Result<SchedulerConfig> {
        let capacity =
            NonZeroUsize::new(self.queue_length).context("queue_length must be at least 1")?;
        Ok(SchedulerConfig {
            capacity,
            filter: SenderFilter::new(&self.satellite_emails),
            queue_dir: self.queue_dir(),
            clock: self.clock(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.queue_length, 10);
        assert_eq!(config.clock(), Clock::Local);
        config.validate().unwrap();
    }

    #[test]
    fn test_parse() {
        let config: Config = serde_json::from_str(
            r#"{
                "satellite_emails": ["astro@example.com"],
                "queue_length": 3,
                "queue_dir": "/var/lib/dispatchpi",
                "utc_offset_minutes": -240
            }"#,
        )
        .unwrap();
        config.validate().unwrap();

        let scheduler = config.scheduler_config().unwrap();
        assert_eq!(scheduler.capacity.get(), 3);
        assert_eq!(scheduler.queue_dir, PathBuf::from("/var/lib/dispatchpi"));
        assert_eq!(scheduler.filter.satellite_addresses(), ["astro@example.com"]);
        assert_eq!(scheduler.clock, Clock::from_offset_minutes(-240).unwrap());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let zero = Config {
            queue_length: 0,
            ..Config::default()
        };
        assert!(zero.validate().is_err());
        assert!(zero.scheduler_config().is_err());

        let offset = Config {
            utc_offset_minutes: Some(25 * 60),
            ..Config::default()
        };
        assert!(offset.validate().is_err());
    }

    #[test]
    fn test_credentials_path() {
        let config_path = Path::new("/etc/dispatchpi/config.json");
        assert_eq!(
            Config::default().credentials_path(config_path),
            PathBuf::from("/etc/dispatchpi/token.json")
        );

        let relative = Config {
            credentials_file: Some(PathBuf::from("secrets/token.json")),
            ..Config::default()
        };
        assert_eq!(
            relative.credentials_path(config_path),
            PathBuf::from("/etc/dispatchpi/secrets/token.json")
        );
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let config = Config {
            satellite_emails: vec!["astro@example.com".to_string()],
            queue_length: 4,
            ..Config::default()
        };

        config.save(&path).await.unwrap();
        assert_eq!(Config::load(&path).await.unwrap(), config);
    }

    #[tokio::test]
    async fn test_load_missing_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(&dir.path().join("absent.json")).await.unwrap();
        assert_eq!(config, Config::default());
    }
}
