// Layered configuration: built-in defaults, optional TOML file, NETFIX__* environment
use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use netfix_core::application::constants::DEFAULT_DISPATCH_TICK;
use netfix_core::domain::RemediationSettings;

const CONFIG_FILE_NAME: &str = "netfix.toml";
const ENV_PREFIX: &str = "NETFIX";
const ENV_SEPARATOR: &str = "__";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub format: LogFormat,
    /// Append-only log file; `~` is expanded
    pub file: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub engine: RemediationSettings,
    pub log: LogConfig,
    /// How often the console drains worker events
    pub dispatch_tick_ms: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            engine: RemediationSettings::default(),
            log: LogConfig::default(),
            dispatch_tick_ms: DEFAULT_DISPATCH_TICK.as_millis() as u64,
        }
    }
}

impl AppConfig {
    /// Load and validate
    ///
    /// An explicit path must exist; the default per-user file is optional.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let defaults = Config::try_from(&AppConfig::default())
            .context("Failed to seed configuration defaults")?;
        let mut builder = Config::builder().add_source(defaults);

        match explicit {
            Some(path) => {
                builder = builder.add_source(
                    File::from(path.to_path_buf())
                        .format(FileFormat::Toml)
                        .required(true),
                );
            }
            None => {
                if let Some(path) = default_config_path() {
                    builder = builder.add_source(
                        File::from(path).format(FileFormat::Toml).required(false),
                    );
                }
            }
        }

        let config: AppConfig = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator(ENV_SEPARATOR)
                    .separator(ENV_SEPARATOR)
                    .try_parsing(true),
            )
            .build()
            .context("Failed to read configuration")?
            .try_deserialize()
            .context("Invalid configuration")?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.engine
            .validate()
            .context("Invalid [engine] settings")?;
        if self.dispatch_tick_ms == 0 {
            anyhow::bail!("dispatch_tick_ms must be greater than zero");
        }
        Ok(())
    }

    pub fn dispatch_tick(&self) -> Duration {
        Duration::from_millis(self.dispatch_tick_ms)
    }
}

/// `<config dir>/netfix.toml`
pub fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "netfix").map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(body: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(body.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_file_overrides_defaults() {
        let file = write_config(
            r#"
dispatch_tick_ms = 20

[engine]
ping_timeout_ms = 500
parallel_probes = false

[log]
format = "json"
file = "~/netfix.log"
"#,
        );

        let config = AppConfig::load(Some(file.path())).unwrap();

        assert_eq!(config.engine.ping_timeout_ms, 500);
        assert!(!config.engine.parallel_probes);
        assert_eq!(config.engine.http_timeout_secs, 3, "untouched keys keep defaults");
        assert_eq!(config.log.format, LogFormat::Json);
        assert_eq!(config.log.file.as_deref(), Some("~/netfix.log"));
        assert_eq!(config.dispatch_tick(), Duration::from_millis(20));
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(AppConfig::load(Some(&dir.path().join("absent.toml"))).is_err());
    }

    #[test]
    fn test_zero_timeout_is_rejected() {
        let file = write_config("[engine]\ncommand_timeout_secs = 0\n");
        let err = AppConfig::load(Some(file.path())).unwrap_err();
        assert!(format!("{:#}", err).contains("command_timeout_secs"));
    }

    #[test]
    fn test_zero_tick_is_rejected() {
        let config = AppConfig {
            dispatch_tick_ms: 0,
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
