// File-backed proxy store for hosts without a registry
use async_trait::async_trait;
use directories::ProjectDirs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

use netfix_core::domain::{FailureKind, ProxyConfiguration, StepOutcome};
use netfix_core::port::proxy_store::DISABLE_PROXY_LABEL;
use netfix_core::port::ProxySettingStore;
use netfix_core::{AppError, Result};

const PROXY_FILE_NAME: &str = "proxy.json";

/// Proxy configuration persisted as JSON in the per-user config directory
#[derive(Debug, Clone)]
pub struct FileProxyStore {
    path: PathBuf,
}

impl FileProxyStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<config dir>/proxy.json`, or `None` when the home directory is unknown
    pub fn default_location() -> Option<PathBuf> {
        ProjectDirs::from("", "", "netfix").map(|dirs| dirs.config_dir().join(PROXY_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn write(&self, config: &ProxyConfiguration) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let body = serde_json::to_vec_pretty(config)?;
        tokio::fs::write(&self.path, body).await?;
        Ok(())
    }
}

/// Map a store error onto the failure taxonomy
pub fn classify_error(error: &AppError) -> FailureKind {
    if error.is_permission_denied() {
        FailureKind::PermissionDenied
    } else {
        FailureKind::Execution
    }
}

#[async_trait]
impl ProxySettingStore for FileProxyStore {
    async fn read(&self) -> ProxyConfiguration {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) => {
                debug!(path = %self.path.display(), error = %e, "Proxy file not readable");
                return ProxyConfiguration::disabled();
            }
        };
        serde_json::from_str(&raw).unwrap_or_else(|e| {
            warn!(path = %self.path.display(), error = %e, "Proxy file is malformed");
            ProxyConfiguration::disabled()
        })
    }

    async fn disable(&self) -> StepOutcome {
        let started = Instant::now();
        match self.write(&ProxyConfiguration::disabled()).await {
            Ok(()) => {
                info!(path = %self.path.display(), "Proxy disabled");
                StepOutcome::success(DISABLE_PROXY_LABEL, "System proxy disabled")
                    .with_duration(started.elapsed())
            }
            Err(e) => {
                let kind = classify_error(&e);
                warn!(path = %self.path.display(), error = %e, failure = %kind, "Failed to disable proxy");
                StepOutcome::failure(DISABLE_PROXY_LABEL, kind, e.to_string())
                    .with_duration(started.elapsed())
            }
        }
    }
}
