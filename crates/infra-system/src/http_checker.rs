// HTTP reachability check over reqwest
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

use netfix_core::port::{HttpCheckError, HttpChecker};

/// GETs without any proxy so the check measures direct reachability
pub struct ReqwestHttpChecker {
    client: reqwest::Client,
}

impl ReqwestHttpChecker {
    pub fn new() -> Result<Self, HttpCheckError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("netfix/", env!("CARGO_PKG_VERSION")))
            .no_proxy()
            .build()
            .map_err(|e| HttpCheckError::Transport(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpChecker for ReqwestHttpChecker {
    async fn get_status(&self, url: &str, timeout: Duration) -> Result<u16, HttpCheckError> {
        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    HttpCheckError::Timeout(timeout)
                } else {
                    HttpCheckError::Transport(e.to_string())
                }
            })?;

        let status = response.status().as_u16();
        debug!(url, status, "HTTP check completed");
        Ok(status)
    }
}
