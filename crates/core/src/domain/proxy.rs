// Proxy configuration as persisted per user

use serde::{Deserialize, Serialize};

/// Two-field proxy configuration.
///
/// A missing value means disabled / empty; it is never an error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyConfiguration {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub server: String,
}

impl ProxyConfiguration {
    pub fn new(enabled: bool, server: impl Into<String>) -> Self {
        Self {
            enabled,
            server: server.into(),
        }
    }

    pub fn disabled() -> Self {
        Self::default()
    }
}

impl std::fmt::Display for ProxyConfiguration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let status = if self.enabled { "enabled" } else { "disabled" };
        let server = if self.server.is_empty() {
            "none"
        } else {
            self.server.as_str()
        };
        write!(f, "proxy {} (server: {})", status, server)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_default_to_disabled() {
        let config: ProxyConfiguration = serde_json::from_str("{}").unwrap();
        assert_eq!(config, ProxyConfiguration::disabled());

        let config: ProxyConfiguration = serde_json::from_str(r#"{"enabled":true}"#).unwrap();
        assert!(config.enabled);
        assert_eq!(config.server, "");
    }

    #[test]
    fn test_display() {
        assert_eq!(
            ProxyConfiguration::new(true, "127.0.0.1:7890").to_string(),
            "proxy enabled (server: 127.0.0.1:7890)"
        );
        assert_eq!(
            ProxyConfiguration::disabled().to_string(),
            "proxy disabled (server: none)"
        );
    }
}
