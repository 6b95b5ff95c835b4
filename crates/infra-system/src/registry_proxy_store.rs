// Windows per-user proxy settings, read and written through reg.exe
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use netfix_core::domain::{FailureKind, ProxyConfiguration, StepOutcome};
use netfix_core::port::proxy_store::DISABLE_PROXY_LABEL;
use netfix_core::port::{CommandRunner, CommandSpec, ProxySettingStore, RunOptions};

/// HKCU key holding the WinINet proxy values
pub const INTERNET_SETTINGS_KEY: &str =
    r"HKCU\Software\Microsoft\Windows\CurrentVersion\Internet Settings";

const PROXY_ENABLE: &str = "ProxyEnable";
const PROXY_SERVER: &str = "ProxyServer";

/// Access-denied text as printed by reg.exe in English and Chinese locales
const ACCESS_DENIED_MARKERS: [&str; 2] = ["Access is denied", "拒绝访问"];

pub struct RegistryProxyStore {
    runner: Arc<dyn CommandRunner>,
    options: RunOptions,
}

impl RegistryProxyStore {
    pub fn new(runner: Arc<dyn CommandRunner>, command_timeout: Duration) -> Self {
        Self {
            runner,
            options: RunOptions::checked(command_timeout),
        }
    }

    async fn query(&self, value: &str) -> Option<String> {
        let command = CommandSpec::argv(&["reg", "query", INTERNET_SETTINGS_KEY, "/v", value]);
        let outcome = self.runner.run(&command, &self.options).await;
        if !outcome.succeeded() {
            debug!(value, output = %outcome.output(), "Registry value not readable");
            return None;
        }
        parse_reg_value(outcome.output(), value)
    }
}

/// `reg add <key> /v <name> /t <type> /d <data> /f`
fn reg_add(name: &str, kind: &str, data: &str) -> CommandSpec {
    CommandSpec::argv(&["reg", "add", INTERNET_SETTINGS_KEY, "/v", name, "/t", kind, "/d"])
        .arg(data)
        .arg("/f")
}

/// Extract the data column for `name` from `reg query` output
///
/// Lines look like `    ProxyServer    REG_SZ    127.0.0.1:7890`.
pub fn parse_reg_value(output: &str, name: &str) -> Option<String> {
    output.lines().find_map(|line| {
        let rest = line.trim().strip_prefix(name)?;
        if !rest.starts_with(char::is_whitespace) {
            return None;
        }
        let rest = rest.trim_start();
        if !rest.starts_with("REG_") {
            return None;
        }
        let data = rest
            .split_once(char::is_whitespace)
            .map(|(_, data)| data.trim())
            .unwrap_or("");
        Some(data.to_string())
    })
}

/// `0x1` style REG_DWORD data
pub fn parse_dword(data: &str) -> Option<u32> {
    let data = data.trim();
    match data.strip_prefix("0x").or_else(|| data.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16).ok(),
        None => data.parse().ok(),
    }
}

fn is_access_denied(output: &str) -> bool {
    ACCESS_DENIED_MARKERS.iter().any(|m| output.contains(m))
}

#[async_trait]
impl ProxySettingStore for RegistryProxyStore {
    async fn read(&self) -> ProxyConfiguration {
        let enabled = self
            .query(PROXY_ENABLE)
            .await
            .and_then(|data| parse_dword(&data))
            .is_some_and(|v| v != 0);
        let server = self.query(PROXY_SERVER).await.unwrap_or_default();
        ProxyConfiguration::new(enabled, server)
    }

    async fn disable(&self) -> StepOutcome {
        let chain = [
            reg_add(PROXY_ENABLE, "REG_DWORD", "0"),
            reg_add(PROXY_SERVER, "REG_SZ", ""),
        ];
        let outcome = self.runner.run_chain(&chain, &self.options).await;

        if outcome.succeeded() {
            info!("System proxy disabled");
            return StepOutcome::success(DISABLE_PROXY_LABEL, "System proxy disabled")
                .with_duration(outcome.duration());
        }

        let kind = if is_access_denied(outcome.output()) {
            FailureKind::PermissionDenied
        } else {
            outcome.failure_kind().unwrap_or(FailureKind::Execution)
        };
        warn!(failure = %kind, output = %outcome.output(), "Failed to disable system proxy");
        StepOutcome::failure(DISABLE_PROXY_LABEL, kind, outcome.output())
            .with_exit_code(outcome.exit_code())
            .with_duration(outcome.duration())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use netfix_core::port::command_runner::mocks::{MockBehavior, MockCommandRunner};

    const ENABLE_OUTPUT: &str = "\r\nHKEY_CURRENT_USER\\Software\\Microsoft\\Windows\\CurrentVersion\\Internet Settings\r\n    ProxyEnable    REG_DWORD    0x1\r\n";
    const SERVER_OUTPUT: &str = "\r\nHKEY_CURRENT_USER\\Software\\Microsoft\\Windows\\CurrentVersion\\Internet Settings\r\n    ProxyServer    REG_SZ    http=proxy.corp:8080;https=proxy.corp:8443\r\n";

    fn store(runner: &MockCommandRunner) -> RegistryProxyStore {
        RegistryProxyStore::new(Arc::new(runner.clone()), Duration::from_secs(10))
    }

    #[test]
    fn test_parse_reg_value() {
        assert_eq!(
            parse_reg_value(ENABLE_OUTPUT, "ProxyEnable").as_deref(),
            Some("0x1")
        );
        assert_eq!(
            parse_reg_value(SERVER_OUTPUT, "ProxyServer").as_deref(),
            Some("http=proxy.corp:8080;https=proxy.corp:8443")
        );
        assert_eq!(parse_reg_value(SERVER_OUTPUT, "ProxyEnable"), None);
        // Value name must match exactly, not as a prefix
        assert_eq!(parse_reg_value(SERVER_OUTPUT, "Proxy"), None);
        assert_eq!(
            parse_reg_value("    ProxyServer    REG_SZ    ", "ProxyServer").as_deref(),
            Some("")
        );
    }

    #[test]
    fn test_parse_dword() {
        assert_eq!(parse_dword("0x1"), Some(1));
        assert_eq!(parse_dword("0x0"), Some(0));
        assert_eq!(parse_dword("17"), Some(17));
        assert_eq!(parse_dword("junk"), None);
    }

    #[tokio::test]
    async fn test_read_enabled_proxy() {
        let runner = MockCommandRunner::new()
            .on("/v ProxyEnable", MockBehavior::Succeed(ENABLE_OUTPUT.into()))
            .on("/v ProxyServer", MockBehavior::Succeed(SERVER_OUTPUT.into()));

        let config = store(&runner).read().await;

        assert!(config.enabled);
        assert_eq!(config.server, "http=proxy.corp:8080;https=proxy.corp:8443");
    }

    #[tokio::test]
    async fn test_read_missing_values_degrades_to_disabled() {
        let runner = MockCommandRunner::new().on(
            "reg query",
            MockBehavior::Fail {
                exit_code: 1,
                output: "ERROR: The system was unable to find the specified registry key or value."
                    .into(),
            },
        );

        let config = store(&runner).read().await;

        assert_eq!(config, ProxyConfiguration::disabled());
    }

    #[tokio::test]
    async fn test_disable_writes_both_values() {
        let runner = MockCommandRunner::new();

        let outcome = store(&runner).disable().await;

        assert!(outcome.succeeded());
        assert_eq!(outcome.label(), DISABLE_PROXY_LABEL);
        let calls = runner.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(
            calls[0].arguments(),
            ["add", INTERNET_SETTINGS_KEY, "/v", "ProxyEnable", "/t", "REG_DWORD", "/d", "0", "/f"]
        );
        assert_eq!(calls[1].arguments()[7], "");
    }

    #[tokio::test]
    async fn test_access_denied_maps_to_permission_denied() {
        for message in ["ERROR: Access is denied.", "错误: 拒绝访问。"] {
            let runner = MockCommandRunner::new().on(
                "reg add",
                MockBehavior::Fail {
                    exit_code: 1,
                    output: message.into(),
                },
            );

            let outcome = store(&runner).disable().await;

            assert_eq!(outcome.failure_kind(), Some(FailureKind::PermissionDenied));
            assert_eq!(runner.call_count(), 1, "second write must not run");
        }
    }

    #[tokio::test]
    async fn test_other_failure_is_execution() {
        let runner = MockCommandRunner::new().on(
            "ProxyServer",
            MockBehavior::Fail {
                exit_code: 1,
                output: "ERROR: Invalid syntax.".into(),
            },
        );

        let outcome = store(&runner).disable().await;

        assert_eq!(outcome.failure_kind(), Some(FailureKind::Execution));
        assert_eq!(outcome.output(), "ERROR: Invalid syntax.");
    }
}
