// Tracing setup: console layer on stderr plus an optional plain-text log file
use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::settings::{LogConfig, LogFormat};

/// Overrides `log.format` for one invocation
const LOG_FORMAT_ENV: &str = "NETFIX_LOG_FORMAT";

/// The file log keeps the full run history regardless of console verbosity
const FILE_FILTER: &str = "netfix=info";

fn console_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "netfix=warn",
        1 => "netfix=info",
        _ => "netfix=debug",
    }
}

fn resolve_format(configured: LogFormat) -> LogFormat {
    match std::env::var(LOG_FORMAT_ENV).as_deref() {
        Ok("json") => LogFormat::Json,
        Ok("pretty") => LogFormat::Pretty,
        _ => configured,
    }
}

/// Install the global subscriber
///
/// `RUST_LOG` wins over `verbosity` for the console. The returned guard must
/// live until exit or buffered file lines are lost.
pub fn init(config: &LogConfig, verbosity: u8) -> Result<Option<WorkerGuard>> {
    let console_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(console_directive(verbosity)))
        .context("Failed to create env filter")?;

    let console = match resolve_format(config.format) {
        LogFormat::Json => fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_filter(console_filter)
            .boxed(),
        LogFormat::Pretty => fmt::layer()
            .pretty()
            .with_writer(std::io::stderr)
            .with_filter(console_filter)
            .boxed(),
    };

    let (file_layer, guard) = match &config.file {
        Some(raw) => {
            let path = PathBuf::from(shellexpand::tilde(raw).into_owned());
            let (dir, name) = split_log_path(&path)?;
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
            let appender = tracing_appender::rolling::never(dir, name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_filter(EnvFilter::new(FILE_FILTER));
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(console)
        .with(file_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(guard)
}

fn split_log_path(path: &std::path::Path) -> Result<(PathBuf, std::ffi::OsString)> {
    let name = path
        .file_name()
        .with_context(|| format!("Log file path has no file name: {}", path.display()))?
        .to_os_string();
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    Ok((dir, name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_verbosity_levels() {
        assert_eq!(console_directive(0), "netfix=warn");
        assert_eq!(console_directive(1), "netfix=info");
        assert_eq!(console_directive(5), "netfix=debug");
    }

    #[test]
    fn test_split_log_path() {
        let (dir, name) = split_log_path(Path::new("/var/log/netfix/run.log")).unwrap();
        assert_eq!(dir, PathBuf::from("/var/log/netfix"));
        assert_eq!(name, "run.log");

        let (dir, name) = split_log_path(Path::new("netfix.log")).unwrap();
        assert_eq!(dir, PathBuf::from("."));
        assert_eq!(name, "netfix.log");

        assert!(split_log_path(Path::new("/")).is_err());
    }
}
