// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Logging initialization for RepoLens binaries
//!
//! Every binary calls one of the `init*` functions exactly once at startup.
//! `RUST_LOG` always wins over the level passed in, so operators can raise
//! verbosity for a single module without a rebuild.

use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub use clap;
pub use tracing::Level;

/// Output format for log messages
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, clap::ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable plaintext format
    #[default]
    Plaintext,
    /// Structured JSON format, one object per line
    Json,
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogFormat::Plaintext => write!(f, "plaintext"),
            LogFormat::Json => write!(f, "json"),
        }
    }
}

/// Log level as accepted on the command line
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Default, clap::ValueEnum, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum CliLogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for Level {
    fn from(level: CliLogLevel) -> Self {
        match level {
            CliLogLevel::Error => Level::ERROR,
            CliLogLevel::Warn => Level::WARN,
            CliLogLevel::Info => Level::INFO,
            CliLogLevel::Debug => Level::DEBUG,
            CliLogLevel::Trace => Level::TRACE,
        }
    }
}

/// Logging arguments shared by all binaries.
///
/// Flatten into a clap parser with `#[command(flatten)]`. Logs go to stdout
/// unless `--log-file` or `--log-dir` is given.
#[derive(Clone, Debug, Default, clap::Args, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CliLoggingArgs {
    /// Log verbosity level
    #[arg(long, value_enum, env = "RL_LOG_LEVEL")]
    pub log_level: Option<CliLogLevel>,

    /// Log output format
    #[arg(long, value_enum, env = "RL_LOG_FORMAT")]
    pub log_format: Option<LogFormat>,

    /// Directory for log files
    #[arg(long)]
    pub log_dir: Option<PathBuf>,

    /// Log filename (absolute, or relative to --log-dir)
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

impl CliLoggingArgs {
    /// Install the global subscriber described by these arguments
    pub fn init(&self, component: &str) -> anyhow::Result<()> {
        let level: Level = self.log_level.unwrap_or_default().into();
        let format = self.log_format.unwrap_or_default();

        match self.resolve_log_path(component) {
            Some(path) => init_to_file(component, level, format, &path),
            None => init(component, level, format),
        }
    }

    /// Resolve the log file path, or `None` when logging to stdout
    pub fn resolve_log_path(&self, component: &str) -> Option<PathBuf> {
        match (&self.log_file, &self.log_dir) {
            (Some(file), _) if file.is_absolute() => Some(file.clone()),
            (Some(file), Some(dir)) => Some(dir.join(file)),
            (Some(file), None) => Some(file.clone()),
            (None, Some(dir)) => Some(dir.join(format!("{component}.log"))),
            (None, None) => None,
        }
    }
}

/// Initialize logging to stdout
pub fn init(component: &str, default_level: Level, format: LogFormat) -> anyhow::Result<()> {
    init_with_writer(component, default_level, format, io::stdout)
}

/// Initialize logging to a file, creating parent directories as needed
pub fn init_to_file(
    component: &str,
    default_level: Level,
    format: LogFormat,
    log_path: &Path,
) -> anyhow::Result<()> {
    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let log_file = std::fs::OpenOptions::new().create(true).append(true).open(log_path)?;
    init_with_writer(component, default_level, format, std::sync::Mutex::new(log_file))
}

/// Initialize logging with a custom writer
pub fn init_with_writer<W>(
    component: &str,
    default_level: Level,
    format: LogFormat,
    writer: W,
) -> anyhow::Result<()>
where
    W: for<'writer> tracing_subscriber::fmt::MakeWriter<'writer> + Send + Sync + 'static,
{
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(component, default_level)));

    match format {
        LogFormat::Json => {
            let layer = tracing_subscriber::fmt::layer().with_writer(writer).json();
            #[cfg(debug_assertions)]
            let layer = layer.with_file(true).with_line_number(true);
            tracing_subscriber::registry().with(filter).with(layer).try_init()?;
        }
        LogFormat::Plaintext => {
            let layer = tracing_subscriber::fmt::layer().with_writer(writer);
            #[cfg(debug_assertions)]
            let layer = layer.with_file(true).with_line_number(true);
            tracing_subscriber::registry().with(filter).with(layer).try_init()?;
        }
    }

    Ok(())
}

/// Crate names use underscores in tracing targets
fn default_directive(component: &str, level: Level) -> String {
    format!("{},{}={}", level, component.replace('-', "_"), level)
}

/// Mask a secret in log output
///
/// ```rust
/// use rl_logging::redact;
///
/// let api_key = "sk-ant-1234";
/// tracing::info!(api_key = %redact(api_key), "LLM provider configured");
/// ```
pub fn redact(_value: impl std::fmt::Display) -> &'static str {
    "[REDACTED]"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redact_hides_value() {
        assert_eq!(redact("ghp_secret").to_string(), "[REDACTED]");
    }

    #[test]
    fn cli_level_maps_to_tracing_level() {
        assert_eq!(Level::from(CliLogLevel::Error), Level::ERROR);
        assert_eq!(Level::from(CliLogLevel::Debug), Level::DEBUG);
        assert_eq!(Level::from(CliLogLevel::default()), Level::INFO);
    }

    #[test]
    fn default_directive_uses_target_name() {
        assert_eq!(
            default_directive("rl-rest-server", Level::DEBUG),
            "DEBUG,rl_rest_server=DEBUG"
        );
    }

    #[test]
    fn stdout_when_no_file_options() {
        let args = CliLoggingArgs::default();
        assert!(args.resolve_log_path("rl-rest-server").is_none());
    }

    #[test]
    fn log_path_resolution() {
        let dir = tempfile::tempdir().unwrap();

        let only_dir = CliLoggingArgs {
            log_dir: Some(dir.path().to_path_buf()),
            ..Default::default()
        };
        assert_eq!(
            only_dir.resolve_log_path("rl-rest-server"),
            Some(dir.path().join("rl-rest-server.log"))
        );

        let relative_file = CliLoggingArgs {
            log_dir: Some(dir.path().to_path_buf()),
            log_file: Some(PathBuf::from("server.log")),
            ..Default::default()
        };
        assert_eq!(
            relative_file.resolve_log_path("x"),
            Some(dir.path().join("server.log"))
        );

        let absolute = dir.path().join("abs.log");
        let absolute_file = CliLoggingArgs {
            log_dir: Some(PathBuf::from("/ignored")),
            log_file: Some(absolute.clone()),
            ..Default::default()
        };
        assert_eq!(absolute_file.resolve_log_path("x"), Some(absolute));
    }
}
