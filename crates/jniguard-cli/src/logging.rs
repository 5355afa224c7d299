//! Tracing setup for the command line
//!
//! Logs go to stderr so they never mix with a report on stdout, or to a file
//! with `--log-file`. Directives in `JNIGUARD_LOG` refine the `--log-level`
//! default, e.g. `JNIGUARD_LOG=jniguard_core::engine=trace`.

use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use clap::ValueEnum;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, fmt::writer::BoxMakeWriter, prelude::*};

use crate::Cli;

const LOG_ENV: &str = "JNIGUARD_LOG";
const DEFAULT_LOG_FILE: &str = "jniguard.log";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_tracing_level(&self) -> tracing::Level {
        match self {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

/// Installs the global subscriber. The returned guard flushes the file
/// writer and must outlive the run.
pub fn init_logging(cli: &Cli) -> Option<WorkerGuard> {
    let filter = EnvFilter::builder()
        .with_default_directive(cli.log_level.as_tracing_level().into())
        .with_env_var(LOG_ENV)
        .from_env_lossy();

    let (writer, guard, ansi) = match &cli.log_file {
        Some(path) => {
            let (dir, file) = log_destination(path);
            let appender = tracing_appender::rolling::never(dir, file);
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            (BoxMakeWriter::new(non_blocking), Some(guard), false)
        }
        None => (
            BoxMakeWriter::new(std::io::stderr),
            None,
            std::io::stderr().is_terminal(),
        ),
    };

    let registry = tracing_subscriber::registry().with(filter);
    if cli.log_json {
        registry
            .with(fmt::layer().json().with_writer(writer))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_writer(writer)
                    .with_ansi(ansi)
                    .with_target(false),
            )
            .init();
    }

    guard
}

/// Splits `--log-file` into directory and file name. A directory gets a
/// `jniguard.log` inside it.
fn log_destination(path: &Path) -> (PathBuf, String) {
    if path.is_dir() {
        return (path.to_path_buf(), DEFAULT_LOG_FILE.to_string());
    }

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let file = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(DEFAULT_LOG_FILE)
        .to_string();
    (dir, file)
}
