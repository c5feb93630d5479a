//! Tracing setup.
//!
//! The TUI owns stdout and puts the terminal in raw mode, so while it runs
//! logs go to a file.  One-shot subcommands log to stderr.  Filtering follows
//! `RUST_LOG`, defaulting to `info`.

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing_subscriber::{fmt, EnvFilter};

/// Where log lines are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    Stderr,
    File(PathBuf),
}

impl LogTarget {
    /// Default file for TUI sessions.
    pub fn default_file() -> Self {
        Self::File(std::env::temp_dir().join("kadmin-consumer.log"))
    }
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global subscriber.  Call once, before anything logs.
pub fn init(target: &LogTarget) -> Result<()> {
    match target {
        LogTarget::Stderr => fmt()
            .with_env_filter(env_filter())
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init()
            .map_err(|e| anyhow::anyhow!(e))?,
        LogTarget::File(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("opening log file {}", path.display()))?;
            fmt()
                .with_env_filter(env_filter())
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .try_init()
                .map_err(|e| anyhow::anyhow!(e))?
        }
    }
    Ok(())
}
