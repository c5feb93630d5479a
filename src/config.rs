//! Command-line configuration.
//!
//! Every global option can also come from the environment, so a shell
//! profile can point the client at a backend once.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};

use crate::session::FormValues;

const DEFAULT_API_URL: &str = "http://localhost:8080";

#[derive(Debug, Parser)]
#[command(
    name = "kadmin-consumer",
    version,
    about = "Browse Kafka topics through a kadmin backend"
)]
pub struct Cli {
    /// Base URL of the kadmin backend, including any context path
    #[arg(long, env = "KADMIN_API_URL", default_value = DEFAULT_API_URL, global = true)]
    pub api_url: String,

    /// Log file for the interactive UI (defaults to a file in the temp dir)
    #[arg(long, env = "KADMIN_LOG_FILE", global = true)]
    pub log_file: Option<PathBuf>,

    /// HTTP request timeout in seconds
    #[arg(long, default_value_t = 10, global = true)]
    pub timeout_secs: u64,

    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Cli {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// The subcommand to run; `browse` with defaults when none was given.
    pub fn action(&self) -> Command {
        self.command
            .clone()
            .unwrap_or_else(|| Command::Browse(BrowseArgs::default()))
    }
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Open the interactive consumer panel (default)
    Browse(BrowseArgs),

    /// List topics and exit
    Topics {
        /// Kafka cluster to ask instead of the backend default
        #[arg(long)]
        source_url: Option<String>,
    },

    /// List deserializers registered with the backend and exit
    Deserializers,

    /// List consumers the backend holds open and exit
    Consumers,
}

/// Initial form contents for the consumer panel.
#[derive(Debug, Clone, Default, Args)]
pub struct BrowseArgs {
    /// Topic to consume; together with --deserializer starts immediately
    #[arg(long)]
    pub topic: Option<String>,

    /// Deserializer id
    #[arg(long)]
    pub deserializer: Option<String>,

    /// Kafka cluster to read from instead of the backend default
    #[arg(long)]
    pub source_url: Option<String>,

    /// Schema registry URL
    #[arg(long)]
    pub schema_url: Option<String>,

    /// Only show messages whose key matches
    #[arg(long)]
    pub key_filter: Option<String>,

    /// Only show messages whose body matches
    #[arg(long)]
    pub message_filter: Option<String>,

    /// Auto-refresh interval in milliseconds, 0 to disable
    #[arg(long, default_value_t = 0)]
    pub refresh_ms: u64,

    /// Messages the backend buffers for a new consumer
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..100))]
    pub queue_size: Option<u32>,
}

impl BrowseArgs {
    /// Whether enough was given to start a session without user input.
    pub fn autostart(&self) -> bool {
        self.topic.is_some() && self.deserializer.is_some()
    }

    pub fn form_values(&self) -> FormValues {
        let text = |v: &Option<String>| v.clone().unwrap_or_default();
        FormValues {
            source_url: text(&self.source_url),
            schema_url: text(&self.schema_url),
            topic: text(&self.topic),
            key_filter: text(&self.key_filter),
            message_filter: text(&self.message_filter),
            deserializer_id: text(&self.deserializer),
            refresh_interval_ms: self.refresh_ms,
            queue_size: self.queue_size,
        }
    }
}
