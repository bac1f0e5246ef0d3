//! Command-line flags for the node binary.
//!
//! A single flat [`Parser`] rather than a subcommand tree — unlike the CLI
//! this pattern is borrowed from, there is only one thing this binary does
//! (run a node), so there is nothing to dispatch on.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::config::NodeConfig;

/// Output format for the node's structured logs.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable text (the default).
    #[default]
    Text,
    /// Newline-delimited JSON, one object per event.
    Json,
}

/// Run a write-set-replicated node.
#[derive(Parser, Debug)]
#[command(name = "wsrep-node")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the provider library, or omit to use the built-in no-op
    /// provider. Only the built-in is currently supported; any other value
    /// is rejected at startup.
    #[arg(long)]
    pub provider: Option<String>,

    /// Group address. Empty means "no address given".
    #[arg(long, default_value = "")]
    pub address: String,

    /// Provider-specific configuration string.
    #[arg(long, default_value = "")]
    pub options: String,

    /// Human-readable node name.
    #[arg(long)]
    pub name: String,

    /// Directory for provider state files.
    #[arg(long, default_value = "./wsrep-data")]
    pub data_dir: PathBuf,

    /// Listen host; also the SST joiner's host.
    #[arg(long, default_value = "127.0.0.1")]
    pub base_host: String,

    /// Listen port; `base-port + 2` is the SST port.
    #[arg(long, default_value_t = 4567)]
    pub base_port: u16,

    /// Master worker pool size.
    #[arg(long, default_value_t = 1)]
    pub masters: usize,

    /// Slave worker pool size.
    #[arg(long, default_value_t = 1)]
    pub slaves: usize,

    /// Desired write-set size in bytes (lower bound).
    #[arg(long, default_value_t = 256)]
    pub size: usize,

    /// Number of records in the Store.
    #[arg(long, default_value_t = 1024)]
    pub records: usize,

    /// Operations per transaction.
    #[arg(long, default_value_t = 1)]
    pub ops: usize,

    /// Inter-commit delay in milliseconds, per master thread.
    #[arg(long, default_value_t = 0)]
    pub delay: u64,

    /// Stats print interval, in seconds.
    #[arg(long, default_value_t = 10)]
    pub period: u64,

    /// Bootstrap a new primary component. Defaults to true iff `address`
    /// was not given.
    #[arg(long)]
    pub bootstrap: Option<bool>,

    /// Increase log verbosity; repeatable (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Log output format.
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

impl Cli {
    /// Builds the node's runtime configuration from parsed flags.
    #[must_use]
    pub fn into_config(self) -> NodeConfig {
        let bootstrap = self
            .bootstrap
            .unwrap_or_else(|| NodeConfig::default_bootstrap_for(&self.address));
        NodeConfig::new(self.name)
            .provider(self.provider)
            .address(self.address)
            .options(self.options)
            .data_dir(self.data_dir)
            .listen(self.base_host, self.base_port)
            .pool_sizes(self.masters, self.slaves)
            .store_shape(self.size, self.records, self.ops)
            .delay_ms(self.delay)
            .stats_period_secs(self.period)
            .bootstrap(bootstrap)
    }
}
