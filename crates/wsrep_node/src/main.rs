//! Reference write-set-replicated node: wires the Store, a provider, the
//! transaction engine and the SST subsystem together into a long-running
//! process (see the module docs on [`context`] for the callback wiring).
//!
//! Startup sequence: open the Store, construct the provider and the node
//! context, `init`/`connect` the provider, bootstrap a view directly when
//! running single-node against the built-in provider (it has no background
//! thread to deliver that callback asynchronously), start the slave and
//! master worker pools, then loop printing periodic stats until a shutdown
//! signal arrives.

mod cli;
mod config;
mod context;
mod error;
mod pool;
mod stats;

use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, LogFormat};
use config::NodeConfig;
use context::NodeContext;
use error::{NodeError, NodeResult};
use pool::WorkerPool;
use stats::NodeStats;
use wsrep_provider::{NullProvider, Provider, ProviderCallbacks};
use wsrep_store::Store;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.log_format);
    let config = cli.into_config();

    match run(config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(file = file!(), line = line!(), error = %e, "fatal: node failed to start");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbosity: u8, format: LogFormat) {
    let level = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Text => subscriber.init(),
        LogFormat::Json => subscriber.json().init(),
    }
}

/// Runs the node to completion, returning once a shutdown signal has been
/// handled and every worker has been joined.
fn run(config: NodeConfig) -> NodeResult<()> {
    if let Some(path) = &config.provider {
        return Err(NodeError::InitFailed(format!(
            "dynamic provider loading is not supported; requested {path:?}, only the built-in none provider is available"
        )));
    }

    let store = Arc::new(Store::open(config.store_config())?);
    let null_provider = Arc::new(NullProvider::new());
    let provider: Arc<dyn Provider> = null_provider.clone();

    let ctx = Arc::new(NodeContext::new(
        Arc::clone(&store),
        Arc::clone(&provider),
        config.base_host.clone(),
        config.sst_port(),
    ));
    let callbacks: Arc<dyn ProviderCallbacks> = Arc::clone(&ctx) as Arc<dyn ProviderCallbacks>;

    provider.init(callbacks, store.current_gtid(), &config.data_dir, &config.options)?;
    provider.connect(&config.name, &config.address, config.bootstrap)?;
    if config.bootstrap {
        // NullProvider has no background thread to deliver this
        // asynchronously; the startup sequence delivers it directly.
        null_provider.bootstrap_view(ctx.as_ref());
    }

    let slaves = WorkerPool::start_slaves(Arc::clone(&ctx), config.slaves);
    let masters = WorkerPool::start_masters(Arc::clone(&ctx), config.masters, config.operations, config.delay_ms);

    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let shutdown = Arc::clone(&shutdown);
        ctrlc::set_handler(move || shutdown.store(true, Ordering::SeqCst))
            .map_err(|e| NodeError::InitFailed(format!("failed to install signal handler: {e}")))?;
    }

    stats_loop(&store, provider.as_ref(), &config, &shutdown);

    tracing::info!("shutting down");
    if let Err(e) = provider.disconnect() {
        tracing::error!(error = %e, "provider disconnect failed during shutdown");
    }
    slaves.stop();
    masters.stop();
    tracing::info!("shutdown complete");
    Ok(())
}

/// Blocks until `shutdown` is observed, printing one stats line every
/// `config.stats_period_secs` (spec.md §7 "User-visible failure behavior").
fn stats_loop(store: &Store, provider: &dyn Provider, config: &NodeConfig, shutdown: &AtomicBool) {
    const POLL: Duration = Duration::from_millis(100);
    let period = Duration::from_secs(config.stats_period_secs.max(1));
    let mut last = Instant::now();
    while !shutdown.load(Ordering::SeqCst) {
        thread::sleep(POLL);
        if last.elapsed() >= period {
            NodeStats::collect(store, provider).log(store.current_gtid());
            last = Instant::now();
        }
    }
}
