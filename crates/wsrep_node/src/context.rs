//! The node's callback surface: implements [`ProviderCallbacks`] and wires
//! the Store, the SST subsystem, and the transaction engine together behind
//! one shared object.
//!
//! This is the explicit node context the design notes (spec.md §9) call
//! for in place of the original's global singletons: every callback the
//! provider drives us through receives `&self` here instead of reaching
//! into module-level statics.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use wsrep_provider::{CertMeta, ConnId, Provider, ProviderCallbacks, StatusCode, SyncedLatch, ViewCache};
use wsrep_store::{Gtid, Store, View};
use wsrep_txn::{run_slave, TxnOutcome};

/// Shared node state threaded through every provider callback and worker.
pub struct NodeContext {
    store: Arc<Store>,
    provider: Arc<dyn Provider>,
    view_cache: ViewCache,
    synced: SyncedLatch,
    conn_ids: AtomicU64,
    sst_host: String,
    sst_port: u16,
}

impl NodeContext {
    /// Builds a fresh context. `sst_host`/`sst_port` are the joiner
    /// rendezvous endpoint this node listens on when asked to donate-by-
    /// fetching (spec.md §4.4 "Rendezvous").
    #[must_use]
    pub fn new(store: Arc<Store>, provider: Arc<dyn Provider>, sst_host: String, sst_port: u16) -> Self {
        Self {
            store,
            provider,
            view_cache: ViewCache::new(),
            synced: SyncedLatch::new(),
            conn_ids: AtomicU64::new(1),
            sst_host,
            sst_port,
        }
    }

    /// The Store this context drives.
    #[must_use]
    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    /// The provider this context is registered with.
    #[must_use]
    pub fn provider(&self) -> &Arc<dyn Provider> {
        &self.provider
    }

    /// The `SYNCED` latch master/slave workers block on.
    #[must_use]
    pub fn synced(&self) -> &SyncedLatch {
        &self.synced
    }

    /// The most recently delivered view, if any.
    #[must_use]
    pub fn current_view(&self) -> Option<View> {
        self.view_cache.current()
    }

    /// Allocates a fresh per-worker connection id, scoped to this process.
    pub fn next_conn_id(&self) -> ConnId {
        self.conn_ids.fetch_add(1, Ordering::Relaxed)
    }
}

impl ProviderCallbacks for NodeContext {
    fn on_connected(&self, state_id: Gtid) {
        tracing::debug!(state_id = %state_id, "connected to group");
    }

    fn on_view(&self, view: &View) {
        if view.is_primary() {
            if let Err(e) = self.store.update_membership(view) {
                tracing::error!(file = file!(), line = line!(), error = %e, "fatal: invariant violation applying view");
                std::process::exit(1);
            }
        } else {
            tracing::warn!(status = ?view.status, "received non-primary view");
        }
        self.view_cache.replace(view.clone());
    }

    fn on_synced(&self) {
        tracing::info!("node synced with the group");
        self.synced.signal_synced();
    }

    fn on_apply(&self, write_set: Option<&[u8]>, meta: CertMeta) -> StatusCode {
        let conn_id = self.next_conn_id();
        match run_slave(&self.store, self.provider.as_ref(), conn_id, write_set, meta) {
            TxnOutcome::Committed(_) => StatusCode::Ok,
            TxnOutcome::SoftFailed => StatusCode::TrxFail,
            TxnOutcome::ConnFailed => StatusCode::ConnFail,
            TxnOutcome::Fatal(e) => {
                tracing::error!(file = file!(), line = line!(), error = %e, "fatal: slave apply failed");
                StatusCode::Fatal
            }
        }
    }

    fn on_sst_request(&self, joiner_address: &str) {
        let result = wsrep_sst::spawn_donor(
            Arc::clone(&self.store),
            Arc::clone(&self.provider),
            joiner_address.to_string(),
            false,
        );
        if let Err(e) = result {
            tracing::error!(error = %e, "failed to start sst donor worker");
        }
    }

    fn on_sst_donate(&self, bypass: bool) {
        if bypass {
            wsrep_sst::spawn_bypass_joiner(Arc::clone(&self.store), Arc::clone(&self.provider));
            return;
        }
        let result = wsrep_sst::spawn_joiner(
            Arc::clone(&self.store),
            Arc::clone(&self.provider),
            self.sst_host.clone(),
            self.sst_port,
        );
        if let Err(e) = result {
            tracing::error!(error = %e, "failed to start sst joiner worker");
        }
    }

    fn on_log(&self, level: tracing::Level, message: &str) {
        match level {
            tracing::Level::ERROR => tracing::error!(target: "wsrep_provider", "{message}"),
            tracing::Level::WARN => tracing::warn!(target: "wsrep_provider", "{message}"),
            tracing::Level::INFO => tracing::info!(target: "wsrep_provider", "{message}"),
            tracing::Level::DEBUG => tracing::debug!(target: "wsrep_provider", "{message}"),
            tracing::Level::TRACE => tracing::trace!(target: "wsrep_provider", "{message}"),
        }
    }
}
