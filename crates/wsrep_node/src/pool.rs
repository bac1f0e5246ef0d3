//! Fixed-size thread pools for the slave and master worker roles (spec.md
//! §4.5).
//!
//! Start allocates the pool and spawns threads; if a thread fails to
//! start, the pool is truncated to whatever did start rather than failing
//! the whole node, mirroring the teacher's `SyncEngine::sync_with_retry`
//! "keep going with what succeeded" posture rather than all-or-nothing.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use wsrep_provider::SyncState;
use wsrep_txn::{run_master, TxnOutcome};

use crate::context::NodeContext;

const TRX_FAIL_RETRY_DELAY: Duration = Duration::from_millis(10);

/// A started pool of worker threads, joined on [`WorkerPool::stop`].
///
/// Master pools additionally carry a shutdown flag: nothing in the
/// provider contract guarantees `disconnect()` ever wakes a master thread
/// sitting in `run_master` (only `recv()` is guaranteed to unblock), so a
/// clean stop sets this flag directly rather than depending on that
/// happening to be true of whichever provider is in use.
pub struct WorkerPool {
    handles: Vec<JoinHandle<()>>,
    shutdown: Option<Arc<AtomicBool>>,
}

impl WorkerPool {
    /// Starts `count` slave workers, each looping on `provider.recv` until
    /// it returns a non-success status (spec.md §4.5 "Slave routine"). On
    /// exit each worker signals the shared `SYNCED` latch disconnected, so
    /// master workers waiting on it notice the same loss of contact.
    #[must_use]
    pub fn start_slaves(ctx: Arc<NodeContext>, count: usize) -> Self {
        let mut handles = Vec::with_capacity(count);
        for i in 0..count {
            let ctx = Arc::clone(&ctx);
            let spawned = thread::Builder::new()
                .name(format!("wsrep-slave-{i}"))
                .spawn(move || slave_routine(&ctx));
            match spawned {
                Ok(handle) => handles.push(handle),
                Err(e) => {
                    tracing::error!(worker = i, error = %e, "failed to start slave worker");
                    break;
                }
            }
        }
        Self { handles, shutdown: None }
    }

    /// Starts `count` master workers, each waiting for `SYNCED` before
    /// originating transactions (spec.md §4.5 "Master routine").
    #[must_use]
    pub fn start_masters(ctx: Arc<NodeContext>, count: usize, operations: usize, delay_ms: u64) -> Self {
        let shutdown = Arc::new(AtomicBool::new(false));
        let mut handles = Vec::with_capacity(count);
        for i in 0..count {
            let ctx = Arc::clone(&ctx);
            let shutdown = Arc::clone(&shutdown);
            let spawned = thread::Builder::new()
                .name(format!("wsrep-master-{i}"))
                .spawn(move || master_routine(&ctx, operations, delay_ms, &shutdown));
            match spawned {
                Ok(handle) => handles.push(handle),
                Err(e) => {
                    tracing::error!(worker = i, error = %e, "failed to start master worker");
                    break;
                }
            }
        }
        Self { handles, shutdown: Some(shutdown) }
    }

    /// Signals shutdown (for a master pool) and joins every thread that was
    /// started. Slave threads are expected to have already been released by
    /// `provider.disconnect()` unblocking `recv`.
    pub fn stop(self) {
        if let Some(shutdown) = &self.shutdown {
            shutdown.store(true, Ordering::Relaxed);
        }
        for handle in self.handles {
            let _ = handle.join();
        }
    }
}

fn slave_routine(ctx: &NodeContext) {
    let conn_id = ctx.next_conn_id();
    loop {
        let status = ctx.provider().recv(conn_id);
        if !status.is_success() {
            tracing::debug!(?status, "slave worker exiting");
            ctx.synced().signal_disconnected();
            return;
        }
    }
}

fn master_routine(ctx: &NodeContext, operations: usize, delay_ms: u64, shutdown: &AtomicBool) {
    'outer: loop {
        if ctx.synced().wait_synced() == SyncState::Disconnected {
            return;
        }
        loop {
            if shutdown.load(Ordering::Relaxed) {
                return;
            }
            let conn_id = ctx.next_conn_id();
            match run_master(ctx.store(), ctx.provider().as_ref(), conn_id, operations) {
                TxnOutcome::Committed(_) => {
                    if delay_ms > 0 {
                        thread::sleep(Duration::from_millis(delay_ms));
                    }
                }
                TxnOutcome::SoftFailed => {
                    thread::sleep(TRX_FAIL_RETRY_DELAY);
                }
                TxnOutcome::ConnFailed => {
                    ctx.synced().reset();
                    continue 'outer;
                }
                TxnOutcome::Fatal(e) => {
                    tracing::error!(file = file!(), line = line!(), error = %e, "fatal: master worker stopping");
                    return;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use wsrep_provider::{NullProvider, SyncState};
    use wsrep_store::{Store, StoreConfig};

    fn bootstrapped_ctx() -> Arc<NodeContext> {
        let store = Arc::new(
            Store::open(StoreConfig {
                records: 8,
                ws_size: 256,
                operations: 1,
                min_op_size: 16,
            })
            .unwrap(),
        );
        let provider = Arc::new(NullProvider::new());
        provider.connect("n1", "", true).unwrap();
        let ctx = Arc::new(NodeContext::new(
            store,
            provider.clone() as Arc<dyn wsrep_provider::Provider>,
            "127.0.0.1".into(),
            0,
        ));
        provider.bootstrap_view(ctx.as_ref());
        ctx
    }

    #[test]
    fn master_pool_commits_transactions_once_synced() {
        let ctx = bootstrapped_ctx();
        let before = ctx.store().current_gtid().seqno;
        let pool = WorkerPool::start_masters(Arc::clone(&ctx), 1, 1, 0);
        thread::sleep(Duration::from_millis(100));
        // stop() sets the pool's own shutdown flag; with no slave running
        // there is nothing else to flip the SYNCED latch to Disconnected.
        pool.stop();
        assert!(ctx.store().current_gtid().seqno > before);
    }

    #[test]
    fn a_disconnecting_slave_wakes_a_waiting_master() {
        let ctx = bootstrapped_ctx();
        ctx.synced().reset();
        let masters = WorkerPool::start_masters(Arc::clone(&ctx), 1, 1, 0);
        let slaves = WorkerPool::start_slaves(Arc::clone(&ctx), 1);
        thread::sleep(Duration::from_millis(20));
        ctx.provider().disconnect().unwrap();
        slaves.stop();
        masters.stop();
        assert_eq!(ctx.synced().state(), SyncState::Disconnected);
    }

    #[test]
    fn slave_pool_exits_on_disconnect() {
        let ctx = bootstrapped_ctx();
        let pool = WorkerPool::start_slaves(Arc::clone(&ctx), 2);
        thread::sleep(Duration::from_millis(20));
        ctx.provider().disconnect().unwrap();
        pool.stop();
    }
}
