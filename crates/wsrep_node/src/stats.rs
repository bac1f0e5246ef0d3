//! The node's statistics snapshot: a merge of the Store's read-view-failure
//! counter with the provider's own counters, printed on the `period`
//! interval (spec.md §7 "User-visible failure behavior").
//!
//! Shape grounded on `entidb_core::stats::DatabaseStats` /
//! `StatsSnapshot`: atomics live behind the owning objects (`Store`,
//! `Provider`), and this module only assembles the point-in-time,
//! plain-data view printed to the log.

use wsrep_provider::Provider;
use wsrep_store::Store;

/// A point-in-time snapshot of node-wide counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NodeStats {
    /// Write-sets successfully replicated (originated locally and
    /// committed).
    pub write_sets_replicated: u64,
    /// Bytes sent as part of replicated write-sets.
    pub bytes_replicated: u64,
    /// Write-sets received and applied from remote origin.
    pub write_sets_received: u64,
    /// Bytes received as part of applied write-sets.
    pub bytes_received: u64,
    /// Certification failures observed (`TRX_FAIL`/`BF_ABORT`).
    pub certification_failures: u64,
    /// Milliseconds spent paused by flow control.
    pub flow_control_paused_ms: u64,
    /// Store-side read-view verification failures.
    pub read_view_failures: u64,
}

impl NodeStats {
    /// Assembles a snapshot from the Store's counters and the provider's
    /// own reported stats.
    #[must_use]
    pub fn collect(store: &Store, provider: &dyn Provider) -> Self {
        let provider_stats = provider.stats();
        Self {
            write_sets_replicated: provider_stats.write_sets_replicated,
            bytes_replicated: provider_stats.bytes_replicated,
            write_sets_received: provider_stats.write_sets_received,
            bytes_received: provider_stats.bytes_received,
            certification_failures: provider_stats.certification_failures,
            flow_control_paused_ms: provider_stats.flow_control_paused_ms,
            read_view_failures: store.read_view_failures(),
        }
    }

    /// Logs this snapshot as one structured `tracing::info!` line, the way
    /// the reference node's periodic stats print is described (spec.md §7).
    pub fn log(&self, gtid: wsrep_store::Gtid) {
        tracing::info!(
            gtid = %gtid,
            write_sets_replicated = self.write_sets_replicated,
            bytes_replicated = self.bytes_replicated,
            write_sets_received = self.write_sets_received,
            bytes_received = self.bytes_received,
            certification_failures = self.certification_failures,
            flow_control_paused_ms = self.flow_control_paused_ms,
            read_view_failures = self.read_view_failures,
            "node stats"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wsrep_provider::NullProvider;
    use wsrep_store::StoreConfig;

    #[test]
    fn collects_zeroed_stats_on_a_fresh_node() {
        let store = Store::open(StoreConfig {
            records: 4,
            ws_size: 256,
            operations: 1,
            min_op_size: 16,
        })
        .unwrap();
        let provider = NullProvider::new();
        let stats = NodeStats::collect(&store, &provider);
        assert_eq!(stats, NodeStats::default());
    }
}
