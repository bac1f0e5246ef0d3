use wsrep_store::Gtid;

use crate::error::TxnError;

/// What a master or slave lifecycle attempt resolved to.
///
/// This is the single translation boundary the worker pool matches on
/// instead of re-deriving provider status codes (the transaction engine
/// never surfaces raw provider codes further up the stack).
#[derive(Debug)]
pub enum TxnOutcome {
    /// The write-set committed (or, on the slave path, applied) under this
    /// GTID.
    Committed(Gtid),
    /// A soft failure: read view moved, `TRX_FAIL`, or BF-abort. The caller
    /// should retry with a fresh transaction.
    SoftFailed,
    /// Connectivity to the rest of the cluster was lost. The caller should
    /// stop originating transactions until `SYNCED` is signalled again.
    ConnFailed,
    /// An invariant was violated or the provider reported an unrecoverable
    /// failure. The process should log and terminate.
    Fatal(TxnError),
}

impl TxnOutcome {
    /// Whether this outcome committed a GTID.
    #[must_use]
    pub fn committed_gtid(&self) -> Option<Gtid> {
        match self {
            Self::Committed(gtid) => Some(*gtid),
            _ => None,
        }
    }

    /// Whether this outcome calls for the worker to retry immediately
    /// (rather than break out to wait for `SYNCED` or terminate).
    #[must_use]
    pub fn is_soft_failure(&self) -> bool {
        matches!(self, Self::SoftFailed)
    }
}
