use thiserror::Error;

/// Errors surfaced by `wsrep_store`.
///
/// Every variant other than [`StoreError::Io`] corresponds to one of the
/// invariant violations the Store is responsible for catching: GTID steps
/// that don't advance by exactly one, uuid epoch mismatches, double-acquired
/// snapshots, and malformed snapshot buffers.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A precondition the Store itself is responsible for enforcing was
    /// violated (GTID step, uuid mismatch, membership disagreement,
    /// verification failure under snapshot-read-view support). Fatal.
    #[error("invariant violation: {detail}")]
    InvariantViolation {
        /// Human-readable description of what was violated.
        detail: String,
    },

    /// `acquire_state` was called while a snapshot was already held.
    #[error("a state snapshot is already acquired")]
    AlreadyAcquired,

    /// Allocation of the record array failed.
    #[error("out of memory allocating {requested} records")]
    OutOfMemory {
        /// Number of records the caller asked for.
        requested: usize,
    },

    /// A snapshot buffer could not be parsed.
    #[error("invalid snapshot: {detail}")]
    InvalidSnapshot {
        /// Human-readable description of the parse failure.
        detail: String,
    },

    /// Byte-level I/O failure while encoding or decoding a snapshot buffer.
    #[error("snapshot io error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// Builds an [`StoreError::InvariantViolation`] from any displayable
    /// detail.
    pub fn invariant(detail: impl Into<String>) -> Self {
        Self::InvariantViolation {
            detail: detail.into(),
        }
    }

    /// Builds an [`StoreError::InvalidSnapshot`] from any displayable
    /// detail.
    pub fn invalid_snapshot(detail: impl Into<String>) -> Self {
        Self::InvalidSnapshot {
            detail: detail.into(),
        }
    }

    /// Whether this error kind is the fatal "invariant violation" kind,
    /// versus one the caller might reasonably recover from (e.g. a re-entry
    /// or a malformed buffer it rejected).
    #[must_use]
    pub fn is_invariant_violation(&self) -> bool {
        matches!(self, Self::InvariantViolation { .. })
    }
}
