use thiserror::Error;
use wsrep_store::StoreError;

/// Errors surfaced by the transaction engine.
///
/// Distinct from [`crate::TxnOutcome`]: an `Err` here means something the
/// engine itself could not make sense of (a malformed write-set, a Store
/// invariant violation); `TxnOutcome` is the classification of an otherwise
/// well-formed lifecycle's result.
#[derive(Debug, Error)]
pub enum TxnError {
    /// The Store rejected an operation as an invariant violation.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A remote write-set buffer was too short to contain the read-view
    /// prefix, or its operation payload was malformed.
    #[error("malformed write-set: {0}")]
    MalformedWriteSet(String),
}

/// Convenience alias for operations that can fail with a [`TxnError`].
pub type TxnResult<T> = Result<T, TxnError>;
