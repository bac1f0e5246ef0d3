//! The top-level error the binary's `main` returns, aggregating every
//! crate's own error type.

use thiserror::Error;

use wsrep_provider::ProviderError;
use wsrep_sst::SstError;
use wsrep_store::StoreError;

/// Convenience alias for fallible node operations.
pub type NodeResult<T> = Result<T, NodeError>;

/// Errors that can abort node startup or shutdown.
#[derive(Debug, Error)]
pub enum NodeError {
    /// The Store failed to open or hit an invariant violation.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The provider failed to initialize, connect, or disconnect.
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// An SST transfer could not even be started.
    #[error(transparent)]
    Sst(#[from] SstError),

    /// A CLI flag combination or configuration value is invalid.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Initialization failed for a reason not covered by another variant
    /// (e.g. the requested provider library is not the built-in none).
    #[error("initialization failed: {0}")]
    InitFailed(String),
}
