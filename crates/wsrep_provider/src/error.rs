use thiserror::Error;

/// Errors surfaced by the provider adapter layer, distinct from the status
/// codes a [`crate::Provider`] call returns (those are data, not failures —
/// see [`crate::StatusCode`]).
#[derive(Debug, Error)]
pub enum ProviderError {
    /// A call was made on a provider that is not connected.
    #[error("provider is disconnected")]
    Disconnected,

    /// The provider was asked to perform an operation it does not support.
    #[error("not implemented: {0}")]
    NotImplemented(&'static str),

    /// Initialization failed before a connection was ever attempted.
    #[error("provider initialization failed: {0}")]
    InitFailed(String),
}
