use thiserror::Error;

/// Errors surfaced by the SST subsystem.
///
/// Socket I/O failures never abort the process — the provider is always
/// notified exactly once per SST, with a negative status, and arbitrates
/// recovery itself.
#[derive(Debug, Error)]
pub enum SstError {
    /// Underlying socket or listener I/O failure.
    #[error("sst io error: {0}")]
    Io(#[from] std::io::Error),

    /// Fewer bytes were available than the frame's length prefix promised.
    #[error("short read during sst framing")]
    ShortRead,

    /// Not all bytes of a frame could be written.
    #[error("short write during sst framing")]
    ShortWrite,

    /// A payload was too large to fit the 32-bit frame length.
    #[error("payload of {0} bytes exceeds the 32-bit sst frame length")]
    PayloadTooLarge(usize),

    /// The Store rejected a snapshot operation.
    #[error(transparent)]
    Store(#[from] wsrep_store::StoreError),

    /// The worker thread panicked or was dropped before reporting that it
    /// had taken ownership of its handles.
    #[error("sst worker thread did not report readiness")]
    WorkerNotReady,
}

/// Convenience alias for operations that can fail with an [`SstError`].
pub type SstResult<T> = Result<T, SstError>;
