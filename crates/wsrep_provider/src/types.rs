use wsrep_store::Gtid;

/// Result codes a provider call resolves to. These are data returned from
/// [`crate::Provider`] methods, not [`crate::ProviderError`] failures — the
/// transaction engine matches on them to decide whether to commit, retry or
/// break out to wait for `SYNCED` again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    /// The call succeeded.
    Ok,
    /// Succeeded with a caveat worth logging.
    Warning,
    /// The referenced transaction is unknown to the provider.
    TrxMissing,
    /// Soft failure; the caller should roll back and retry.
    TrxFail,
    /// A higher-priority transaction forced this one to abort while
    /// waiting in certification.
    BfAbort,
    /// Connectivity to the rest of the cluster was lost.
    ConnFail,
    /// A node failure was detected.
    NodeFail,
    /// Unrecoverable provider failure.
    Fatal,
    /// The requested operation is not implemented by this provider.
    NotImplemented,
    /// The requested operation is not allowed in the current state.
    NotAllowed,
}

impl StatusCode {
    /// Whether this status means the call fully succeeded (`Ok` or
    /// `Warning`).
    #[must_use]
    pub fn is_success(self) -> bool {
        matches!(self, Self::Ok | Self::Warning)
    }
}

/// Certification key types, from the provider's locking/conflict model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyType {
    /// A shared (read) lock that does not conflict with other shared locks.
    Shared,
    /// A reference key: this transaction read the keyed record.
    Reference,
    /// An update key: this transaction writes the keyed record.
    Update,
    /// An exclusive key: conflicts with every other key on the same value.
    Exclusive,
}

/// Data fragment types appended to a write-set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    /// Participates in the write-set's total order (the serialized
    /// operations).
    Ordered,
    /// Does not participate in ordering (diagnostic payloads).
    Unordered,
    /// Metadata attached for observability, never replayed.
    Annotation,
}

/// Flags passed to `certify`, marking a write-set's boundaries within a
/// (currently always single-statement) transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WriteSetFlags(u32);

impl WriteSetFlags {
    /// First (and, in this core, only) fragment of the transaction.
    pub const TRX_START: WriteSetFlags = WriteSetFlags(1 << 0);
    /// Last fragment of the transaction.
    pub const TRX_END: WriteSetFlags = WriteSetFlags(1 << 1);
    /// This write-set is a rollback of a previously certified one.
    pub const ROLLBACK: WriteSetFlags = WriteSetFlags(1 << 2);
    /// Requires the strongest isolation the provider can offer.
    pub const ISOLATION: WriteSetFlags = WriteSetFlags(1 << 3);

    /// Raw bitmap.
    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Whether `other`'s bits are all set in `self`.
    #[must_use]
    pub const fn contains(self, other: WriteSetFlags) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for WriteSetFlags {
    type Output = WriteSetFlags;
    fn bitor(self, rhs: WriteSetFlags) -> WriteSetFlags {
        WriteSetFlags(self.0 | rhs.0)
    }
}

/// Metadata the provider attaches to a certification result: principally
/// the GTID it assigned the write-set, `seqno <= 0` meaning "never ordered".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CertMeta {
    /// The assigned GTID. `seqno <= 0` means the write-set was never
    /// totally ordered.
    pub gtid: Gtid,
}

impl CertMeta {
    /// Whether the provider assigned this write-set a position in the
    /// total order.
    #[must_use]
    pub fn was_ordered(&self) -> bool {
        self.gtid.seqno > 0
    }
}

/// The outcome of a `certify` call: a status plus the metadata the provider
/// attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CertifyResult {
    /// Status code.
    pub status: StatusCode,
    /// Certification metadata (GTID assigned, if any).
    pub meta: CertMeta,
}

/// An owned, provider-agnostic accumulator for the keys and data fragments
/// of a local write-set.
///
/// This is the "dedicated struct passed by opaque reference" replacement
/// for stashing a raw pointer in the provider's transaction-id field: the
/// transaction engine owns one of these for the lifetime of a local
/// transaction and threads it through `append_key`/`append_data`/`certify`.
#[derive(Debug, Clone, Default)]
pub struct WriteSetHandle {
    keys: Vec<(usize, KeyType)>,
    data: Vec<(DataType, Vec<u8>)>,
}

impl WriteSetHandle {
    /// A fresh, empty write-set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a certification key for `index`.
    pub fn append_key(&mut self, index: usize, kind: KeyType) {
        self.keys.push((index, kind));
    }

    /// Appends a data fragment.
    pub fn append_data(&mut self, kind: DataType, bytes: Vec<u8>) {
        self.data.push((kind, bytes));
    }

    /// The keys appended so far.
    #[must_use]
    pub fn keys(&self) -> &[(usize, KeyType)] {
        &self.keys
    }

    /// The data fragments appended so far, in order.
    #[must_use]
    pub fn data(&self) -> &[(DataType, Vec<u8>)] {
        &self.data
    }

    /// The concatenation of every `Ordered` data fragment — what a replica
    /// replays.
    #[must_use]
    pub fn ordered_payload(&self) -> Vec<u8> {
        self.data
            .iter()
            .filter(|(kind, _)| *kind == DataType::Ordered)
            .flat_map(|(_, bytes)| bytes.iter().copied())
            .collect()
    }
}

/// Snapshot of provider-side counters, surfaced for the statistics loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProviderStats {
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
}
