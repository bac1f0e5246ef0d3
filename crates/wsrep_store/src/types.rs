use std::fmt;

use uuid::Uuid;

/// A global transaction id: an epoch `uuid` plus a monotonically increasing
/// `seqno` within that epoch.
///
/// `seqno` is signed because the "undefined" GTID used before the first view
/// is delivered is represented as `seqno = -1`; every applied GTID afterward
/// is non-negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Gtid {
    /// Epoch identifier. `Uuid::nil()` only ever appears paired with
    /// `seqno == -1`.
    pub uuid: Uuid,
    /// Sequence number within `uuid`'s epoch.
    pub seqno: i64,
}

impl Gtid {
    /// The distinguished "undefined" GTID used before the Store has ever
    /// seen a view.
    pub const UNDEFINED: Gtid = Gtid {
        uuid: Uuid::nil(),
        seqno: -1,
    };

    /// Whether this is the undefined GTID.
    #[must_use]
    pub fn is_undefined(&self) -> bool {
        *self == Self::UNDEFINED
    }

    /// The GTID one step past this one, in the same epoch.
    #[must_use]
    pub fn next(&self) -> Gtid {
        Gtid {
            uuid: self.uuid,
            seqno: self.seqno + 1,
        }
    }
}

impl fmt::Display for Gtid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.uuid, self.seqno)
    }
}

impl Default for Gtid {
    fn default() -> Self {
        Self::UNDEFINED
    }
}

/// Identifies one node in the cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MemberId(pub Uuid);

impl MemberId {
    /// Wraps a raw uuid as a member id.
    #[must_use]
    pub const fn new(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// The 16 raw bytes of the underlying uuid.
    #[must_use]
    pub fn as_bytes(&self) -> [u8; 16] {
        *self.0.as_bytes()
    }
}

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// A fixed-size record: the last committing seqno that wrote it, and its
/// value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Record {
    /// Seqno of the write-set that last committed this record, or `-1` if
    /// the record has never been written since the Store was opened.
    pub version: i64,
    /// The record's current value.
    pub value: u32,
}

impl Record {
    /// The record's initial state: undefined version, value as given.
    #[must_use]
    pub const fn initial(value: u32) -> Self {
        Self { version: -1, value }
    }
}

/// A view's membership status as delivered by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewStatus {
    /// This node is part of a primary component and may originate writes.
    Primary,
    /// This node is part of a non-primary component.
    NonPrimary,
    /// This node has lost contact with the rest of the cluster.
    Disconnected,
}

/// Capability bitmap advertised by a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities(u32);

impl Capabilities {
    /// The provider supports read-view-aware certification, so the Store
    /// does not need to verify reads itself at commit time.
    pub const SNAPSHOT_READ_VIEW: u32 = 1 << 0;

    /// Builds a capability set from a raw bitmap.
    #[must_use]
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    /// The raw bitmap.
    #[must_use]
    pub const fn bits(&self) -> u32 {
        self.0
    }

    /// Whether the snapshot-read-view capability is advertised.
    #[must_use]
    pub const fn supports_snapshot_read_view(&self) -> bool {
        self.0 & Self::SNAPSHOT_READ_VIEW != 0
    }
}

/// A cluster membership view: who's in it, its global state-id, and this
/// node's place in it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct View {
    /// Members, in provider order. Order is significant: it is part of the
    /// committed state.
    pub members: Vec<MemberId>,
    /// The GTID identifying this view as a totally-ordered event.
    pub state_id: Gtid,
    /// Primary/non-primary/disconnected.
    pub status: ViewStatus,
    /// Capability bitmap advertised alongside the view.
    pub capabilities: Capabilities,
    /// This node's index into `members`.
    pub own_index: usize,
    /// Wire protocol version, informational.
    pub protocol_version: u32,
}

impl View {
    /// Whether this view is a primary component.
    #[must_use]
    pub fn is_primary(&self) -> bool {
        self.status == ViewStatus::Primary
    }
}
