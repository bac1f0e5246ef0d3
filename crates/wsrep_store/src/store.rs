use parking_lot::Mutex;
use rand::Rng;

use crate::error::StoreError;
use crate::snapshot::Snapshot;
use crate::types::{Gtid, MemberId, Record, View};
use crate::StoreResult;

/// Every ~2^20 committed seqnos, a state checksum is logged for cheap
/// cross-node divergence detection.
const CHECKSUM_PERIOD: u64 = 1 << 20;

/// Configuration the Store is opened with.
#[derive(Debug, Clone, Copy)]
pub struct StoreConfig {
    /// Number of records in the store.
    pub records: usize,
    /// Desired write-set size in bytes (a lower bound on the padding
    /// computation below).
    pub ws_size: usize,
    /// Operations per transaction.
    pub operations: usize,
    /// Floor on the per-operation nominal size, regardless of `ws_size` and
    /// `operations`.
    pub min_op_size: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            records: 1024,
            ws_size: 256,
            operations: 1,
            min_op_size: 16,
        }
    }
}

impl StoreConfig {
    /// The per-operation nominal size used to pad serialized operations to
    /// a configured write-set footprint.
    #[must_use]
    pub fn op_nominal_size(&self) -> usize {
        let even_share = self.ws_size / self.operations.max(1);
        self.min_op_size.max(even_share)
    }
}

/// One step of a transaction: copy `src`'s value (plus one) into `dst`.
///
/// Carries the values observed when the operation was prepared so that a
/// non-snapshot-aware commit path can verify nothing else wrote either slot
/// in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Operation {
    /// Source record index.
    pub src: usize,
    /// Destination record index.
    pub dst: usize,
    /// `records[src].value` at prepare time.
    pub src_value: u32,
    /// `records[dst].value` at prepare time.
    pub dst_value: u32,
    /// The value to write to `records[dst]` on commit.
    pub new_value: u32,
}

impl Operation {
    /// Serializes one operation: `u32 src, u32 dst, u32 src_value, u32
    /// dst_value, u32 new_value`, network order. This is the "nominal
    /// serialized size" unit the write-set padding computation in
    /// [`StoreConfig::op_nominal_size`] is measured against.
    #[must_use]
    pub fn encode(&self) -> [u8; 20] {
        let mut out = [0u8; 20];
        out[0..4].copy_from_slice(&(self.src as u32).to_be_bytes());
        out[4..8].copy_from_slice(&(self.dst as u32).to_be_bytes());
        out[8..12].copy_from_slice(&self.src_value.to_be_bytes());
        out[12..16].copy_from_slice(&self.dst_value.to_be_bytes());
        out[16..20].copy_from_slice(&self.new_value.to_be_bytes());
        out
    }
}

/// The owned local transaction context: the read-view GTID captured at the
/// first operation, plus the operations prepared so far.
///
/// This is the struct the opaque handle in the original provider ABI would
/// have pointed to; here it is just an owned value the caller threads
/// through `begin_or_extend_op`, `commit`, `rollback` and `apply`.
#[derive(Debug, Clone)]
pub struct TxnHandle {
    read_view: Gtid,
    ops: Vec<Operation>,
}

impl TxnHandle {
    /// The GTID captured when this transaction's first operation executed
    /// (or, for a remote write-set, the GTID it was generated against).
    #[must_use]
    pub fn read_view(&self) -> Gtid {
        self.read_view
    }

    /// The operations prepared (or deserialized) so far, in order.
    #[must_use]
    pub fn operations(&self) -> &[Operation] {
        &self.ops
    }

    /// Serializes the operation sequence for inclusion in a write-set.
    /// Layout per operation: `u32 src, u32 dst, u32 src_value, u32 dst_value,
    /// u32 new_value`, network order.
    #[must_use]
    pub fn encode_operations(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.ops.len() * 20);
        for op in &self.ops {
            out.extend_from_slice(&op.encode());
        }
        out
    }

    fn decode_operations(buf: &[u8]) -> StoreResult<Vec<Operation>> {
        if buf.len() % 20 != 0 {
            return Err(StoreError::invalid_snapshot(
                "write-set operation buffer is not a multiple of the operation width",
            ));
        }
        let mut ops = Vec::with_capacity(buf.len() / 20);
        for chunk in buf.chunks_exact(20) {
            let src = u32::from_be_bytes(chunk[0..4].try_into().unwrap()) as usize;
            let dst = u32::from_be_bytes(chunk[4..8].try_into().unwrap()) as usize;
            let src_value = u32::from_be_bytes(chunk[8..12].try_into().unwrap());
            let dst_value = u32::from_be_bytes(chunk[12..16].try_into().unwrap());
            let new_value = u32::from_be_bytes(chunk[16..20].try_into().unwrap());
            ops.push(Operation {
                src,
                dst,
                src_value,
                dst_value,
                new_value,
            });
        }
        Ok(ops)
    }
}

/// What `begin_or_extend_op` produced.
#[derive(Debug, Clone, Copy)]
pub enum PrepareOutcome {
    /// The operation was prepared against a still-valid read view.
    Ready(Operation),
    /// The record(s) touched have moved past the transaction's read view;
    /// the caller must roll the transaction back.
    ReadViewMoved,
}

/// What `commit` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    /// Records were written and the GTID advanced.
    Committed,
    /// The recorded read values no longer match current records and the
    /// provider does not advertise snapshot support; the transaction was
    /// not applied. The caller must roll back and, separately, advance the
    /// GTID with `update_gtid` since the write-set was still ordered.
    ReadViewFailed,
}

struct StoreInner {
    records: Vec<Record>,
    members: Vec<MemberId>,
    gtid: Gtid,
    snapshot_read_view: bool,
    snapshot_acquired: bool,
    read_view_failures: u64,
}

impl StoreInner {
    fn random_index(&self, rng: &mut impl Rng) -> usize {
        rng.gen_range(0..self.records.len())
    }
}

/// Versioned record array, membership and GTID, behind one lock.
pub struct Store {
    config: StoreConfig,
    inner: Mutex<StoreInner>,
}

impl Store {
    /// Allocates the record array (`{version: undefined, value: index}` for
    /// each slot) and sets up an empty membership at the undefined GTID.
    ///
    /// Fails only if `config.records` is zero, which would make
    /// `begin_or_extend_op`'s index selection meaningless.
    pub fn open(config: StoreConfig) -> StoreResult<Self> {
        if config.records == 0 {
            return Err(StoreError::OutOfMemory { requested: 0 });
        }
        let records = (0..config.records)
            .map(|i| Record::initial(i as u32))
            .collect();
        Ok(Self {
            config,
            inner: Mutex::new(StoreInner {
                records,
                members: Vec::new(),
                gtid: Gtid::UNDEFINED,
                snapshot_read_view: false,
                snapshot_acquired: false,
                read_view_failures: 0,
            }),
        })
    }

    /// The configuration this Store was opened with.
    #[must_use]
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// A consistent copy of the current GTID.
    #[must_use]
    pub fn current_gtid(&self) -> Gtid {
        self.inner.lock().gtid
    }

    /// Number of read-view-verification failures observed at commit time,
    /// for observability.
    #[must_use]
    pub fn read_view_failures(&self) -> u64 {
        self.inner.lock().read_view_failures
    }

    /// Whether the current view advertises snapshot-read-view support.
    #[must_use]
    pub fn snapshot_read_view_supported(&self) -> bool {
        self.inner.lock().snapshot_read_view
    }

    /// Applies a totally-ordered membership change.
    ///
    /// The caller (the provider adapter's view callback) must only invoke
    /// this for `PRIMARY` views; passing anything else is itself an
    /// invariant violation since non-primary/disconnected views never touch
    /// the Store.
    pub fn update_membership(&self, view: &View) -> StoreResult<()> {
        if !view.is_primary() {
            return Err(StoreError::invariant(
                "update_membership called with a non-primary view",
            ));
        }
        let mut inner = self.inner.lock();
        let continues = view.state_id.uuid == inner.gtid.uuid
            && view.state_id.seqno == inner.gtid.seqno + 1;
        let initializes = inner.gtid.is_undefined();
        if !continues && !initializes {
            return Err(StoreError::invariant(format!(
                "view state-id {} does not continue current gtid {}",
                view.state_id, inner.gtid
            )));
        }
        inner.members = view.members.clone();
        inner.gtid = view.state_id;
        inner.snapshot_read_view = view.capabilities.supports_snapshot_read_view();
        Ok(())
    }

    /// Produces a self-describing snapshot of the current state and pins it
    /// until [`Store::release_state`] is called.
    ///
    /// Returns the encoded bytes together with the GTID captured in the
    /// same lock acquisition that produced them, so a caller never needs a
    /// second, independent `current_gtid()` call that could observe a
    /// commit racing in between — the pair is taken atomically.
    pub fn acquire_state(&self) -> StoreResult<(Vec<u8>, Gtid)> {
        let mut inner = self.inner.lock();
        if inner.snapshot_acquired {
            return Err(StoreError::AlreadyAcquired);
        }
        let snapshot = Snapshot {
            gtid: inner.gtid,
            members: inner.members.clone(),
            read_view_support: inner.snapshot_read_view,
            records: inner.records.clone(),
        };
        inner.snapshot_acquired = true;
        Ok((snapshot.encode(), snapshot.gtid))
    }

    /// Releases a snapshot acquired with [`Store::acquire_state`].
    pub fn release_state(&self) -> StoreResult<()> {
        let mut inner = self.inner.lock();
        if !inner.snapshot_acquired {
            return Err(StoreError::invariant("release_state without a held snapshot"));
        }
        inner.snapshot_acquired = false;
        Ok(())
    }

    /// Parses `buf` and, if its GTID is not in the past within the current
    /// epoch, replaces the Store's state atomically. Returns the installed
    /// GTID.
    pub fn init_state(&self, buf: &[u8]) -> StoreResult<Gtid> {
        let snapshot = Snapshot::decode(buf)?;
        let mut inner = self.inner.lock();
        if snapshot.gtid.uuid == inner.gtid.uuid && snapshot.gtid.seqno <= inner.gtid.seqno {
            return Err(StoreError::invariant(format!(
                "snapshot gtid {} is not ahead of current gtid {}",
                snapshot.gtid, inner.gtid
            )));
        }
        inner.records = snapshot.records;
        inner.members = snapshot.members;
        inner.snapshot_read_view = snapshot.read_view_support;
        inner.gtid = snapshot.gtid;
        Ok(inner.gtid)
    }

    /// Prepares the next operation of a local transaction, allocating a
    /// [`TxnHandle`] on the first call.
    ///
    /// Picks a random source and destination record index, reads both
    /// values, and computes `new_value = source.value + 1`. If either
    /// record's version has advanced past the transaction's read view,
    /// returns [`PrepareOutcome::ReadViewMoved`] and the caller must roll
    /// the transaction back.
    pub fn begin_or_extend_op(&self, handle: &mut Option<TxnHandle>) -> PrepareOutcome {
        let mut inner = self.inner.lock();
        let read_view = match handle {
            Some(h) => h.read_view,
            None => inner.gtid,
        };
        let mut rng = rand::thread_rng();
        let src = inner.random_index(&mut rng);
        let dst = inner.random_index(&mut rng);
        let src_rec = inner.records[src];
        let dst_rec = inner.records[dst];
        if src_rec.version > read_view.seqno || dst_rec.version > read_view.seqno {
            return PrepareOutcome::ReadViewMoved;
        }
        let op = Operation {
            src,
            dst,
            src_value: src_rec.value,
            dst_value: dst_rec.value,
            new_value: src_rec.value.wrapping_add(1),
        };
        handle
            .get_or_insert_with(|| TxnHandle {
                read_view,
                ops: Vec::new(),
            })
            .ops
            .push(op);
        PrepareOutcome::Ready(op)
    }

    /// Commits a transaction context under `ws_gtid`, which must be exactly
    /// one past the current GTID and share its epoch once the epoch is
    /// established.
    ///
    /// If the provider does not advertise snapshot-read-view support, each
    /// operation's recorded read values are compared against the current
    /// records; a mismatch yields [`CommitOutcome::ReadViewFailed`] without
    /// mutating anything, and increments the read-view-failure counter. If
    /// the provider does advertise support, the same mismatch is an
    /// invariant violation (certification should already have ruled it
    /// out).
    pub fn commit(&self, handle: TxnHandle, ws_gtid: Gtid) -> StoreResult<CommitOutcome> {
        let mut inner = self.inner.lock();
        self.check_gtid_step(&inner, ws_gtid)?;

        let mismatched = handle.ops.iter().any(|op| {
            inner.records[op.src].value != op.src_value
                || inner.records[op.dst].value != op.dst_value
        });
        if mismatched {
            if inner.snapshot_read_view {
                return Err(StoreError::invariant(
                    "read view violated despite snapshot-read-view support",
                ));
            }
            inner.read_view_failures += 1;
            return Ok(CommitOutcome::ReadViewFailed);
        }

        for op in &handle.ops {
            inner.records[op.dst] = Record {
                version: ws_gtid.seqno,
                value: op.new_value,
            };
        }
        inner.gtid = ws_gtid;
        self.maybe_log_checksum(&inner);
        Ok(CommitOutcome::Committed)
    }

    /// Advances the GTID by one step without mutating any record. Used for
    /// write-sets that were totally ordered but failed certification or
    /// were rolled back after ordering.
    pub fn update_gtid(&self, ws_gtid: Gtid) -> StoreResult<()> {
        let mut inner = self.inner.lock();
        self.check_gtid_step(&inner, ws_gtid)?;
        inner.gtid = ws_gtid;
        self.maybe_log_checksum(&inner);
        Ok(())
    }

    /// Deserializes a remote write-set's read-view GTID and operation
    /// sequence into a fresh transaction context. Does not touch records.
    pub fn apply(&self, read_view: Gtid, encoded_ops: &[u8]) -> StoreResult<TxnHandle> {
        let ops = TxnHandle::decode_operations(encoded_ops)?;
        Ok(TxnHandle { read_view, ops })
    }

    /// Releases a transaction context without advancing the GTID. If the
    /// write-set had already been totally ordered, the caller must
    /// separately call [`Store::update_gtid`].
    pub fn rollback(&self, _handle: TxnHandle) {}

    fn check_gtid_step(&self, inner: &StoreInner, ws_gtid: Gtid) -> StoreResult<()> {
        if !inner.gtid.is_undefined() && ws_gtid.uuid != inner.gtid.uuid {
            return Err(StoreError::invariant(format!(
                "write-set gtid uuid {} does not match store epoch {}",
                ws_gtid.uuid, inner.gtid.uuid
            )));
        }
        if ws_gtid.seqno != inner.gtid.seqno + 1 {
            return Err(StoreError::invariant(format!(
                "write-set seqno {} does not follow store seqno {} by exactly one",
                ws_gtid.seqno, inner.gtid.seqno
            )));
        }
        Ok(())
    }

    fn maybe_log_checksum(&self, inner: &StoreInner) {
        if inner.gtid.seqno < 0 || inner.gtid.seqno as u64 % CHECKSUM_PERIOD != 0 {
            return;
        }
        let checksum = fnv1a_checksum(&inner.members, &inner.records, inner.gtid);
        tracing::info!(seqno = inner.gtid.seqno, checksum, "state checksum");
    }
}

fn fnv1a_checksum(members: &[MemberId], records: &[Record], gtid: Gtid) -> u32 {
    const OFFSET_BASIS: u32 = 0x811c_9dc5;
    const PRIME: u32 = 0x0100_0193;
    let mut hash = OFFSET_BASIS;
    let mut feed = |bytes: &[u8]| {
        for &b in bytes {
            hash ^= u32::from(b);
            hash = hash.wrapping_mul(PRIME);
        }
    };
    for member in members {
        feed(&member.as_bytes());
    }
    for record in records {
        feed(&record.version.to_be_bytes());
        feed(&record.value.to_be_bytes());
    }
    feed(gtid.uuid.as_bytes());
    feed(&gtid.seqno.to_be_bytes());
    hash
}
