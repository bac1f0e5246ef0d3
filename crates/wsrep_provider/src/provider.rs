use std::path::Path;
use std::sync::Arc;

use wsrep_store::{Capabilities, Gtid, View};

use crate::error::ProviderError;
use crate::types::{CertifyResult, KeyType, DataType, ProviderStats, StatusCode, WriteSetFlags, WriteSetHandle};

/// A connection/transaction identifier, scoped to one worker's lifetime.
pub type ConnId = u64;

/// The callback surface a [`Provider`] drives the node through.
///
/// Implemented by `wsrep_node`'s node context and handed to the provider at
/// [`Provider::init`] time, mirroring how the teacher's sync engine is
/// handed an applier it drives through `SyncApplier`.
pub trait ProviderCallbacks: Send + Sync {
    /// The group state-id became known, out of order. Informational only.
    fn on_connected(&self, state_id: Gtid);

    /// A new view was delivered, in total order. Implementations that see a
    /// `PRIMARY` view are expected to call `Store::update_membership`
    /// before returning.
    fn on_view(&self, view: &View);

    /// The node has caught up with the cluster and may originate writes.
    fn on_synced(&self);

    /// A remote write-set is ready to be applied. `seqno <= 0` in the
    /// returned status's metadata is only meaningful via the caller's own
    /// bookkeeping; this callback just hands over the payload (empty means
    /// "ordered but not certified", i.e. apply an empty transaction
    /// context).
    fn on_apply(&self, write_set: Option<&[u8]>, meta: crate::types::CertMeta) -> StatusCode;

    /// The provider asked this node to donate state to a joiner whose
    /// rendezvous address is `joiner_address`.
    fn on_sst_request(&self, joiner_address: &str);

    /// The provider asked this node (the joiner) to fetch state.
    fn on_sst_donate(&self, bypass: bool);

    /// A provider log line, forwarded to the process logger.
    fn on_log(&self, level: tracing::Level, message: &str);
}

/// The contract this node depends on from the write-set replication
/// provider.
///
/// This is a capability object handed to the binary at construction time
/// (per the dynamic-library-loading redesign note) rather than a `dlopen`'d
/// handle: whoever builds the node supplies an `Arc<dyn Provider>`.
pub trait Provider: Send + Sync {
    /// Initializes the provider with the callback surface it should drive
    /// the node through, the current GTID, and opaque `options`.
    fn init(
        &self,
        callbacks: Arc<dyn ProviderCallbacks>,
        current_gtid: Gtid,
        data_dir: &Path,
        options: &str,
    ) -> Result<(), ProviderError>;

    /// Connects to the cluster at `address` (empty meaning "none given"),
    /// optionally bootstrapping a new primary component.
    fn connect(&self, name: &str, address: &str, bootstrap: bool) -> Result<(), ProviderError>;

    /// Disconnects from the cluster. Unblocks slave workers waiting in
    /// [`Provider::recv`], which is how the node notices the loss and flips
    /// its own `SYNCED` latch to disconnected in turn.
    fn disconnect(&self) -> Result<(), ProviderError>;

    /// Blocks the calling slave worker, dispatching to `on_apply`/`on_view`
    /// callbacks as events arrive, until disconnect.
    fn recv(&self, conn_id: ConnId) -> StatusCode;

    /// Appends a certification key to `ws`.
    fn append_key(&self, ws: &mut WriteSetHandle, index: usize, kind: KeyType) -> StatusCode;

    /// Appends a data fragment to `ws`.
    fn append_data(&self, ws: &mut WriteSetHandle, kind: DataType, bytes: Vec<u8>) -> StatusCode;

    /// Informs the provider of the read view this transaction observed, if
    /// it advertises snapshot-read-view support.
    fn assign_read_view(&self, conn_id: ConnId, read_view: Gtid) -> StatusCode;

    /// Submits `ws` for certification.
    fn certify(&self, conn_id: ConnId, ws: &WriteSetHandle, flags: WriteSetFlags) -> CertifyResult;

    /// Enters the provider-enforced commit-order critical section for a
    /// certified write-set.
    fn commit_order_enter(&self, conn_id: ConnId, meta: crate::types::CertMeta) -> StatusCode;

    /// Leaves the commit-order critical section. `error` carries a
    /// diagnostic payload when the apply/commit failed.
    fn commit_order_leave(
        &self,
        conn_id: ConnId,
        meta: crate::types::CertMeta,
        error: Option<&[u8]>,
    ) -> StatusCode;

    /// Releases a write-set handle after its outcome has been fully
    /// resolved.
    fn release(&self, conn_id: ConnId, ws: WriteSetHandle) -> StatusCode;

    /// Notifies the provider that this node finished donating state as
    /// `state_id`, with `status == 0` meaning success.
    fn sst_sent(&self, state_id: Gtid, status: i32);

    /// Notifies the provider that this node finished receiving/installing
    /// state as `state_id`, with `status == 0` meaning success.
    fn sst_received(&self, state_id: Gtid, status: i32);

    /// The provider's advertised capabilities.
    fn capabilities(&self) -> Capabilities;

    /// A snapshot of provider-side counters.
    fn stats(&self) -> ProviderStats;
}
