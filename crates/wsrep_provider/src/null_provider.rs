use std::path::Path;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use parking_lot::{Condvar, Mutex};
use uuid::Uuid;
use wsrep_store::{Capabilities, Gtid, MemberId, View, ViewStatus};

use crate::error::ProviderError;
use crate::provider::{ConnId, Provider, ProviderCallbacks};
use crate::types::{
    CertMeta, CertifyResult, DataType, KeyType, ProviderStats, StatusCode, WriteSetFlags,
    WriteSetHandle,
};

/// A single-node, no-op provider: always certifies optimistically, never
/// sees BF-abort or connectivity failure from its own side, and never
/// requests or donates an SST (there is never a joiner).
///
/// This is what `--provider none` selects, analogous to the teacher's
/// `MockTransport`: it gives the rest of the node a real end-to-end path to
/// exercise without any external dependency or dynamic loading.
pub struct NullProvider {
    snapshot_read_view: bool,
    self_id: MemberId,
    epoch: Mutex<Uuid>,
    seqno: AtomicI64,
    disconnected: Mutex<bool>,
    disconnect_cv: Condvar,
    stats: Mutex<ProviderStats>,
}

impl NullProvider {
    /// A provider that does not advertise snapshot-read-view support (the
    /// Store will verify reads itself at commit time).
    #[must_use]
    pub fn new() -> Self {
        Self::with_snapshot_read_view(false)
    }

    /// A provider advertising snapshot-read-view support iff `supported`.
    #[must_use]
    pub fn with_snapshot_read_view(supported: bool) -> Self {
        Self {
            snapshot_read_view: supported,
            self_id: MemberId::new(Uuid::new_v4()),
            epoch: Mutex::new(Uuid::nil()),
            seqno: AtomicI64::new(-1),
            disconnected: Mutex::new(false),
            disconnect_cv: Condvar::new(),
            stats: Mutex::new(ProviderStats::default()),
        }
    }

    fn capability_bits(&self) -> Capabilities {
        if self.snapshot_read_view {
            Capabilities::from_bits(Capabilities::SNAPSHOT_READ_VIEW)
        } else {
            Capabilities::default()
        }
    }
}

impl Default for NullProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl Provider for NullProvider {
    fn init(
        &self,
        _callbacks: Arc<dyn ProviderCallbacks>,
        current_gtid: Gtid,
        _data_dir: &Path,
        _options: &str,
    ) -> Result<(), ProviderError> {
        if !current_gtid.is_undefined() {
            *self.epoch.lock() = current_gtid.uuid;
            self.seqno.store(current_gtid.seqno, Ordering::SeqCst);
        }
        Ok(())
    }

    fn connect(&self, _name: &str, _address: &str, _bootstrap: bool) -> Result<(), ProviderError> {
        let mut epoch = self.epoch.lock();
        if epoch.is_nil() {
            *epoch = Uuid::new_v4();
            self.seqno.store(-1, Ordering::SeqCst);
        }
        *self.disconnected.lock() = false;
        Ok(())
    }

    fn disconnect(&self) -> Result<(), ProviderError> {
        *self.disconnected.lock() = true;
        self.disconnect_cv.notify_all();
        Ok(())
    }

    fn recv(&self, _conn_id: ConnId) -> StatusCode {
        let mut guard = self.disconnected.lock();
        while !*guard {
            self.disconnect_cv.wait(&mut guard);
        }
        StatusCode::ConnFail
    }

    fn append_key(&self, ws: &mut WriteSetHandle, index: usize, kind: KeyType) -> StatusCode {
        ws.append_key(index, kind);
        StatusCode::Ok
    }

    fn append_data(&self, ws: &mut WriteSetHandle, kind: DataType, bytes: Vec<u8>) -> StatusCode {
        ws.append_data(kind, bytes);
        StatusCode::Ok
    }

    fn assign_read_view(&self, _conn_id: ConnId, _read_view: Gtid) -> StatusCode {
        StatusCode::Ok
    }

    fn certify(&self, _conn_id: ConnId, ws: &WriteSetHandle, flags: WriteSetFlags) -> CertifyResult {
        debug_assert!(flags.contains(WriteSetFlags::TRX_START | WriteSetFlags::TRX_END));
        let epoch = *self.epoch.lock();
        let seqno = self.seqno.fetch_add(1, Ordering::SeqCst) + 1;
        let mut stats = self.stats.lock();
        stats.write_sets_replicated += 1;
        stats.bytes_replicated += ws.ordered_payload().len() as u64;
        CertifyResult {
            status: StatusCode::Ok,
            meta: CertMeta {
                gtid: Gtid { uuid: epoch, seqno },
            },
        }
    }

    fn commit_order_enter(&self, _conn_id: ConnId, _meta: CertMeta) -> StatusCode {
        StatusCode::Ok
    }

    fn commit_order_leave(&self, _conn_id: ConnId, _meta: CertMeta, _error: Option<&[u8]>) -> StatusCode {
        StatusCode::Ok
    }

    fn release(&self, _conn_id: ConnId, _ws: WriteSetHandle) -> StatusCode {
        StatusCode::Ok
    }

    fn sst_sent(&self, _state_id: Gtid, _status: i32) {}

    fn sst_received(&self, _state_id: Gtid, _status: i32) {}

    fn capabilities(&self) -> Capabilities {
        self.capability_bits()
    }

    fn stats(&self) -> ProviderStats {
        *self.stats.lock()
    }
}

impl NullProvider {
    /// Delivers a bootstrap view synchronously: a single-member primary
    /// component containing only this node, advancing the epoch's GTID
    /// from undefined to seqno 0 (or by one, on a reconnect).
    ///
    /// The real provider ABI delivers this asynchronously through the
    /// `view` callback; `NullProvider` has no background thread to do that
    /// from, so `wsrep_node`'s startup sequence calls this directly after
    /// `connect` succeeds.
    pub fn bootstrap_view(&self, callbacks: &dyn ProviderCallbacks) {
        let epoch = *self.epoch.lock();
        let next_seqno = self.seqno.fetch_add(1, Ordering::SeqCst) + 1;
        let view = View {
            members: vec![self.self_id],
            state_id: Gtid {
                uuid: epoch,
                seqno: next_seqno,
            },
            status: ViewStatus::Primary,
            capabilities: self.capability_bits(),
            own_index: 0,
            protocol_version: 1,
        };
        callbacks.on_connected(view.state_id);
        callbacks.on_view(&view);
        callbacks.on_synced();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    struct RecordingCallbacks {
        views: Mutex<Vec<View>>,
        synced: AtomicUsize,
    }

    impl RecordingCallbacks {
        fn new() -> Self {
            Self {
                views: Mutex::new(Vec::new()),
                synced: AtomicUsize::new(0),
            }
        }
    }

    impl ProviderCallbacks for RecordingCallbacks {
        fn on_connected(&self, _state_id: Gtid) {}
        fn on_view(&self, view: &View) {
            self.views.lock().push(view.clone());
        }
        fn on_synced(&self) {
            self.synced.fetch_add(1, Ordering::SeqCst);
        }
        fn on_apply(&self, _write_set: Option<&[u8]>, _meta: CertMeta) -> StatusCode {
            StatusCode::Ok
        }
        fn on_sst_request(&self, _joiner_address: &str) {}
        fn on_sst_donate(&self, _bypass: bool) {}
        fn on_log(&self, _level: tracing::Level, _message: &str) {}
    }

    #[test]
    fn bootstrap_delivers_seqno_zero_view() {
        let provider = NullProvider::new();
        provider.connect("n1", "", true).unwrap();
        let callbacks = RecordingCallbacks::new();
        provider.bootstrap_view(&callbacks);
        let views = callbacks.views.lock();
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].state_id.seqno, 0);
        assert_eq!(callbacks.synced.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn certify_assigns_increasing_seqnos() {
        let provider = NullProvider::new();
        provider.connect("n1", "", true).unwrap();
        let ws = WriteSetHandle::new();
        let first = provider.certify(1, &ws, WriteSetFlags::TRX_START | WriteSetFlags::TRX_END);
        let second = provider.certify(1, &ws, WriteSetFlags::TRX_START | WriteSetFlags::TRX_END);
        assert_eq!(second.meta.gtid.seqno, first.meta.gtid.seqno + 1);
    }

    #[test]
    fn recv_returns_conn_fail_after_disconnect() {
        let provider = Arc::new(NullProvider::new());
        provider.connect("n1", "", true).unwrap();
        let p2 = provider.clone();
        let handle = std::thread::spawn(move || p2.recv(1));
        std::thread::sleep(std::time::Duration::from_millis(20));
        provider.disconnect().unwrap();
        assert_eq!(handle.join().unwrap(), StatusCode::ConnFail);
    }
}
