//! End-to-end joiner/donor round-trips over real TCP sockets on
//! `127.0.0.1`, observed through a recording provider double modeled on the
//! `wsrep_txn` integration tests' `ScriptedProvider`.

use std::path::Path;
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;
use wsrep_provider::{
    CertMeta, CertifyResult, ConnId, DataType, KeyType, Provider, ProviderCallbacks,
    ProviderError, ProviderStats, StatusCode, WriteSetFlags, WriteSetHandle,
};
use wsrep_sst::{spawn_bypass_joiner, spawn_donor, spawn_joiner};
use wsrep_store::{Capabilities, Gtid, MemberId, Store, StoreConfig, View, ViewStatus};

/// Records the single `sst_sent`/`sst_received` call a donor/joiner worker
/// makes, so a test can block on it with a timeout instead of sleeping.
struct RecordingProvider {
    sent: std::sync::mpsc::SyncSender<(Gtid, i32)>,
    sent_status: AtomicI32,
}

impl RecordingProvider {
    fn new() -> (Self, std::sync::mpsc::Receiver<(Gtid, i32)>) {
        let (tx, rx) = std::sync::mpsc::sync_channel(1);
        (
            Self {
                sent: tx,
                sent_status: AtomicI32::new(i32::MIN),
            },
            rx,
        )
    }
}

impl Provider for RecordingProvider {
    fn init(
        &self,
        _callbacks: Arc<dyn ProviderCallbacks>,
        _current_gtid: Gtid,
        _data_dir: &Path,
        _options: &str,
    ) -> Result<(), ProviderError> {
        Ok(())
    }

    fn connect(&self, _name: &str, _address: &str, _bootstrap: bool) -> Result<(), ProviderError> {
        Ok(())
    }

    fn disconnect(&self) -> Result<(), ProviderError> {
        Ok(())
    }

    fn recv(&self, _conn_id: ConnId) -> StatusCode {
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

    fn certify(&self, _conn_id: ConnId, _ws: &WriteSetHandle, _flags: WriteSetFlags) -> CertifyResult {
        CertifyResult {
            status: StatusCode::Ok,
            meta: CertMeta {
                gtid: Gtid::UNDEFINED,
            },
        }
    }

    fn commit_order_enter(&self, _conn_id: ConnId, _meta: CertMeta) -> StatusCode {
        StatusCode::Ok
    }

    fn commit_order_leave(
        &self,
        _conn_id: ConnId,
        _meta: CertMeta,
        _error: Option<&[u8]>,
    ) -> StatusCode {
        StatusCode::Ok
    }

    fn release(&self, _conn_id: ConnId, _ws: WriteSetHandle) -> StatusCode {
        StatusCode::Ok
    }

    fn sst_sent(&self, state_id: Gtid, status: i32) {
        self.sent_status.store(status, Ordering::SeqCst);
        let _ = self.sent.send((state_id, status));
    }

    fn sst_received(&self, state_id: Gtid, status: i32) {
        self.sent_status.store(status, Ordering::SeqCst);
        let _ = self.sent.send((state_id, status));
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::default()
    }

    fn stats(&self) -> ProviderStats {
        ProviderStats::default()
    }
}

fn primed_store(epoch: Uuid, seqno: i64, members: Vec<MemberId>) -> Arc<Store> {
    let store = Store::open(StoreConfig {
        records: 6,
        ws_size: 256,
        operations: 1,
        min_op_size: 16,
    })
    .unwrap();
    store
        .update_membership(&View {
            members,
            state_id: Gtid { uuid: epoch, seqno },
            status: ViewStatus::Primary,
            capabilities: Capabilities::default(),
            own_index: 0,
            protocol_version: 1,
        })
        .unwrap();
    Arc::new(store)
}

fn recv_timeout(rx: &std::sync::mpsc::Receiver<(Gtid, i32)>) -> (Gtid, i32) {
    rx.recv_timeout(Duration::from_secs(5))
        .expect("worker did not report an outcome in time")
}

#[test]
fn full_snapshot_transfers_donor_state_to_a_fresh_joiner() {
    let epoch = Uuid::from_u128(123);
    let members = vec![MemberId::new(Uuid::from_u128(1)), MemberId::new(Uuid::from_u128(2))];
    let donor_store = primed_store(epoch, 5, members.clone());
    let joiner_store = Store::open(StoreConfig {
        records: 6,
        ws_size: 256,
        operations: 1,
        min_op_size: 16,
    })
    .map(Arc::new)
    .unwrap();

    let (donor_provider, donor_rx) = RecordingProvider::new();
    let donor_provider: Arc<dyn Provider> = Arc::new(donor_provider);
    let (joiner_provider, joiner_rx) = RecordingProvider::new();
    let joiner_provider: Arc<dyn Provider> = Arc::new(joiner_provider);

    let address = spawn_joiner(
        Arc::clone(&joiner_store),
        Arc::clone(&joiner_provider),
        "127.0.0.1".into(),
        0,
    )
    .expect("joiner failed to bind");

    spawn_donor(
        Arc::clone(&donor_store),
        Arc::clone(&donor_provider),
        address,
        false,
    )
    .expect("donor failed to start");

    let (donor_state, donor_status) = recv_timeout(&donor_rx);
    assert_eq!(donor_status, 0);
    assert_eq!(donor_state, Gtid { uuid: epoch, seqno: 5 });

    let (joiner_state, joiner_status) = recv_timeout(&joiner_rx);
    assert_eq!(joiner_status, 0);
    assert_eq!(joiner_state, Gtid { uuid: epoch, seqno: 5 });

    assert_eq!(joiner_store.current_gtid(), Gtid { uuid: epoch, seqno: 5 });
    assert!(donor_store.acquire_state().is_ok());
    donor_store.release_state().unwrap();
}

#[test]
fn bypass_donor_sends_an_empty_frame_and_joiner_leaves_state_untouched() {
    let epoch = Uuid::from_u128(456);
    let donor_store = primed_store(epoch, 9, vec![]);
    let joiner_store = Store::open(StoreConfig {
        records: 6,
        ws_size: 256,
        operations: 1,
        min_op_size: 16,
    })
    .map(Arc::new)
    .unwrap();
    let before = joiner_store.current_gtid();

    let (donor_provider, donor_rx) = RecordingProvider::new();
    let donor_provider: Arc<dyn Provider> = Arc::new(donor_provider);
    let (joiner_provider, joiner_rx) = RecordingProvider::new();
    let joiner_provider: Arc<dyn Provider> = Arc::new(joiner_provider);

    let address = spawn_joiner(
        Arc::clone(&joiner_store),
        Arc::clone(&joiner_provider),
        "127.0.0.1".into(),
        0,
    )
    .unwrap();

    spawn_donor(Arc::clone(&donor_store), donor_provider, address, true).unwrap();

    let (_, donor_status) = recv_timeout(&donor_rx);
    assert_eq!(donor_status, 0);
    let (_, joiner_status) = recv_timeout(&joiner_rx);
    assert_eq!(joiner_status, 0);

    // Bypass never touches the joiner's state.
    assert_eq!(joiner_store.current_gtid(), before);
    let _ = joiner_provider;
}

#[test]
fn provider_decided_bypass_reports_success_without_a_network_round_trip() {
    let store = Store::open(StoreConfig {
        records: 4,
        ws_size: 256,
        operations: 1,
        min_op_size: 16,
    })
    .map(Arc::new)
    .unwrap();
    let (provider, rx) = RecordingProvider::new();
    let provider: Arc<dyn Provider> = Arc::new(provider);

    spawn_bypass_joiner(Arc::clone(&store), provider);

    let (state, status) = recv_timeout(&rx);
    assert_eq!(status, 0);
    assert_eq!(state, store.current_gtid());
}
