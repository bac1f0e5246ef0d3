//! The master-path write-set lifecycle: execute, append keys/data, certify,
//! commit-order-enter, commit/update-GTID, commit-order-leave.

use wsrep_provider::{
    CertMeta, ConnId, DataType, KeyType, Provider, StatusCode, WriteSetFlags, WriteSetHandle,
};
use wsrep_store::{CommitOutcome, PrepareOutcome, Store, TxnHandle};

use crate::error::TxnError;
use crate::outcome::TxnOutcome;
use crate::wire::encode_read_view;

/// Runs one master write-set lifecycle attempt: prepares `operations`
/// operations against `store`, submits the accumulated write-set to
/// `provider` for certification, and drives commit order through to a
/// final [`TxnOutcome`].
///
/// Never blocks outside calls into `provider`; callers that want the
/// ~10ms `TRX_FAIL` retry delay or the `CONN_FAIL` break-to-outer-loop
/// behaviour apply it around this call (see the worker pool).
pub fn run_master(
    store: &Store,
    provider: &dyn Provider,
    conn_id: ConnId,
    operations: usize,
) -> TxnOutcome {
    let mut handle: Option<TxnHandle> = None;
    for _ in 0..operations.max(1) {
        match store.begin_or_extend_op(&mut handle) {
            PrepareOutcome::Ready(_) => {}
            PrepareOutcome::ReadViewMoved => {
                if let Some(h) = handle.take() {
                    store.rollback(h);
                }
                return TxnOutcome::SoftFailed;
            }
        }
    }
    let handle = match handle {
        Some(h) => h,
        None => return TxnOutcome::SoftFailed,
    };

    let mut ws = WriteSetHandle::new();
    let read_view = handle.read_view();
    if provider.capabilities().supports_snapshot_read_view() {
        let status = provider.assign_read_view(conn_id, read_view);
        if !status.is_success() {
            store.rollback(handle);
            return classify_non_cert_failure(status);
        }
    }
    provider.append_data(&mut ws, DataType::Ordered, encode_read_view(read_view).to_vec());

    for op in handle.operations() {
        provider.append_key(&mut ws, op.src, KeyType::Reference);
        provider.append_key(&mut ws, op.dst, KeyType::Update);
        provider.append_data(&mut ws, DataType::Ordered, op.encode().to_vec());
    }

    let cert = provider.certify(conn_id, &ws, WriteSetFlags::TRX_START | WriteSetFlags::TRX_END);
    let outcome = resolve_certify_result(store, provider, conn_id, handle, cert.status, cert.meta);
    provider.release(conn_id, ws);
    outcome
}

fn resolve_certify_result(
    store: &Store,
    provider: &dyn Provider,
    conn_id: ConnId,
    handle: TxnHandle,
    status: StatusCode,
    meta: CertMeta,
) -> TxnOutcome {
    match status {
        StatusCode::Ok | StatusCode::Warning => {
            if !meta.was_ordered() {
                // Certified but never given a place in the total order;
                // nothing to commit.
                store.rollback(handle);
                return TxnOutcome::SoftFailed;
            }
            if !enter_commit_order(provider, conn_id, meta) {
                store.rollback(handle);
                return TxnOutcome::Fatal(TxnError::MalformedWriteSet(
                    "commit_order_enter failed for a certified write-set".into(),
                ));
            }
            let commit_result = store.commit(handle, meta.gtid);
            let leave_ok = provider.commit_order_leave(conn_id, meta, None).is_success();
            match commit_result {
                Ok(CommitOutcome::Committed) if leave_ok => TxnOutcome::Committed(meta.gtid),
                Ok(CommitOutcome::Committed) => TxnOutcome::Fatal(TxnError::MalformedWriteSet(
                    "commit_order_leave failed after a successful commit".into(),
                )),
                Ok(CommitOutcome::ReadViewFailed) => TxnOutcome::SoftFailed,
                Err(e) => TxnOutcome::Fatal(e.into()),
            }
        }
        StatusCode::BfAbort => {
            // A higher-priority transaction forced this one to roll back
            // while it waited in certification; unblock it immediately.
            store.rollback(handle);
            if meta.was_ordered() {
                if !enter_commit_order(provider, conn_id, meta) {
                    return TxnOutcome::Fatal(TxnError::MalformedWriteSet(
                        "commit_order_enter failed after BF_ABORT".into(),
                    ));
                }
                if let Err(e) = store.update_gtid(meta.gtid) {
                    return TxnOutcome::Fatal(e.into());
                }
                provider.commit_order_leave(conn_id, meta, None);
            }
            TxnOutcome::SoftFailed
        }
        StatusCode::ConnFail => {
            store.rollback(handle);
            TxnOutcome::ConnFailed
        }
        _ => {
            // Any other failure (TRX_FAIL, TRX_MISSING, NODE_FAIL, FATAL,
            // NOT_IMPLEMENTED, NOT_ALLOWED): if the write-set was ordered it
            // still consumed a seqno and must be accounted for under commit
            // order; either way the transaction itself is rolled back.
            if meta.was_ordered() {
                if !enter_commit_order(provider, conn_id, meta) {
                    store.rollback(handle);
                    return TxnOutcome::Fatal(TxnError::MalformedWriteSet(
                        "commit_order_enter failed for a failed-certification write-set".into(),
                    ));
                }
                let update_result = store.update_gtid(meta.gtid);
                provider.commit_order_leave(conn_id, meta, None);
                store.rollback(handle);
                if let Err(e) = update_result {
                    return TxnOutcome::Fatal(e.into());
                }
            } else {
                store.rollback(handle);
            }
            if status == StatusCode::Fatal {
                TxnOutcome::Fatal(TxnError::MalformedWriteSet(
                    "provider reported a fatal certification failure".into(),
                ))
            } else {
                TxnOutcome::SoftFailed
            }
        }
    }
}

fn enter_commit_order(provider: &dyn Provider, conn_id: ConnId, meta: CertMeta) -> bool {
    provider.commit_order_enter(conn_id, meta).is_success()
}

fn classify_non_cert_failure(status: StatusCode) -> TxnOutcome {
    if status == StatusCode::ConnFail {
        TxnOutcome::ConnFailed
    } else {
        TxnOutcome::SoftFailed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use wsrep_provider::NullProvider;
    use wsrep_store::StoreConfig;

    fn bootstrapped_store(records: usize) -> (Store, Arc<NullProvider>) {
        let store = Store::open(StoreConfig {
            records,
            ws_size: 256,
            operations: 1,
            min_op_size: 16,
        })
        .unwrap();
        let provider = Arc::new(NullProvider::new());
        provider.connect("n1", "", true).unwrap();
        let view_store = &store;
        struct Cb<'a>(&'a Store);
        impl<'a> wsrep_provider::ProviderCallbacks for Cb<'a> {
            fn on_connected(&self, _state_id: wsrep_store::Gtid) {}
            fn on_view(&self, view: &wsrep_store::View) {
                if view.is_primary() {
                    self.0.update_membership(view).unwrap();
                }
            }
            fn on_synced(&self) {}
            fn on_apply(
                &self,
                _write_set: Option<&[u8]>,
                _meta: wsrep_provider::CertMeta,
            ) -> StatusCode {
                StatusCode::Ok
            }
            fn on_sst_request(&self, _joiner_address: &str) {}
            fn on_sst_donate(&self, _bypass: bool) {}
            fn on_log(&self, _level: tracing::Level, _message: &str) {}
        }
        provider.bootstrap_view(&Cb(view_store));
        (store, provider)
    }

    #[test]
    fn master_commit_advances_gtid_and_writes_record() {
        let (store, provider) = bootstrapped_store(8);
        let before = store.current_gtid();
        let outcome = run_master(&store, provider.as_ref(), 1, 1);
        match outcome {
            TxnOutcome::Committed(gtid) => {
                assert_eq!(gtid.seqno, before.seqno + 1);
                assert_eq!(store.current_gtid(), gtid);
            }
            other => panic!("expected Committed, got {other:?}"),
        }
    }

    #[test]
    fn repeated_master_transactions_consume_consecutive_seqnos() {
        let (store, provider) = bootstrapped_store(8);
        let mut last = store.current_gtid().seqno;
        for _ in 0..5 {
            match run_master(&store, provider.as_ref(), 1, 1) {
                TxnOutcome::Committed(gtid) => {
                    assert_eq!(gtid.seqno, last + 1);
                    last = gtid.seqno;
                }
                other => panic!("expected Committed, got {other:?}"),
            }
        }
    }
}
