//! The slave-path write-set lifecycle: apply, commit-order-enter,
//! commit/update-GTID, commit-order-leave.

use wsrep_provider::{CertMeta, ConnId, Provider};
use wsrep_store::{CommitOutcome, Store};

use crate::error::TxnError;
use crate::outcome::TxnOutcome;
use crate::wire::decode_read_view;

/// Applies a remote write-set delivered by the provider's `apply` callback.
///
/// `write_set` is `None` when the write-set failed certification but was
/// still totally ordered (an empty transaction context is committed in its
/// place so the GTID still advances); `Some(buf)` is the wire-format payload
/// described in [`crate::wire`].
pub fn run_slave(
    store: &Store,
    provider: &dyn Provider,
    conn_id: ConnId,
    write_set: Option<&[u8]>,
    meta: CertMeta,
) -> TxnOutcome {
    let handle = match write_set {
        Some(buf) => match decode_read_view(buf) {
            Ok((read_view, ops)) => match store.apply(read_view, ops) {
                Ok(h) => h,
                Err(e) => return TxnOutcome::Fatal(e.into()),
            },
            Err(e) => return TxnOutcome::Fatal(e),
        },
        None => match store.apply(store.current_gtid(), &[]) {
            Ok(h) => h,
            Err(e) => return TxnOutcome::Fatal(e.into()),
        },
    };

    if !provider.commit_order_enter(conn_id, meta).is_success() {
        store.rollback(handle);
        return TxnOutcome::ConnFailed;
    }

    let has_ops = !handle.operations().is_empty();
    let result = if has_ops {
        store.commit(handle, meta.gtid)
    } else {
        store.rollback(handle);
        store.update_gtid(meta.gtid).map(|()| CommitOutcome::Committed)
    };

    let failed = !matches!(result, Ok(CommitOutcome::Committed));
    let error_marker: Option<&[u8]> = if failed { Some(b"apply failed") } else { None };
    provider.commit_order_leave(conn_id, meta, error_marker);

    match result {
        Ok(CommitOutcome::Committed) => TxnOutcome::Committed(meta.gtid),
        Ok(CommitOutcome::ReadViewFailed) => TxnOutcome::Fatal(TxnError::MalformedWriteSet(
            "slave apply hit a read-view mismatch; the write-set was already totally ordered"
                .into(),
        )),
        Err(e) => TxnOutcome::Fatal(e.into()),
    }
}
