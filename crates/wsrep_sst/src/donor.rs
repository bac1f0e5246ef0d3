//! The donor side of State Snapshot Transfer: dial the joiner's rendezvous
//! address, stream the Store's acquired snapshot (or a bypass frame), and
//! report the outcome to the provider.

use std::net::TcpStream;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;

use wsrep_provider::Provider;
use wsrep_store::{Gtid, Store};

use crate::error::{SstError, SstResult};
use crate::framing::send_framed;

struct DonorPayload {
    state_id: Gtid,
    bytes: Vec<u8>,
    bypassed: bool,
}

/// Spawns a detached donor worker that connects to `joiner_address` and
/// streams the Store's state (or, if `bypass`, an empty frame).
///
/// Returns only after the worker has acquired its snapshot (or decided to
/// bypass) under the Store's lock — the callback site never blocks on the
/// network I/O that follows. Mirrors the donate side of the provider's
/// `sst_request` callback (see `wsrep_node`'s wiring).
pub fn spawn_donor(
    store: Arc<Store>,
    provider: Arc<dyn Provider>,
    joiner_address: String,
    bypass: bool,
) -> SstResult<()> {
    let (ready_tx, ready_rx) = mpsc::channel::<SstResult<()>>();
    thread::Builder::new()
        .name("wsrep-sst-donor".into())
        .spawn(move || donor_worker(store, provider.as_ref(), joiner_address, bypass, ready_tx))?;
    ready_rx.recv().map_err(|_| SstError::WorkerNotReady)?
}

fn donor_worker(
    store: Arc<Store>,
    provider: &dyn Provider,
    joiner_address: String,
    bypass: bool,
    ready: mpsc::Sender<SstResult<()>>,
) {
    let capture = capture_payload(&store, bypass);
    let payload = match capture {
        Ok(payload) => {
            let _ = ready.send(Ok(()));
            payload
        }
        Err(e) => {
            let _ = ready.send(Err(e));
            return;
        }
    };

    let transfer_result = transfer(&joiner_address, &payload.bytes);
    if !payload.bypassed {
        let _ = store.release_state();
    }
    if let Err(ref e) = transfer_result {
        tracing::error!(state_id = %payload.state_id, error = %e, "sst donation failed");
    }
    let status = if transfer_result.is_ok() { 0 } else { -1 };
    provider.sst_sent(payload.state_id, status);
}

fn capture_payload(store: &Store, bypass: bool) -> SstResult<DonorPayload> {
    if bypass {
        return Ok(DonorPayload {
            state_id: store.current_gtid(),
            bytes: Vec::new(),
            bypassed: true,
        });
    }
    let (bytes, state_id) = store.acquire_state()?;
    Ok(DonorPayload {
        state_id,
        bytes,
        bypassed: false,
    })
}

fn transfer(address: &str, payload: &[u8]) -> SstResult<()> {
    let mut stream = TcpStream::connect(address)?;
    send_framed(&mut stream, payload)?;
    drop(stream);
    Ok(())
}
