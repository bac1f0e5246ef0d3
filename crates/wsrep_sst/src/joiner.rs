//! The joiner side of State Snapshot Transfer: listen on the rendezvous
//! endpoint, accept one connection from a donor, install the received
//! state (or do nothing, on a bypass frame), and report the outcome to the
//! provider.

use std::net::{TcpListener, TcpStream};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;

use wsrep_provider::Provider;
use wsrep_store::Store;

use crate::error::{SstError, SstResult};
use crate::framing::recv_framed;

/// Spawns a detached joiner worker listening on `(host, port)`.
///
/// Returns the address the worker actually bound to (its rendezvous
/// string, `"host:port"`) only after the listening socket has been
/// created — this is the payload the caller embeds in the SST request the
/// provider forwards to the donor. The worker then runs to completion in
/// the background: accept one connection, install the transferred state
/// (or do nothing, if the donor signals bypass), and report to the
/// provider via `sst_received`.
pub fn spawn_joiner(
    store: Arc<Store>,
    provider: Arc<dyn Provider>,
    host: String,
    port: u16,
) -> SstResult<String> {
    let (ready_tx, ready_rx) = mpsc::channel::<SstResult<String>>();
    thread::Builder::new()
        .name("wsrep-sst-joiner".into())
        .spawn(move || joiner_worker(store, provider.as_ref(), &host, port, ready_tx))?;
    ready_rx.recv().map_err(|_| SstError::WorkerNotReady)?
}

fn joiner_worker(
    store: Arc<Store>,
    provider: &dyn Provider,
    host: &str,
    port: u16,
    ready: mpsc::Sender<SstResult<String>>,
) {
    let listener = match TcpListener::bind((host, port)) {
        Ok(listener) => listener,
        Err(e) => {
            let _ = ready.send(Err(e.into()));
            return;
        }
    };
    let address = match listener.local_addr() {
        Ok(addr) => addr.to_string(),
        Err(e) => {
            let _ = ready.send(Err(e.into()));
            return;
        }
    };
    let _ = ready.send(Ok(address));

    let result = accept_and_install(&listener, &store);
    drop(listener);
    if let Err(ref e) = result {
        tracing::error!(error = %e, "sst install failed");
    }
    let status = if result.is_ok() { 0 } else { -1 };
    provider.sst_received(store.current_gtid(), status);
}

fn accept_and_install(listener: &TcpListener, store: &Store) -> SstResult<()> {
    let (mut stream, _) = listener.accept()?;
    install_from_stream(&mut stream, store)
}

fn install_from_stream(stream: &mut TcpStream, store: &Store) -> SstResult<()> {
    match recv_framed(stream)? {
        Some(buf) => {
            store.init_state(&buf)?;
        }
        None => {
            // Bypass: the joiner reuses its existing state and will catch
            // up through ordered write-set replay.
        }
    }
    Ok(())
}

/// Reports a provider-decided bypass directly: no listener is opened and no
/// network round-trip happens at all. Used when the provider itself (not
/// the donor, over the wire) has determined this joiner needs no transfer.
pub fn spawn_bypass_joiner(store: Arc<Store>, provider: Arc<dyn Provider>) {
    thread::spawn(move || {
        provider.sst_received(store.current_gtid(), 0);
    });
}
