//! The master and slave write-set lifecycles: the algorithm that drives a
//! [`wsrep_store::Store`] through a [`wsrep_provider::Provider`] in the
//! exact order the provider's contract requires.
//!
//! ```text
//! master: execute -> append keys/data -> certify -> commit_order_enter
//!         -> commit/update_gtid -> commit_order_leave
//! slave:  apply -> commit_order_enter -> commit -> commit_order_leave
//! ```
//!
//! Both lifecycles are plain functions over `&Store`/`&dyn Provider`
//! (mirroring how `SyncEngine` is generic over a transport and applier
//! trait) so the worker pool in `wsrep_node` can drive either one without
//! owning any transaction state itself; all of it lives in the
//! [`wsrep_store::TxnHandle`] each call threads through.

#![warn(missing_docs)]
#![deny(unsafe_code)]

mod error;
mod master;
mod outcome;
mod slave;
mod wire;

pub use error::{TxnError, TxnResult};
pub use master::run_master;
pub use outcome::TxnOutcome;
pub use slave::run_slave;
pub use wire::{decode_read_view, encode_read_view, READ_VIEW_PREFIX_LEN};
