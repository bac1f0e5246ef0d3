//! State Snapshot Transfer: the joiner/donor thread pair, rendezvous
//! addressing, and wire framing that hands a consistent copy of a
//! [`wsrep_store::Store`]'s state from one node to another.
//!
//! Both sides follow the same shape: the provider-facing callback spawns a
//! detached worker and returns only once that worker has taken ownership of
//! its handles (a bound listener for the joiner; an acquired snapshot for
//! the donor), synchronized through a one-shot channel rather than the
//! mutex+condvar rendezvous the original implementation used. The worker
//! then runs the actual (potentially slow) network transfer to completion
//! and reports the outcome to the provider exactly once, regardless of
//! success or failure.

#![warn(missing_docs)]
#![deny(unsafe_code)]

mod donor;
mod error;
mod framing;
mod joiner;

pub use donor::spawn_donor;
pub use error::{SstError, SstResult};
pub use joiner::{spawn_bypass_joiner, spawn_joiner};
