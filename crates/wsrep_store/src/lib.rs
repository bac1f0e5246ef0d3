//! Versioned record store, cluster membership and GTID bookkeeping for a
//! replicated node.
//!
//! ```text
//!            +----------------------+
//!            |        Store         |
//!            |  Mutex<StoreInner>   |
//!            |  - records[N]        |
//!            |  - members           |
//!            |  - gtid              |
//!            +----------+-----------+
//!                       |
//!         begin_or_extend_op / commit / update_gtid
//!                       |
//!            +----------v-----------+
//!            |    TxnHandle          |
//!            |  read_view: Gtid      |
//!            |  ops: Vec<Operation>  |
//!            +-----------------------+
//! ```
//!
//! The store is the only piece of state mutated by both master and slave
//! workers; every mutation passes through one lock and advances the GTID by
//! exactly one step. Everything above the lock (transaction lifecycles,
//! provider plumbing) lives in the `wsrep_txn` and `wsrep_provider` crates.

#![warn(missing_docs)]
#![deny(unsafe_code)]

mod error;
mod snapshot;
mod store;
mod types;

pub use error::StoreError;
pub use snapshot::Snapshot;
pub use store::{CommitOutcome, Operation, PrepareOutcome, Store, StoreConfig, TxnHandle};
pub use types::{Capabilities, Gtid, MemberId, Record, View, ViewStatus};

/// Convenience alias for operations that can fail with a [`StoreError`].
pub type StoreResult<T> = Result<T, StoreError>;
