//! The provider contract: the trait boundary between this node and its
//! pluggable write-set replication provider, plus the node-side state that
//! sits in front of it (the cached view and the `SYNCED` latch).
//!
//! The provider is an external collaborator reached through a capability
//! object (`Arc<dyn Provider>`) handed in at construction time rather than
//! loaded dynamically; [`NullProvider`] is the single-node, no-op
//! implementation used by default and in tests.

#![warn(missing_docs)]
#![deny(unsafe_code)]

mod error;
mod null_provider;
mod provider;
mod synced_latch;
mod types;
mod view_cache;

pub use error::ProviderError;
pub use null_provider::NullProvider;
pub use provider::{ConnId, Provider, ProviderCallbacks};
pub use synced_latch::{SyncState, SyncedLatch};
pub use types::{
    CertMeta, CertifyResult, DataType, KeyType, ProviderStats, StatusCode, WriteSetFlags,
    WriteSetHandle,
};
pub use view_cache::ViewCache;
