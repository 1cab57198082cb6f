//! Peer state store.
//!
//! One JSON file per account holding our own settings and the last
//! accepted Autocrypt state of every peer. All writes go through
//! [`AtomicStore::atomic_change`].

mod model;
mod persist;

pub use model::{AccountConfig, AccountPreference, GpgMode, PeerState, normalize_addr};
pub use persist::AtomicStore;
