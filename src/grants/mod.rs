//! Access grant store with pluggable backends.
//!
//! Tracks four record kinds:
//!
//! - **files** - finalized uploads, optionally expiring
//! - **file access** - `(storage id, access key)` capability pairs
//! - **download grants** - time- and/or use-bounded download rights
//! - **pending uploads** - upload tickets that expire if never finalized
//!
//! Every expiry-bearing table keeps a secondary index ordered by
//! `(expiry, id)`, so [`GrantStore::sweep_expired`] visits only expired
//! records. Sweeping is never scheduled internally; callers trigger it.
//!
//! Backends:
//!
//! - **RedbBackend**: Persistent storage with ACID guarantees (default for the server)
//! - **MemoryBackend**: Fast, non-persistent storage (ideal for testing/embedding)
//!
//! # Example
//!
//! ```ignore
//! use filegate::grants::GrantStore;
//!
//! // In-memory (testing/embedding)
//! let store = GrantStore::memory();
//!
//! // Persistent (production)
//! let store = GrantStore::file("~/.filegate/grants.redb")?;
//! ```

mod backend;
mod memory;
mod redb;
mod store;
mod types;

#[cfg(test)]
mod property_tests;

// Re-export the public API
pub use backend::GrantBackend;
pub use memory::MemoryBackend;
pub use redb::RedbBackend;
pub use store::{FinalizeOptions, GrantStore};
pub use types::{DenialReason, DownloadGrant, FileRecord, PendingUpload, Redemption, SweepReport};
