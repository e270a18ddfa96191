//! # Persistent Storage
//!
//! Disk-backed student storage. See [`RedbStore`].

mod redb_store;

pub use redb_store::RedbStore;
