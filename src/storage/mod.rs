//! File-backed item storage
//!
//! This module provides lazily loaded, optionally encrypted item lists:
//! - `Storage<S>`: a typed, filtered and sorted list persisted to one file
//! - `RemoteStorage<S>`: the same shape fed from a server payload, cached locally
//! - `StorageBackend`: where bytes actually go (filesystem or memory)
//!
//! # Architecture
//!
//! - `catalog`: root directory classes (`Catalog`)
//! - `backend`: `StorageBackend`, `FsBackend` (atomic writes), `MemoryBackend`
//! - `platform`: platform/feature-flag expressions for item gating
//! - `container`: `Storage<S>` and the item traits
//! - `remote`: `RemoteStorage<S>` and `RemoteSource`

pub mod backend;
pub mod catalog;
pub mod container;
pub mod platform;
pub mod remote;

pub use backend::{FsBackend, MemoryBackend, StorageBackend, atomic_write};
pub use catalog::Catalog;
pub use container::{Identified, Storage, StorageItem};
pub use platform::evaluate as evaluate_platform;
pub use remote::{RemoteSource, RemoteStorage};
