//! gamevault: typed, versioned, optionally encrypted persistence for game data
//!
//! # Architecture
//!
//! - `crypt`: passphrase-derived keys and AES-256-CBC for data at rest
//! - `packer`: compact text tokens for small value types
//! - `serialization`: the `Serializable` contract, readers/writers, type registry
//! - `storage`: `Storage<S>` item lists, remote payloads, backends
//! - `game_data`: the modular, autosaved `GameData` save document
//! - `localization`: per-language phrase tables and translation packs
//! - `config` / `context`: where files live and the shared `StoreContext`

pub mod config;
pub mod context;
pub mod crypt;
pub mod error;
pub mod game_data;
pub mod localization;
pub mod packer;
pub mod serialization;
pub mod storage;

pub use config::StoreConfig;
pub use context::StoreContext;
pub use crypt::CryptKey;
pub use error::{CryptError, Result, StoreError};
pub use game_data::{GameData, Module, ModuleKind, ModuleRegistry};
pub use serialization::{Reader, Serializable, TypeRegistry, Writer};
pub use storage::{Catalog, Storage, StorageItem};
