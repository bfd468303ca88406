//! Modular save document
//!
//! `GameData` is the player's save: one file holding independent modules
//! (wallet, settings, progress, ...), each serialized through the same
//! `Serializable` contract as storage items.
//!
//! # Architecture
//!
//! - `module`: the `Module` trait, `ModuleRegistry` and the `DirtyHandle`
//!   modules use to report changes
//! - `document`: `GameData` itself (load, save, backup, server payloads)
//! - `upgrade`: hooks that migrate freshly loaded state forward
//! - `autosave`: debounced background saving
//!
//! # Example
//!
//! ```ignore
//! let registry = Arc::new(ModuleRegistry::new().with::<Wallet>());
//! let mut data = GameData::new(ctx, "profile", registry).with_key(key);
//! data.load();
//! data.get_or_create::<Wallet>()?.add(10);
//!
//! let data = Arc::new(Mutex::new(data));
//! let token = AutosaveToken::new();
//! autosave::spawn(&data, &token, autosave::DEFAULT_TICK)?;
//! ```

pub mod autosave;
pub mod document;
pub mod module;
pub mod upgrade;

pub use autosave::{AutosaveScheduler, AutosaveToken, Clock, SystemClock};
pub use document::{CURRENT_DATA_VERSION, GameData, LoadState};
pub use module::{AsAny, DirtyHandle, Module, ModuleKind, ModuleRegistry};
pub use upgrade::GameDataUpgrade;
