//! The `GameData` document
//!
//! A document is an ordered list of modules, at most one per module type,
//! persisted as a single file:
//!
//! ```json
//! {"version": 1, "modules": [{"$type": "wallet", "coins": 40}, ...]}
//! ```
//!
//! # Lifecycle
//!
//! `load()` reads the file (decrypting when a key is set), rebuilds the
//! modules through the `ModuleRegistry`, runs every upgrade once and marks
//! the document `Ready`. Modules report changes through their
//! `DirtyHandle`; `save()` writes the document and clears the flag, and
//! `poll_autosave()` does so on the debounced autosave schedule.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::autosave::AutosaveScheduler;
use super::module::{DirtyHandle, Module, ModuleKind, ModuleRegistry};
use super::upgrade::GameDataUpgrade;
use crate::context::StoreContext;
use crate::crypt::{self, CryptKey};
use crate::error::{Result, StoreError};
use crate::serialization::{JsonSerializer, Reader, Serializable, Serializer, TypeRegistry, Writer};
use crate::storage::Catalog;

/// Document version written by this build
pub const CURRENT_DATA_VERSION: u32 = 1;

const VERSION_FIELD: &str = "version";
const MODULES_FIELD: &str = "modules";
const BACKUP_SUFFIX: &str = "_backup";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    Unloaded,
    Loading,
    Ready,
}

pub struct GameData {
    ctx: Arc<StoreContext>,
    name: String,
    catalog: Catalog,
    key: Option<CryptKey>,
    serializer: JsonSerializer,
    registry: Arc<ModuleRegistry>,
    modules: Vec<Box<dyn Module>>,
    dirty: DirtyHandle,
    upgrades: Vec<Box<dyn GameDataUpgrade>>,
    state: LoadState,
    stored_version: Option<u32>,
    autosave: AutosaveScheduler,
}

impl GameData {
    /// Creates an unloaded document stored under the persistent catalog
    pub fn new(ctx: Arc<StoreContext>, name: impl Into<String>, registry: Arc<ModuleRegistry>) -> Self {
        GameData {
            ctx,
            name: name.into(),
            catalog: Catalog::Persistent,
            key: None,
            serializer: JsonSerializer::default(),
            registry,
            modules: Vec::new(),
            dirty: DirtyHandle::new(),
            upgrades: Vec::new(),
            state: LoadState::Unloaded,
            stored_version: None,
            autosave: AutosaveScheduler::default(),
        }
    }

    /// Encrypts the document file (and its backups) with `key`
    pub fn with_key(mut self, key: CryptKey) -> Self {
        self.key = Some(key);
        self
    }

    /// Adds an upgrade; upgrades run in the order they were added
    pub fn with_upgrade(mut self, upgrade: impl GameDataUpgrade + 'static) -> Self {
        self.upgrades.push(Box::new(upgrade));
        self
    }

    pub fn with_scheduler(mut self, scheduler: AutosaveScheduler) -> Self {
        self.autosave = scheduler;
        self
    }

    /// Registers a callback fired on every dirty mark
    pub fn on_set_dirty<F: Fn() + Send + Sync + 'static>(&self, callback: F) {
        self.dirty.subscribe(callback);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> LoadState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == LoadState::Ready
    }

    /// Version of the loaded document, `None` on a first run
    ///
    /// Upgrades see the version found in the file; once they have run it
    /// reads `CURRENT_DATA_VERSION`.
    pub fn stored_version(&self) -> Option<u32> {
        self.stored_version
    }

    pub fn path(&self) -> PathBuf {
        self.file_path(&self.name)
    }

    pub fn backup_path(&self, name: &str) -> PathBuf {
        self.file_path(&format!("{}{}", name, BACKUP_SUFFIX))
    }

    /// Handle that modules created outside the registry can report through
    pub fn dirty_handle(&self) -> DirtyHandle {
        self.dirty.clone()
    }

    pub fn set_dirty(&self) {
        self.dirty.set_dirty();
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty.is_dirty()
    }

    /// Reads the document and runs upgrades
    ///
    /// An absent file is a first run: the document starts empty and
    /// `Ready`. A failed read, decrypt or parse is logged; the document is
    /// left empty and `Unloaded`. Returns whether the document is ready.
    pub fn load(&mut self) -> bool {
        self.state = LoadState::Loading;
        let path = self.path();

        match self.read_document(&path) {
            Ok((version, modules)) => {
                self.modules = modules;
                self.stored_version = version;
                self.dirty.take();
                self.run_upgrades();
                self.state = LoadState::Ready;
                log::info!(
                    "Loaded '{}' ({} modules, stored v{:?})",
                    self.name,
                    self.modules.len(),
                    version
                );
                true
            }
            Err(e) => {
                log::error!("Failed to load {}: {}", path.display(), e);
                self.modules.clear();
                self.stored_version = None;
                self.state = LoadState::Unloaded;
                false
            }
        }
    }

    /// Writes the document and clears the dirty flag
    ///
    /// On failure the dirty flag is kept so a later save retries.
    pub fn save(&mut self) -> Result<()> {
        if !self.is_ready() {
            return Err(StoreError::NotLoaded(self.name.clone()));
        }

        let was_dirty = self.dirty.take();
        let path = self.path();
        match self.write_document(&path, self.module_refs()) {
            Ok(()) => {
                self.autosave.mark_saved();
                log::debug!("Saved '{}' to {}", self.name, path.display());
                Ok(())
            }
            Err(e) => {
                if was_dirty {
                    self.dirty.restore();
                }
                Err(e)
            }
        }
    }

    /// Saves when dirty and the debounce window has passed
    ///
    /// Returns whether a save happened. Called by the autosave loop; safe
    /// to call from a game loop directly instead.
    pub fn poll_autosave(&mut self) -> Result<bool> {
        if !self.is_ready() {
            return Ok(false);
        }
        if !self.autosave.observe(self.dirty.is_dirty()) {
            return Ok(false);
        }
        match self.save() {
            Ok(()) => Ok(true),
            Err(e) => {
                // Space out retries like regular saves
                self.autosave.mark_saved();
                Err(e)
            }
        }
    }

    /// Drops every module
    pub fn clear(&mut self) {
        self.modules.clear();
        self.dirty.set_dirty();
    }

    pub fn modules(&self) -> &[Box<dyn Module>] {
        &self.modules
    }

    pub fn contains<M: ModuleKind + 'static>(&self) -> bool {
        self.position::<M>().is_some()
    }

    pub fn get<M: ModuleKind + 'static>(&self) -> Option<&M> {
        self.modules
            .iter()
            .find_map(|module| (**module).as_any().downcast_ref::<M>())
    }

    pub fn get_mut<M: ModuleKind + 'static>(&mut self) -> Option<&mut M> {
        self.modules
            .iter_mut()
            .find_map(|module| (**module).as_any_mut().downcast_mut::<M>())
    }

    /// Returns the module of type `M`, creating a blank one if absent
    ///
    /// Fails only when the slot found for `M` holds another type, which
    /// `position()` rules out.
    pub fn get_or_create<M: ModuleKind + 'static>(&mut self) -> Result<&mut M> {
        let index = match self.position::<M>() {
            Some(index) => index,
            None => {
                self.modules.push(Box::new(M::create(self.dirty.clone())));
                self.modules.len() - 1
            }
        };
        (*self.modules[index])
            .as_any_mut()
            .downcast_mut::<M>()
            .ok_or_else(|| StoreError::UnknownType(M::TAG.to_string()))
    }

    /// Removes the module of type `M`, returning whether there was one
    pub fn remove<M: ModuleKind + 'static>(&mut self) -> bool {
        match self.position::<M>() {
            Some(index) => {
                self.modules.remove(index);
                self.dirty.set_dirty();
                true
            }
            None => false,
        }
    }

    /// Writes the current modules to `<name>_backup`, same key
    pub fn backup(&self, name: &str) -> Result<()> {
        if !self.is_ready() {
            return Err(StoreError::NotLoaded(self.name.clone()));
        }
        let path = self.backup_path(name);
        self.write_document(&path, self.module_refs())?;
        log::info!("Backed up '{}' to {}", self.name, path.display());
        Ok(())
    }

    /// Replaces the modules with the `<name>_backup` copy
    ///
    /// Returns `Ok(false)` when there is no such backup. A restored
    /// document goes through upgrades and is marked dirty.
    pub fn restore(&mut self, name: &str) -> Result<bool> {
        let path = self.backup_path(name);
        let (version, modules) = self.read_document(&path)?;
        if version.is_none() {
            log::warn!("No backup at {}", path.display());
            return Ok(false);
        }

        self.state = LoadState::Loading;
        self.modules = modules;
        self.stored_version = version;
        self.run_upgrades();
        self.state = LoadState::Ready;
        self.dirty.set_dirty();
        log::info!("Restored '{}' from {}", self.name, path.display());
        Ok(true)
    }

    /// Payload of the server-syncable modules only, never encrypted
    pub fn to_server_raw(&self) -> Result<String> {
        let root = DocumentOut {
            version: CURRENT_DATA_VERSION,
            modules: self
                .module_refs()
                .into_iter()
                .filter(|m| m.server_syncable())
                .collect(),
        };
        self.serializer.serialize(&root)
    }

    /// Merges a server payload into the document
    ///
    /// Modules in the payload replace local modules of the same type;
    /// types the document lacks are added. Marks the document dirty.
    pub fn apply_server_raw(&mut self, raw: &str) -> Result<()> {
        let (_, incoming) = self.parse_document(raw)?;
        let count = incoming.len();
        for module in incoming {
            let tag = module.type_tag();
            match self.modules.iter().position(|m| m.type_tag() == tag) {
                Some(index) => self.modules[index] = module,
                None => self.modules.push(module),
            }
        }
        self.dirty.set_dirty();
        log::info!("Applied {} server modules to '{}'", count, self.name);
        Ok(())
    }

    fn file_path(&self, name: &str) -> PathBuf {
        self.ctx
            .data_path(self.catalog, name, self.serializer.extension())
    }

    fn module_refs(&self) -> Vec<&dyn Module> {
        self.modules.iter().map(|m| &**m as &dyn Module).collect()
    }

    fn position<M: ModuleKind + 'static>(&self) -> Option<usize> {
        self.modules
            .iter()
            .position(|module| (**module).as_any().is::<M>())
    }

    fn run_upgrades(&mut self) {
        let upgrades = std::mem::take(&mut self.upgrades);
        for upgrade in &upgrades {
            log::debug!("Running upgrade '{}' on '{}'", upgrade.name(), self.name);
            upgrade.upgrade(self);
        }
        self.upgrades = upgrades;
        if self.stored_version.is_some() {
            self.stored_version = Some(CURRENT_DATA_VERSION);
        }
    }

    /// Reads a document file; `(None, [])` when the file is absent or empty
    fn read_document(&self, path: &Path) -> Result<(Option<u32>, Vec<Box<dyn Module>>)> {
        let raw = match self.ctx.backend().read(path)? {
            Some(raw) if !raw.trim().is_empty() => raw,
            _ => {
                log::debug!("No data at {}, starting empty", path.display());
                return Ok((None, Vec::new()));
            }
        };
        let text = crypt::unseal(raw, self.key.as_ref())?;
        let (version, modules) = self.parse_document(&text)?;
        Ok((Some(version), modules))
    }

    fn parse_document(&self, text: &str) -> Result<(u32, Vec<Box<dyn Module>>)> {
        let registry = self.registry.bind(&self.dirty);
        let mut root = DocumentIn {
            version: 0,
            modules: Vec::new(),
            registry: &registry,
        };
        self.serializer.deserialize(&mut root, text)?;

        if root.version > CURRENT_DATA_VERSION {
            return Err(StoreError::VersionMismatch {
                expected_max: CURRENT_DATA_VERSION,
                found: root.version,
            });
        }
        Ok((root.version, dedupe(root.modules)))
    }

    fn write_document(&self, path: &Path, modules: Vec<&dyn Module>) -> Result<()> {
        let root = DocumentOut {
            version: CURRENT_DATA_VERSION,
            modules,
        };
        let text = self.serializer.serialize(&root)?;
        let text = crypt::seal(text, self.key.as_ref());
        self.ctx.backend().write(path, &text)
    }
}

impl std::fmt::Debug for GameData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameData")
            .field("name", &self.name)
            .field("state", &self.state)
            .field("modules", &self.modules.iter().map(|m| m.type_tag()).collect::<Vec<_>>())
            .field("dirty", &self.dirty.is_dirty())
            .finish()
    }
}

/// Keeps the first module of each type
fn dedupe(modules: Vec<Box<dyn Module>>) -> Vec<Box<dyn Module>> {
    let mut seen = HashSet::new();
    modules
        .into_iter()
        .filter(|module| {
            let first = seen.insert(module.type_tag());
            if !first {
                log::warn!("Dropping duplicate module '{}'", module.type_tag());
            }
            first
        })
        .collect()
}

struct DocumentOut<'a> {
    version: u32,
    modules: Vec<&'a dyn Module>,
}

impl Serializable for DocumentOut<'_> {
    fn type_tag(&self) -> &'static str {
        "game_data"
    }

    fn serialize(&self, writer: &mut Writer) {
        writer.write(VERSION_FIELD, &self.version);
        writer.write_collection(MODULES_FIELD, self.modules.iter().copied());
    }

    fn deserialize(&mut self, _reader: &Reader<'_>) {}
}

struct DocumentIn<'a> {
    version: u32,
    modules: Vec<Box<dyn Module>>,
    registry: &'a TypeRegistry<Box<dyn Module>>,
}

impl Serializable for DocumentIn<'_> {
    fn type_tag(&self) -> &'static str {
        "game_data"
    }

    fn serialize(&self, _writer: &mut Writer) {}

    fn deserialize(&mut self, reader: &Reader<'_>) {
        self.version = reader.read(VERSION_FIELD);
        self.modules = reader.read_collection(MODULES_FIELD, self.registry);
    }
}
