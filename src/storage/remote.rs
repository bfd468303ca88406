//! Storage fed from a server payload
//!
//! `RemoteStorage<S>` has the same item pipeline as `Storage<S>`, but its
//! authoritative source is a payload fetched from a server. Every good
//! payload is cached under the persistent catalog, and the cache is used
//! when the server cannot be reached.

use std::path::PathBuf;
use std::sync::Arc;

use super::catalog::Catalog;
use super::container::{Identified, ItemsIn, StorageItem};
use crate::context::StoreContext;
use crate::error::Result;
use crate::serialization::{JsonSerializer, Reader, Serializable, Serializer, TypeRegistry, Writer};

/// Supplies raw payloads by name
pub trait RemoteSource {
    /// Fetches a payload, `Ok(None)` if the server has nothing under `name`
    fn fetch(&self, name: &str) -> Result<Option<String>>;
}

/// Where the items currently held came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteOrigin {
    Server,
    Cache,
    Raw,
}

pub struct RemoteStorage<S> {
    ctx: Arc<StoreContext>,
    name: String,
    serializer: JsonSerializer,
    registry: TypeRegistry<S>,
    items: Vec<S>,
    origin: Option<RemoteOrigin>,
}

impl<S: StorageItem + 'static> RemoteStorage<S> {
    pub fn new(ctx: Arc<StoreContext>, name: impl Into<String>, registry: TypeRegistry<S>) -> Self {
        RemoteStorage {
            ctx,
            name: name.into(),
            serializer: JsonSerializer::default(),
            registry,
            items: Vec::new(),
            origin: None,
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.origin.is_some()
    }

    pub fn origin(&self) -> Option<RemoteOrigin> {
        self.origin
    }

    pub fn items(&self) -> &[S] {
        &self.items
    }

    /// Local cache file for this payload
    pub fn cache_path(&self) -> PathBuf {
        self.ctx.data_path(
            Catalog::Persistent,
            &format!("{}_remote", self.name),
            self.serializer.extension(),
        )
    }

    /// Fetches from `source`, falling back to the local cache
    ///
    /// Returns whether any data (server or cache) was loaded.
    pub fn load(&mut self, source: &dyn RemoteSource) -> bool {
        match source.fetch(&self.name) {
            Ok(Some(raw)) if !raw.trim().is_empty() => match self.parse(&raw) {
                Ok(items) => {
                    self.accept(items, RemoteOrigin::Server);
                    if let Err(e) = self.ctx.backend().write(&self.cache_path(), &raw) {
                        log::warn!("Could not cache remote '{}': {}", self.name, e);
                    }
                    return true;
                }
                Err(e) => log::error!("Remote payload '{}' is invalid: {}", self.name, e),
            },
            Ok(_) => log::debug!("Server has no payload for '{}'", self.name),
            Err(e) => log::warn!("Fetching remote '{}' failed: {}", self.name, e),
        }
        self.load_cache()
    }

    /// Loads the cached copy only
    pub fn load_cache(&mut self) -> bool {
        let path = self.cache_path();
        let raw = match self.ctx.backend().read(&path) {
            Ok(Some(raw)) => raw,
            Ok(None) => return false,
            Err(e) => {
                log::error!("Failed to read {}: {}", path.display(), e);
                return false;
            }
        };
        match self.parse(&raw) {
            Ok(items) => {
                self.accept(items, RemoteOrigin::Cache);
                true
            }
            Err(e) => {
                log::error!("Cached remote '{}' is invalid: {}", self.name, e);
                false
            }
        }
    }

    /// Replaces the items with a payload received some other way
    pub fn load_raw(&mut self, raw: &str) -> Result<()> {
        let items = self.parse(raw)?;
        self.accept(items, RemoteOrigin::Raw);
        Ok(())
    }

    /// Current items as a payload
    pub fn to_raw(&self) -> Result<String> {
        self.serializer.serialize(&RemoteOut { items: &self.items })
    }

    fn parse(&self, raw: &str) -> Result<Vec<S>> {
        let mut items = Vec::new();
        self.serializer.deserialize(
            &mut ItemsIn {
                items: &mut items,
                registry: &self.registry,
            },
            raw,
        )?;
        Ok(items)
    }

    /// Editor builds keep every item, like `Storage`
    fn accept(&mut self, mut items: Vec<S>, origin: RemoteOrigin) {
        if !self.ctx.is_editor() {
            let flags = self.ctx.platforms();
            items.retain(|item| {
                item.check_availability()
                    && item
                        .platform_expression()
                        .is_none_or(|expr| super::platform::evaluate(expr, flags))
            });
        }
        log::info!("Remote '{}': {} items from {:?}", self.name, items.len(), origin);
        self.items = items;
        self.origin = Some(origin);
    }
}

impl<S: StorageItem + Identified + 'static> RemoteStorage<S> {
    pub fn get_item_by_id(&self, id: &str) -> Option<&S> {
        self.items.iter().find(|item| item.id() == id)
    }
}

struct RemoteOut<'a, S> {
    items: &'a [S],
}

impl<S: Serializable> Serializable for RemoteOut<'_, S> {
    fn type_tag(&self) -> &'static str {
        "remote"
    }

    fn serialize(&self, writer: &mut Writer) {
        writer.write_collection("items", self.items);
    }

    fn deserialize(&mut self, _reader: &Reader<'_>) {}
}
