//! Typed, lazily loaded item storage
//!
//! A `Storage<S>` owns the item list for one data file. It starts inert;
//! the first access loads it, and `apply()` writes it back.
//!
//! # Load pipeline
//!
//! 1. Read `<root>/Data/<file_name>.<ext>` (absent or empty → empty list)
//! 2. Decrypt if the catalog is packaged and we are not in the editor
//! 3. Deserialize through the type registry (unknown types are skipped)
//! 4. Outside the editor, drop unavailable items and items whose platform
//!    expression is false
//! 5. Apply the load-time filter, then the sorter
//!
//! A failed read, decrypt or parse is logged and leaves the storage empty
//! and not loaded. The failure sticks until `reload()`: later accesses do
//! not retry, and `apply()` refuses to write over the unreadable file.

use std::cmp::Ordering;
use std::path::PathBuf;
use std::sync::Arc;

use super::catalog::Catalog;
use super::platform;
use crate::context::StoreContext;
use crate::crypt;
use crate::error::{Result, StoreError};
use crate::serialization::{JsonSerializer, Reader, Serializable, Serializer, TypeRegistry, Writer};

/// An element that can live in a `Storage`
pub trait StorageItem: Serializable {
    /// Runtime availability check (feature unlocked, content shipped, ...)
    fn check_availability(&self) -> bool {
        true
    }

    /// Platform / feature-flag expression, see `storage::platform`
    fn platform_expression(&self) -> Option<&str> {
        None
    }
}

/// Items addressable by a unique, non-empty string ID
pub trait Identified {
    fn id(&self) -> &str;
}

impl<T: StorageItem + ?Sized> StorageItem for Box<T> {
    fn check_availability(&self) -> bool {
        (**self).check_availability()
    }

    fn platform_expression(&self) -> Option<&str> {
        (**self).platform_expression()
    }
}

impl<T: Identified + ?Sized> Identified for Box<T> {
    fn id(&self) -> &str {
        (**self).id()
    }
}

type Filter<S> = Box<dyn Fn(&S) -> bool + Send + Sync>;
type Sorter<S> = Box<dyn Fn(&S, &S) -> Ordering + Send + Sync>;

const ITEMS_FIELD: &str = "items";

pub struct Storage<S> {
    ctx: Arc<StoreContext>,
    file_name: String,
    catalog: Catalog,
    serializer: Arc<dyn Serializer>,
    registry: Arc<TypeRegistry<S>>,
    items: Vec<S>,
    loaded: bool,
    load_failed: bool,
    filter: Option<Filter<S>>,
    sorter: Option<Sorter<S>>,
}

impl<S: StorageItem + 'static> Storage<S> {
    /// Creates an unloaded storage
    ///
    /// Project data is written indented so editor-side diffs stay readable.
    pub fn new(
        ctx: Arc<StoreContext>,
        file_name: impl Into<String>,
        catalog: Catalog,
        registry: TypeRegistry<S>,
    ) -> Self {
        let serializer: Arc<dyn Serializer> = match catalog {
            Catalog::Project => Arc::new(JsonSerializer::pretty()),
            _ => Arc::new(JsonSerializer::default()),
        };
        Storage {
            ctx,
            file_name: file_name.into(),
            catalog,
            serializer,
            registry: Arc::new(registry),
            items: Vec::new(),
            loaded: false,
            load_failed: false,
            filter: None,
            sorter: None,
        }
    }

    pub fn with_serializer(mut self, serializer: Arc<dyn Serializer>) -> Self {
        self.serializer = serializer;
        self
    }

    /// Keeps only items passing `filter` at load time
    pub fn with_filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&S) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(filter));
        self
    }

    /// Orders items with `sorter` at load time (stable)
    pub fn with_sorter<F>(mut self, sorter: F) -> Self
    where
        F: Fn(&S, &S) -> Ordering + Send + Sync + 'static,
    {
        self.sorter = Some(Box::new(sorter));
        self
    }

    /// Orders items by their natural ordering at load time
    pub fn with_natural_order(self) -> Self
    where
        S: Ord,
    {
        self.with_sorter(|a, b| a.cmp(b))
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn catalog(&self) -> Catalog {
        self.catalog
    }

    pub fn registry(&self) -> &TypeRegistry<S> {
        &self.registry
    }

    pub fn path(&self) -> PathBuf {
        self.ctx
            .data_path(self.catalog, &self.file_name, self.serializer.extension())
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Loads the file if not loaded yet
    ///
    /// Returns whether the storage is loaded afterwards. Failures are
    /// logged, never returned.
    pub fn load(&mut self) -> bool {
        if self.loaded {
            return true;
        }
        if self.load_failed {
            return false;
        }

        let path = self.path();
        match self.read_items() {
            Ok(items) => {
                self.items = items;
                self.loaded = true;
                self.post_load();
                log::info!("Loaded {} items from {}", self.items.len(), path.display());
            }
            Err(e) => {
                log::error!("Failed to load {}: {}", path.display(), e);
                self.items.clear();
                self.load_failed = true;
            }
        }
        self.loaded
    }

    /// Discards in-memory state and loads again
    pub fn reload(&mut self) -> bool {
        self.loaded = false;
        self.load_failed = false;
        self.items.clear();
        self.load()
    }

    /// All items, loading on first access
    pub fn items(&mut self) -> &[S] {
        self.load();
        &self.items
    }

    pub fn items_mut(&mut self) -> &mut Vec<S> {
        self.load();
        &mut self.items
    }

    pub fn len(&mut self) -> usize {
        self.items().len()
    }

    pub fn is_empty(&mut self) -> bool {
        self.items().is_empty()
    }

    pub fn push(&mut self, item: S) {
        self.items_mut().push(item);
    }

    /// Removes every item matching `predicate`, returning how many went
    pub fn remove_where<F: FnMut(&S) -> bool>(&mut self, mut predicate: F) -> usize {
        let items = self.items_mut();
        let before = items.len();
        items.retain(|item| !predicate(item));
        before - items.len()
    }

    pub fn clear(&mut self) {
        self.items_mut().clear();
    }

    /// Writes the current items back to disk
    ///
    /// Packaged data is encrypted with the context's default key outside
    /// the editor. I/O errors are returned to the caller, and a storage
    /// whose file failed to load is never written.
    pub fn apply(&mut self) -> Result<()> {
        if !self.load() {
            return Err(StoreError::NotLoaded(self.path().display().to_string()));
        }

        let text = self.serializer.serialize(&ItemsOut {
            items: &self.items,
        })?;
        let key = self.ctx.encrypts(self.catalog).then(|| self.ctx.default_key());
        let text = crypt::seal(text, key);

        let path = self.path();
        self.ctx.backend().write(&path, &text)?;
        log::info!("Saved {} items to {}", self.items.len(), path.display());
        Ok(())
    }

    fn read_items(&self) -> Result<Vec<S>> {
        let path = self.path();
        let raw = match self.ctx.backend().read(&path)? {
            Some(raw) if !raw.trim().is_empty() => raw,
            _ => {
                log::debug!("No data at {}, starting empty", path.display());
                return Ok(Vec::new());
            }
        };

        let key = self.ctx.encrypts(self.catalog).then(|| self.ctx.default_key());
        let text = crypt::unseal(raw, key)?;

        let mut items = Vec::new();
        self.serializer.deserialize(
            &mut ItemsIn {
                items: &mut items,
                registry: &self.registry,
            },
            &text,
        )?;
        Ok(items)
    }

    fn post_load(&mut self) {
        if !self.ctx.is_editor() {
            let flags = self.ctx.platforms();
            let before = self.items.len();
            self.items.retain(|item| {
                item.check_availability()
                    && item
                        .platform_expression()
                        .is_none_or(|expr| platform::evaluate(expr, flags))
            });
            let dropped = before - self.items.len();
            if dropped > 0 {
                log::debug!("{} items unavailable on this build", dropped);
            }
        }

        if let Some(filter) = &self.filter {
            self.items.retain(|item| filter(item));
        }

        if let Some(sorter) = &self.sorter {
            self.items.sort_by(|a, b| sorter(a, b));
        }
    }
}

impl<S: StorageItem + Identified + 'static> Storage<S> {
    /// Finds an item by ID (linear scan; tables are small)
    pub fn get_item_by_id(&mut self, id: &str) -> Option<&S> {
        self.items().iter().find(|item| item.id() == id)
    }

    pub fn get_item_by_id_mut(&mut self, id: &str) -> Option<&mut S> {
        self.items_mut().iter_mut().find(|item| item.id() == id)
    }

    pub fn contains_id(&mut self, id: &str) -> bool {
        self.get_item_by_id(id).is_some()
    }
}

/// Document root used when writing a storage file
struct ItemsOut<'a, S> {
    items: &'a [S],
}

impl<S: Serializable> Serializable for ItemsOut<'_, S> {
    fn type_tag(&self) -> &'static str {
        ITEMS_FIELD
    }

    fn serialize(&self, writer: &mut Writer) {
        writer.write_collection(ITEMS_FIELD, self.items);
    }

    fn deserialize(&mut self, _reader: &Reader<'_>) {}
}

/// Document root used when reading a storage file
pub(crate) struct ItemsIn<'a, S> {
    pub items: &'a mut Vec<S>,
    pub registry: &'a TypeRegistry<S>,
}

impl<S: Serializable> Serializable for ItemsIn<'_, S> {
    fn type_tag(&self) -> &'static str {
        ITEMS_FIELD
    }

    fn serialize(&self, writer: &mut Writer) {
        writer.write_collection(ITEMS_FIELD, self.items.iter());
    }

    fn deserialize(&mut self, reader: &Reader<'_>) {
        *self.items = reader.read_collection(ITEMS_FIELD, self.registry);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreConfig;
    use crate::storage::MemoryBackend;

    #[derive(Debug, Default, Clone, PartialEq)]
    struct Level {
        id: String,
        order: i32,
        requires_unlock: bool,
        platforms: Option<String>,
    }

    impl Level {
        fn new(id: &str, order: i32) -> Self {
            Level {
                id: id.to_string(),
                order,
                ..Default::default()
            }
        }
    }

    impl Serializable for Level {
        fn type_tag(&self) -> &'static str {
            "level"
        }

        fn serialize(&self, writer: &mut Writer) {
            writer.write("id", &self.id);
            writer.write("order", &self.order);
            writer.write("requires_unlock", &self.requires_unlock);
            writer.write("platforms", &self.platforms);
        }

        fn deserialize(&mut self, reader: &Reader<'_>) {
            self.id = reader.read("id");
            self.order = reader.read("order");
            self.requires_unlock = reader.read("requires_unlock");
            self.platforms = reader.read("platforms");
        }
    }

    impl StorageItem for Level {
        fn check_availability(&self) -> bool {
            !self.requires_unlock
        }

        fn platform_expression(&self) -> Option<&str> {
            self.platforms.as_deref()
        }
    }

    impl Identified for Level {
        fn id(&self) -> &str {
            &self.id
        }
    }

    impl PartialOrd for Level {
        fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
            Some(self.cmp(other))
        }
    }

    impl Ord for Level {
        fn cmp(&self, other: &Self) -> Ordering {
            self.order.cmp(&other.order)
        }
    }

    impl Eq for Level {}

    fn memory_ctx(config: StoreConfig) -> (Arc<StoreContext>, Arc<MemoryBackend>) {
        let backend = Arc::new(MemoryBackend::new());
        let ctx = StoreContext::with_backend(config, backend.clone());
        (ctx, backend)
    }

    fn levels(ctx: &Arc<StoreContext>, catalog: Catalog) -> Storage<Level> {
        Storage::new(ctx.clone(), "levels", catalog, TypeRegistry::single())
    }

    #[test]
    fn test_starts_unloaded() {
        let (ctx, backend) = memory_ctx(StoreConfig::rooted_at("/vault"));
        let storage = levels(&ctx, Catalog::Persistent);
        assert!(!storage.is_loaded());
        assert_eq!(backend.read_count(), 0);
    }

    #[test]
    fn test_lazy_load_once() {
        let (ctx, backend) = memory_ctx(StoreConfig::rooted_at("/vault"));
        let mut storage = levels(&ctx, Catalog::Persistent);

        assert!(storage.items().is_empty());
        assert!(storage.is_loaded());
        storage.items();
        storage.get_item_by_id("nope");
        storage.load();
        assert_eq!(backend.read_count(), 1);
    }

    #[test]
    fn test_apply_then_reload() {
        let (ctx, backend) = memory_ctx(StoreConfig::rooted_at("/vault"));
        let mut storage = levels(&ctx, Catalog::Persistent);
        storage.push(Level::new("forest", 2));
        storage.push(Level::new("cave", 1));
        storage.apply().unwrap();

        let path = PathBuf::from("/vault/persistent/Data/levels.json");
        assert!(backend.get(&path).unwrap().contains("\"forest\""));

        let mut fresh = levels(&ctx, Catalog::Persistent);
        let ids: Vec<&str> = fresh.items().iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, vec!["forest", "cave"]);
    }

    #[test]
    fn test_filter_and_sort() {
        let (ctx, _backend) = memory_ctx(StoreConfig::rooted_at("/vault"));
        let mut storage = levels(&ctx, Catalog::Persistent);
        for (id, order) in [("c", 3), ("a", 1), ("skip", 0), ("b", 2)] {
            storage.push(Level::new(id, order));
        }
        storage.apply().unwrap();

        let mut filtered = levels(&ctx, Catalog::Persistent)
            .with_filter(|level| level.id != "skip")
            .with_natural_order();
        let ids: Vec<&str> = filtered.items().iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);

        let mut reversed = levels(&ctx, Catalog::Persistent)
            .with_sorter(|a, b| b.order.cmp(&a.order));
        assert_eq!(reversed.items()[0].id, "c");
    }

    #[test]
    fn test_availability_and_platform_gating() {
        let config = StoreConfig::rooted_at("/vault").with_platforms(["android"]);
        let (ctx, _backend) = memory_ctx(config.clone());
        let mut storage = levels(&ctx, Catalog::Persistent);
        storage.push(Level::new("open", 1));
        storage.push(Level {
            requires_unlock: true,
            ..Level::new("locked", 2)
        });
        storage.push(Level {
            platforms: Some("ios".to_string()),
            ..Level::new("ios_only", 3)
        });
        storage.push(Level {
            platforms: Some("android|ios".to_string()),
            ..Level::new("mobile", 4)
        });
        storage.apply().unwrap();

        let mut runtime = levels(&ctx, Catalog::Persistent);
        let ids: Vec<&str> = runtime.items().iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, vec!["open", "mobile"]);

        // The editor sees everything
        let editor_backend = Arc::new(MemoryBackend::new());
        let path = PathBuf::from("/vault/persistent/Data/levels.json");
        editor_backend.insert(path.clone(), ctx.backend().read(&path).unwrap().unwrap());
        let editor_ctx = StoreContext::with_backend(config.with_editor(true), editor_backend);
        let mut editor = levels(&editor_ctx, Catalog::Persistent);
        assert_eq!(editor.len(), 4);
    }

    #[test]
    fn test_packaged_data_encrypted_outside_editor() {
        let (ctx, backend) = memory_ctx(StoreConfig::rooted_at("/vault"));
        let mut storage = levels(&ctx, Catalog::Streaming);
        storage.push(Level::new("packaged", 1));
        storage.apply().unwrap();

        let raw = backend
            .get(&PathBuf::from("/vault/streaming/Data/levels.json"))
            .unwrap();
        assert!(!raw.contains("packaged"));

        let mut fresh = levels(&ctx, Catalog::Streaming);
        assert_eq!(fresh.items()[0].id, "packaged");
    }

    #[test]
    fn test_editor_writes_packaged_data_plain() {
        let (ctx, backend) = memory_ctx(StoreConfig::rooted_at("/vault").with_editor(true));
        let mut storage = levels(&ctx, Catalog::Streaming);
        storage.push(Level::new("authored", 1));
        storage.apply().unwrap();

        let raw = backend
            .get(&PathBuf::from("/vault/streaming/Data/levels.json"))
            .unwrap();
        assert!(raw.contains("authored"));
    }

    #[test]
    fn test_corrupt_file_leaves_unloaded() {
        let (ctx, backend) = memory_ctx(StoreConfig::rooted_at("/vault"));
        backend.insert("/vault/persistent/Data/levels.json", "{\"items\": [ {");
        let mut storage = levels(&ctx, Catalog::Persistent);

        assert!(!storage.load());
        assert!(!storage.is_loaded());
    }

    #[test]
    fn test_failed_load_is_never_written() {
        let (ctx, backend) = memory_ctx(StoreConfig::rooted_at("/vault"));
        let path = PathBuf::from("/vault/persistent/Data/levels.json");
        backend.insert(path.clone(), "{\"items\": [ {");
        let mut storage = levels(&ctx, Catalog::Persistent);

        storage.push(Level::new("a", 1));
        storage.push(Level::new("b", 2));
        // Changes stay in memory instead of being wiped by a retry
        assert_eq!(storage.items().len(), 2);
        assert!(!storage.is_loaded());

        assert!(matches!(storage.apply(), Err(StoreError::NotLoaded(_))));
        assert_eq!(backend.write_count(), 0);
        assert_eq!(backend.get(&path).as_deref(), Some("{\"items\": [ {"));
        assert_eq!(backend.read_count(), 1);
    }

    #[test]
    fn test_reload_retries_after_failure() {
        let (ctx, backend) = memory_ctx(StoreConfig::rooted_at("/vault"));
        backend.insert("/vault/persistent/Data/levels.json", "{\"items\": [ {");
        let mut storage = levels(&ctx, Catalog::Persistent);
        assert!(!storage.load());

        backend.insert(
            "/vault/persistent/Data/levels.json",
            r#"{"items":[{"$type":"level","id":"fixed","order":1}]}"#,
        );
        assert!(!storage.load());
        assert!(storage.reload());
        assert!(storage.contains_id("fixed"));
    }

    #[test]
    fn test_corrupt_ciphertext_leaves_unloaded() {
        let (ctx, backend) = memory_ctx(StoreConfig::rooted_at("/vault"));
        backend.insert("/vault/streaming/Data/levels.json", "AAAAbm90IHJlYWxseQ==");
        let mut storage = levels(&ctx, Catalog::Streaming);

        assert!(!storage.load());
    }

    #[test]
    fn test_remove_where() {
        let (ctx, _backend) = memory_ctx(StoreConfig::rooted_at("/vault"));
        let mut storage = levels(&ctx, Catalog::Persistent);
        storage.push(Level::new("a", 1));
        storage.push(Level::new("b", 2));
        assert_eq!(storage.remove_where(|l| l.order > 1), 1);
        assert!(storage.contains_id("a"));
        assert!(!storage.contains_id("b"));
    }
}
