//! End-to-end storage and save document behaviour against the real filesystem

use std::sync::Arc;

use gamevault::game_data::{DirtyHandle, GameData, Module, ModuleKind, ModuleRegistry};
use gamevault::storage::{Identified, Storage, StorageItem};
use gamevault::{Catalog, CryptKey, Reader, Serializable, StoreConfig, StoreContext, TypeRegistry, Writer};

#[derive(Debug, Default, Clone, PartialEq)]
struct Entry {
    id: String,
    path: String,
    value: String,
}

impl Entry {
    fn new(id: &str, path: &str, value: &str) -> Self {
        Entry {
            id: id.to_string(),
            path: path.to_string(),
            value: value.to_string(),
        }
    }
}

impl Serializable for Entry {
    fn type_tag(&self) -> &'static str {
        "entry"
    }

    fn serialize(&self, writer: &mut Writer) {
        writer.write("ID", &self.id);
        writer.write("path", &self.path);
        writer.write("value", &self.value);
    }

    fn deserialize(&mut self, reader: &Reader<'_>) {
        self.id = reader.read("ID");
        self.path = reader.read("path");
        self.value = reader.read("value");
    }
}

impl StorageItem for Entry {}

impl Identified for Entry {
    fn id(&self) -> &str {
        &self.id
    }
}

fn entries(ctx: &Arc<StoreContext>, catalog: Catalog) -> Storage<Entry> {
    Storage::new(ctx.clone(), "entries", catalog, TypeRegistry::single())
}

#[test]
fn test_entries_survive_reload() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = StoreContext::new(StoreConfig::rooted_at(dir.path()));

    let mut storage = entries(&ctx, Catalog::Persistent);
    storage.push(Entry::new("a", "x/y", "1"));
    storage.push(Entry::new("b", "x/y", "2"));
    storage.apply().unwrap();

    let mut fresh = entries(&ctx, Catalog::Persistent);
    assert!(fresh.load());
    assert_eq!(fresh.get_item_by_id("a").unwrap().value, "1");
    assert_eq!(fresh.get_item_by_id("b").unwrap().value, "2");
    assert_eq!(fresh.get_item_by_id("b").unwrap().path, "x/y");
    assert!(fresh.get_item_by_id("c").is_none());
    assert_eq!(fresh.items(), storage.items());
}

#[test]
fn test_packaged_entries_are_encrypted_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = StoreContext::new(StoreConfig::rooted_at(dir.path()).with_passphrase("build-42"));

    let mut storage = entries(&ctx, Catalog::Streaming);
    storage.push(Entry::new("a", "x/y", "1"));
    storage.apply().unwrap();

    let on_disk = std::fs::read_to_string(storage.path()).unwrap();
    assert!(!on_disk.contains("x/y"));

    let mut fresh = entries(&ctx, Catalog::Streaming);
    assert_eq!(fresh.len(), 1);

    // A different build key cannot read it and reports not loaded
    let other = StoreContext::new(StoreConfig::rooted_at(dir.path()).with_passphrase("build-43"));
    let mut foreign = entries(&other, Catalog::Streaming);
    assert!(!foreign.load());
    assert!(foreign.is_empty());
}

struct Progress {
    level: u32,
    dirty: DirtyHandle,
}

impl Serializable for Progress {
    fn type_tag(&self) -> &'static str {
        Self::TAG
    }

    fn serialize(&self, writer: &mut Writer) {
        writer.write("level", &self.level);
    }

    fn deserialize(&mut self, reader: &Reader<'_>) {
        self.level = reader.read("level");
    }
}

impl Module for Progress {}

impl ModuleKind for Progress {
    const TAG: &'static str = "progress";

    fn create(dirty: DirtyHandle) -> Self {
        Progress { level: 1, dirty }
    }
}

#[test]
fn test_save_document_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = StoreContext::new(StoreConfig::rooted_at(dir.path()));
    let registry = Arc::new(ModuleRegistry::new().with::<Progress>());
    let key = CryptKey::get("player-7");

    let mut data = GameData::new(ctx.clone(), "save", registry.clone()).with_key(key.clone());
    assert!(data.load());
    let progress = data.get_or_create::<Progress>().unwrap();
    progress.level = 12;
    progress.dirty.set_dirty();
    data.save().unwrap();

    let mut reloaded = GameData::new(ctx, "save", registry).with_key(key);
    assert!(reloaded.load());
    assert_eq!(reloaded.get::<Progress>().unwrap().level, 12);
}
