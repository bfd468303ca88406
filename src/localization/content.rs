//! Phrase table for one language
//!
//! Stored as `lang_<code>` under its catalog, through the same
//! serializer and encryption rules as `Storage`. Loaded on first access;
//! a table that failed to load stays unloaded until `reload()` and is
//! never written back.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use super::language::Language;
use crate::context::StoreContext;
use crate::crypt;
use crate::error::{Result, StoreError};
use crate::serialization::{JsonSerializer, Reader, Serializable, Serializer, Writer};
use crate::storage::Catalog;

const PHRASES_FIELD: &str = "phrases";

pub struct LanguageContent {
    ctx: Arc<StoreContext>,
    language: Language,
    catalog: Catalog,
    serializer: JsonSerializer,
    phrases: BTreeMap<String, String>,
    loaded: bool,
    load_failed: bool,
}

impl LanguageContent {
    pub fn new(ctx: Arc<StoreContext>, language: Language, catalog: Catalog) -> Self {
        let serializer = match catalog {
            Catalog::Project => JsonSerializer::pretty(),
            _ => JsonSerializer::default(),
        };
        LanguageContent {
            ctx,
            language,
            catalog,
            serializer,
            phrases: BTreeMap::new(),
            loaded: false,
            load_failed: false,
        }
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn file_name(&self) -> String {
        format!("lang_{}", self.language.code())
    }

    pub fn path(&self) -> PathBuf {
        self.ctx
            .data_path(self.catalog, &self.file_name(), self.serializer.extension())
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Loads the table if not loaded yet; failures are logged
    pub fn load(&mut self) -> bool {
        if self.loaded {
            return true;
        }
        if self.load_failed {
            return false;
        }
        let path = self.path();
        match self.read_phrases() {
            Ok(phrases) => {
                log::info!("Loaded {} phrases for '{}'", phrases.len(), self.language);
                self.phrases = phrases;
                self.loaded = true;
            }
            Err(e) => {
                log::error!("Failed to load {}: {}", path.display(), e);
                self.phrases.clear();
                self.load_failed = true;
            }
        }
        self.loaded
    }

    pub fn reload(&mut self) -> bool {
        self.loaded = false;
        self.load_failed = false;
        self.phrases.clear();
        self.load()
    }

    /// Writes the table back; refuses when the stored table did not load
    pub fn apply(&mut self) -> Result<()> {
        if !self.load() {
            return Err(StoreError::NotLoaded(self.path().display().to_string()));
        }
        let text = self.serializer.serialize(&PhraseTable {
            phrases: &mut self.phrases,
        })?;
        let key = self.ctx.encrypts(self.catalog).then(|| self.ctx.default_key());
        let text = crypt::seal(text, key);
        self.ctx.backend().write(&self.path(), &text)
    }

    pub fn get(&mut self, key: &str) -> Option<&str> {
        self.load();
        self.phrases.get(key).map(String::as_str)
    }

    /// Phrase for `key`, or the key itself when untranslated
    pub fn text(&mut self, key: &str) -> String {
        self.get(key).unwrap_or(key).to_string()
    }

    pub fn set(&mut self, key: impl Into<String>, text: impl Into<String>) {
        self.load();
        self.phrases.insert(key.into(), text.into());
    }

    pub fn remove(&mut self, key: &str) -> bool {
        self.load();
        self.phrases.remove(key).is_some()
    }

    pub fn contains(&mut self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn phrases(&mut self) -> &BTreeMap<String, String> {
        self.load();
        &self.phrases
    }

    pub fn len(&mut self) -> usize {
        self.phrases().len()
    }

    pub fn is_empty(&mut self) -> bool {
        self.phrases().is_empty()
    }

    fn read_phrases(&self) -> Result<BTreeMap<String, String>> {
        let raw = match self.ctx.backend().read(&self.path())? {
            Some(raw) if !raw.trim().is_empty() => raw,
            _ => return Ok(BTreeMap::new()),
        };
        let key = self.ctx.encrypts(self.catalog).then(|| self.ctx.default_key());
        let text = crypt::unseal(raw, key)?;

        let mut phrases = BTreeMap::new();
        self.serializer.deserialize(
            &mut PhraseTable {
                phrases: &mut phrases,
            },
            &text,
        )?;
        Ok(phrases)
    }
}

struct PhraseTable<'a> {
    phrases: &'a mut BTreeMap<String, String>,
}

impl Serializable for PhraseTable<'_> {
    fn type_tag(&self) -> &'static str {
        "language_content"
    }

    fn serialize(&self, writer: &mut Writer) {
        writer.write(PHRASES_FIELD, &*self.phrases);
    }

    fn deserialize(&mut self, reader: &Reader<'_>) {
        *self.phrases = reader.read_map(PHRASES_FIELD);
    }
}
