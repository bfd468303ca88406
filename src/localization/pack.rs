//! Translation hand-off files
//!
//! A `LanguagePack` carries the phrases a translator has to work on:
//! `missing()` collects the source phrases a target table lacks, the pack
//! is exported as plain JSON, translated outside the game, imported back
//! and applied to the target table.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::content::LanguageContent;
use super::language::Language;
use crate::error::{Result, StoreError};
use crate::storage::atomic_write;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanguagePack {
    /// Language the entries are (to be) written in
    pub language: Language,
    pub created: DateTime<Utc>,
    /// Phrase path → text
    pub entries: BTreeMap<String, String>,
}

impl LanguagePack {
    pub fn new(language: Language) -> Self {
        LanguagePack {
            language,
            created: Utc::now(),
            entries: BTreeMap::new(),
        }
    }

    /// Source phrases that `target` has no (non-empty) text for
    ///
    /// Entries hold the source text for the translator to replace.
    pub fn missing(source: &mut LanguageContent, target: &mut LanguageContent) -> Self {
        let mut pack = LanguagePack::new(target.language());
        for (key, text) in source.phrases() {
            let translated = target.get(key).is_some_and(|t| !t.trim().is_empty());
            if !translated {
                pack.entries.insert(key.clone(), text.clone());
            }
        }
        log::info!(
            "{} phrases missing from '{}' (source '{}')",
            pack.entries.len(),
            target.language(),
            source.language()
        );
        pack
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Writes the pack as indented JSON
    pub fn export(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)?;
        atomic_write(path, json.as_bytes())?;
        log::info!("Exported {} phrases to {}", self.entries.len(), path.display());
        Ok(())
    }

    pub fn import(path: impl AsRef<Path>) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Copies the non-empty entries into `content`, returning how many
    ///
    /// Does not write `content` back; call `apply()` on it for that. A
    /// table whose stored copy could not be read is refused.
    pub fn apply_to(&self, content: &mut LanguageContent) -> Result<usize> {
        if content.language() != self.language {
            return Err(StoreError::Parse(format!(
                "pack is for '{}', content is '{}'",
                self.language,
                content.language()
            )));
        }

        if !content.load() {
            return Err(StoreError::NotLoaded(content.path().display().to_string()));
        }

        let mut applied = 0;
        for (key, text) in &self.entries {
            if text.trim().is_empty() {
                continue;
            }
            content.set(key.clone(), text.clone());
            applied += 1;
        }
        Ok(applied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreConfig;
    use crate::context::StoreContext;
    use crate::storage::{Catalog, MemoryBackend};
    use std::sync::Arc;

    fn tables() -> (LanguageContent, LanguageContent) {
        let backend = Arc::new(MemoryBackend::new());
        let ctx = StoreContext::with_backend(StoreConfig::rooted_at("/vault"), backend);
        let mut english = LanguageContent::new(ctx.clone(), Language::English, Catalog::Project);
        english.set("menu.play", "Play");
        english.set("menu.quit", "Quit");
        english.set("menu.options", "Options");
        let mut spanish = LanguageContent::new(ctx, Language::Spanish, Catalog::Project);
        spanish.set("menu.play", "Jugar");
        spanish.set("menu.quit", " ");
        (english, spanish)
    }

    #[test]
    fn test_missing_lists_untranslated() {
        let (mut english, mut spanish) = tables();
        let pack = LanguagePack::missing(&mut english, &mut spanish);
        assert_eq!(pack.language, Language::Spanish);
        assert_eq!(
            pack.entries.keys().collect::<Vec<_>>(),
            vec!["menu.options", "menu.quit"]
        );
        assert_eq!(pack.entries["menu.quit"], "Quit");
    }

    #[test]
    fn test_export_import_apply() {
        let (mut english, mut spanish) = tables();
        let mut pack = LanguagePack::missing(&mut english, &mut spanish);
        pack.entries.insert("menu.quit".to_string(), "Salir".to_string());
        pack.entries.insert("menu.options".to_string(), String::new());

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("es.json");
        pack.export(&path).unwrap();
        let imported = LanguagePack::import(&path).unwrap();
        assert_eq!(imported, pack);

        assert_eq!(imported.apply_to(&mut spanish).unwrap(), 1);
        assert_eq!(spanish.get("menu.quit"), Some("Salir"));
        assert!(!spanish.contains("menu.options"));

        assert!(imported.apply_to(&mut english).is_err());
    }

    #[test]
    fn test_apply_refuses_unreadable_table() {
        let backend = Arc::new(MemoryBackend::new());
        backend.insert("/vault/project/Data/lang_es.json", "{\"phrases\": {");
        let ctx = StoreContext::with_backend(StoreConfig::rooted_at("/vault"), backend.clone());
        let mut spanish = LanguageContent::new(ctx, Language::Spanish, Catalog::Project);

        let mut pack = LanguagePack::new(Language::Spanish);
        pack.entries.insert("menu.play".to_string(), "Jugar".to_string());
        assert!(matches!(pack.apply_to(&mut spanish), Err(StoreError::NotLoaded(_))));
        assert!(spanish.phrases().is_empty());
        assert_eq!(backend.write_count(), 0);
    }
}
