//! Shared storage context
//!
//! One `StoreContext` is created at startup and shared (`Arc`) by every
//! storage and document. It owns the config, the backend files go through,
//! the default encryption key and the teardown list that replaces a global
//! "unload" event: anything that must be reset between runs registers a
//! cleanup here, and `teardown()` calls them directly.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use crate::config::StoreConfig;
use crate::crypt::CryptKey;
use crate::storage::{Catalog, FsBackend, StorageBackend};

type Cleanup = Box<dyn FnOnce() + Send>;

pub struct StoreContext {
    config: StoreConfig,
    backend: Arc<dyn StorageBackend>,
    default_key: CryptKey,
    cleanups: Mutex<Vec<Cleanup>>,
}

impl StoreContext {
    /// Context writing to the real filesystem
    pub fn new(config: StoreConfig) -> Arc<Self> {
        Self::with_backend(config, Arc::new(FsBackend))
    }

    pub fn with_backend(config: StoreConfig, backend: Arc<dyn StorageBackend>) -> Arc<Self> {
        let default_key = CryptKey::get(&config.passphrase);
        log::debug!(
            "Store context ready (editor: {}, platforms: {:?})",
            config.editor,
            config.platforms
        );
        Arc::new(StoreContext {
            config,
            backend,
            default_key,
            cleanups: Mutex::new(Vec::new()),
        })
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn backend(&self) -> &dyn StorageBackend {
        self.backend.as_ref()
    }

    pub fn default_key(&self) -> &CryptKey {
        &self.default_key
    }

    pub fn is_editor(&self) -> bool {
        self.config.editor
    }

    pub fn platforms(&self) -> &[String] {
        &self.config.platforms
    }

    /// Whether data in `catalog` is stored encrypted under this context
    pub fn encrypts(&self, catalog: Catalog) -> bool {
        catalog.is_packaged() && !self.config.editor
    }

    /// `<root>/Data/<name>.<extension>`
    pub fn data_path(&self, catalog: Catalog, name: &str, extension: &str) -> PathBuf {
        self.config
            .root(catalog)
            .join(Catalog::DATA_DIR)
            .join(format!("{}.{}", name, extension))
    }

    /// Registers a cleanup to run on `teardown()`
    pub fn on_teardown<F: FnOnce() + Send + 'static>(&self, cleanup: F) {
        self.lock_cleanups().push(Box::new(cleanup));
    }

    /// Runs every registered cleanup once, in registration order
    pub fn teardown(&self) {
        let cleanups = std::mem::take(&mut *self.lock_cleanups());
        log::debug!("Running {} teardown callbacks", cleanups.len());
        for cleanup in cleanups {
            cleanup();
        }
    }

    fn lock_cleanups(&self) -> std::sync::MutexGuard<'_, Vec<Cleanup>> {
        self.cleanups
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_data_path_layout() {
        let ctx = StoreContext::new(StoreConfig::rooted_at("/tmp/vault"));
        assert_eq!(
            ctx.data_path(Catalog::Persistent, "profile", "json"),
            PathBuf::from("/tmp/vault/persistent/Data/profile.json")
        );
    }

    #[test]
    fn test_encrypts_only_packaged_outside_editor() {
        let ctx = StoreContext::new(StoreConfig::rooted_at("/tmp/vault"));
        assert!(ctx.encrypts(Catalog::Streaming));
        assert!(!ctx.encrypts(Catalog::Persistent));
        assert!(!ctx.encrypts(Catalog::Project));

        let editor = StoreContext::new(StoreConfig::rooted_at("/tmp/vault").with_editor(true));
        assert!(!editor.encrypts(Catalog::Streaming));
    }

    #[test]
    fn test_teardown_runs_once_in_order() {
        let ctx = StoreContext::new(StoreConfig::rooted_at("/tmp/vault"));
        let calls = Arc::new(Mutex::new(Vec::new()));
        for i in 0..3 {
            let calls = calls.clone();
            ctx.on_teardown(move || calls.lock().unwrap().push(i));
        }

        ctx.teardown();
        ctx.teardown();
        assert_eq!(*calls.lock().unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn test_teardown_accepts_new_registrations_after() {
        let ctx = StoreContext::new(StoreConfig::rooted_at("/tmp/vault"));
        let count = Arc::new(AtomicUsize::new(0));
        ctx.teardown();
        let c = count.clone();
        ctx.on_teardown(move || {
            c.fetch_add(1, Ordering::SeqCst);
        });
        ctx.teardown();
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
