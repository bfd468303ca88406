//! Document modules and the dirty capability they report through

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::serialization::{Serializable, TypeRegistry};

type Listener = Arc<dyn Fn() + Send + Sync>;

#[derive(Default)]
struct DirtyState {
    dirty: AtomicBool,
    listeners: Mutex<Vec<Listener>>,
}

/// Capability to mark the owning document as changed
///
/// Handed to every module at construction. Clones share one flag, so a
/// module can report its own changes without knowing about files.
#[derive(Clone, Default)]
pub struct DirtyHandle {
    state: Arc<DirtyState>,
}

impl DirtyHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the document dirty and notifies listeners
    ///
    /// Listeners run after the listener list is released, so they may mark
    /// dirty or subscribe themselves.
    pub fn set_dirty(&self) {
        self.state.dirty.store(true, Ordering::SeqCst);
        let listeners: Vec<Listener> = self
            .state
            .listeners
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone();
        for listener in &listeners {
            listener();
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.state.dirty.load(Ordering::SeqCst)
    }

    /// Registers a callback fired on every `set_dirty`
    pub fn subscribe<F: Fn() + Send + Sync + 'static>(&self, listener: F) {
        self.state
            .listeners
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(Arc::new(listener));
    }

    /// Clears the flag, returning whether it was set
    pub(crate) fn take(&self) -> bool {
        self.state.dirty.swap(false, Ordering::SeqCst)
    }

    /// Sets the flag without notifying (restoring after a failed save)
    pub(crate) fn restore(&self) {
        self.state.dirty.store(true, Ordering::SeqCst);
    }
}

impl fmt::Debug for DirtyHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DirtyHandle")
            .field("dirty", &self.is_dirty())
            .finish()
    }
}

/// Downcasting support for `dyn Module`
pub trait AsAny {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Independently serializable part of a `GameData` document
pub trait Module: Serializable + AsAny + Send {
    /// Whether this module is included in server sync payloads
    fn server_syncable(&self) -> bool {
        false
    }
}

/// A concrete module type that can be registered and created on demand
///
/// `TAG` must equal what `Serializable::type_tag` returns.
pub trait ModuleKind: Module + Sized {
    const TAG: &'static str;

    fn create(dirty: DirtyHandle) -> Self;
}

type ModuleFactory = fn(DirtyHandle) -> Box<dyn Module>;

/// Known module types, replacing runtime type scanning
#[derive(Default)]
pub struct ModuleRegistry {
    factories: HashMap<&'static str, ModuleFactory>,
    order: Vec<&'static str>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<M: ModuleKind + 'static>(&mut self) -> &mut Self {
        fn build<M: ModuleKind + 'static>(dirty: DirtyHandle) -> Box<dyn Module> {
            Box::new(M::create(dirty))
        }

        if self.factories.insert(M::TAG, build::<M>).is_none() {
            self.order.push(M::TAG);
        }
        self
    }

    /// Builder form of `register`
    pub fn with<M: ModuleKind + 'static>(mut self) -> Self {
        self.register::<M>();
        self
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.factories.contains_key(tag)
    }

    pub fn tags(&self) -> &[&'static str] {
        &self.order
    }

    pub fn create(&self, tag: &str, dirty: DirtyHandle) -> Option<Box<dyn Module>> {
        self.factories.get(tag).map(|factory| factory(dirty))
    }

    /// Type registry whose factories hand out `dirty`
    pub(crate) fn bind(&self, dirty: &DirtyHandle) -> TypeRegistry<Box<dyn Module>> {
        let mut registry = TypeRegistry::new();
        for &tag in &self.order {
            let factory = self.factories[tag];
            let dirty = dirty.clone();
            registry.register(tag, move || factory(dirty.clone()));
        }
        registry
    }
}

impl fmt::Debug for ModuleRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleRegistry")
            .field("tags", &self.order)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serialization::{Reader, Writer};
    use std::sync::atomic::AtomicUsize;

    struct Wallet {
        coins: u32,
        dirty: DirtyHandle,
    }

    impl Wallet {
        fn add(&mut self, coins: u32) {
            self.coins += coins;
            self.dirty.set_dirty();
        }
    }

    impl Serializable for Wallet {
        fn type_tag(&self) -> &'static str {
            Self::TAG
        }

        fn serialize(&self, writer: &mut Writer) {
            writer.write("coins", &self.coins);
        }

        fn deserialize(&mut self, reader: &Reader<'_>) {
            self.coins = reader.read("coins");
        }
    }

    impl Module for Wallet {}

    impl ModuleKind for Wallet {
        const TAG: &'static str = "wallet";

        fn create(dirty: DirtyHandle) -> Self {
            Wallet { coins: 0, dirty }
        }
    }

    #[test]
    fn test_module_reports_through_handle() {
        let handle = DirtyHandle::new();
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = fired.clone();
        handle.subscribe(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let mut wallet = Wallet::create(handle.clone());
        assert!(!handle.is_dirty());
        wallet.add(5);
        assert!(handle.is_dirty());
        assert_eq!(fired.load(Ordering::SeqCst), 1);

        assert!(handle.take());
        assert!(!handle.is_dirty());
    }

    #[test]
    fn test_listener_may_reenter_handle() {
        let handle = DirtyHandle::new();
        let fired = Arc::new(AtomicUsize::new(0));
        let inner = handle.clone();
        let counter = fired.clone();
        handle.subscribe(move || {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                inner.subscribe(|| {});
                inner.set_dirty();
            }
        });

        handle.set_dirty();
        assert_eq!(fired.load(Ordering::SeqCst), 2);
        assert!(handle.is_dirty());
    }

    #[test]
    fn test_registry_creates_with_handle() {
        let registry = ModuleRegistry::new().with::<Wallet>();
        assert_eq!(registry.tags(), &["wallet"]);

        let handle = DirtyHandle::new();
        let module = registry.create("wallet", handle.clone()).unwrap();
        assert_eq!(module.type_tag(), "wallet");
        assert!(registry.create("unknown", handle).is_none());
    }

    #[test]
    fn test_downcast() {
        let module: Box<dyn Module> = Box::new(Wallet::create(DirtyHandle::new()));
        let module: &dyn Module = module.as_ref();
        assert!(module.as_any().downcast_ref::<Wallet>().is_some());
    }
}
