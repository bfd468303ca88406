//! Explicit type registry for polymorphic data
//!
//! Each concrete type is registered under its stable tag together with a
//! factory that builds a blank instance. The reader asks the registry for
//! a fresh instance and then deserializes into it.

use std::collections::HashMap;
use std::fmt;

use super::Serializable;

type Factory<T> = Box<dyn Fn() -> T + Send + Sync>;

/// Tag → factory map producing values of `T`
///
/// `T` is usually a boxed trait object (`Box<dyn Module>`), or a plain
/// struct for single-type collections.
pub struct TypeRegistry<T> {
    factories: HashMap<&'static str, Factory<T>>,
    order: Vec<&'static str>,
    untagged: Option<&'static str>,
}

impl<T> TypeRegistry<T> {
    pub fn new() -> Self {
        TypeRegistry {
            factories: HashMap::new(),
            order: Vec::new(),
            untagged: None,
        }
    }

    /// Registers a factory under `tag`
    ///
    /// Registering the same tag again replaces the earlier factory.
    pub fn register<F>(&mut self, tag: &'static str, factory: F) -> &mut Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        if self.factories.insert(tag, Box::new(factory)).is_some() {
            log::warn!("Type tag '{}' registered twice, keeping the latest", tag);
        } else {
            self.order.push(tag);
        }
        self
    }

    /// Builder form of `register`
    pub fn with<F>(mut self, tag: &'static str, factory: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.register(tag, factory);
        self
    }

    /// Tag assumed for elements written without a `$type` (hand-authored data)
    pub fn with_untagged(mut self, tag: &'static str) -> Self {
        self.untagged = Some(tag);
        self
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.factories.contains_key(tag)
    }

    /// Registered tags in registration order
    pub fn tags(&self) -> &[&'static str] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Builds a blank instance for `tag`
    pub fn create(&self, tag: &str) -> Option<T> {
        self.factories.get(tag).map(|factory| factory())
    }

    /// Builds a blank instance for an element's (possibly absent) tag
    pub(crate) fn create_for(&self, tag: Option<&str>) -> Option<T> {
        match tag.or(self.untagged) {
            Some(tag) => self.create(tag),
            None => None,
        }
    }
}

impl<T: Serializable + Default + 'static> TypeRegistry<T> {
    /// Registry for a collection holding a single concrete type
    ///
    /// Elements without a `$type` are read as `T` too.
    pub fn single() -> Self {
        let tag = T::default().type_tag();
        TypeRegistry::new().with(tag, T::default).with_untagged(tag)
    }
}

impl<T> Default for TypeRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for TypeRegistry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("tags", &self.order)
            .field("untagged", &self.untagged)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serialization::Reader;
    use crate::serialization::test_types::{Square, shape_registry};
    use serde_json::json;

    #[test]
    fn test_create_registered() {
        let registry = shape_registry();
        assert_eq!(registry.tags(), &["square", "circle"]);
        assert!(registry.create("square").is_some());
        assert!(registry.create("hexagon").is_none());
    }

    #[test]
    fn test_single_reads_untagged_elements() {
        let registry = TypeRegistry::<Square>::single();
        let doc = json!({ "items": [ { "side": 2.0 }, { "$type": "square", "side": 3.0 } ] });
        let reader = Reader::from_value(&doc).unwrap();
        let items = reader.read_collection("items", &registry);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].side, 2.0);
        assert_eq!(items[1].side, 3.0);
    }

    #[test]
    fn test_untagged_rejected_without_fallback() {
        let doc = json!({ "items": [ { "side": 2.0 } ] });
        let reader = Reader::from_value(&doc).unwrap();
        assert!(reader.read_collection("items", &shape_registry()).is_empty());
    }
}
