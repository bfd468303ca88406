//! Named-field reader for one object
//!
//! Every lookup is tolerant: a missing field or a value of the wrong shape
//! reads as the type's default. This is what lets old save files load into
//! newer code.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use super::field::Field;
use super::registry::TypeRegistry;
use super::{Serializable, TYPE_KEY};

/// Read access to one object's fields
#[derive(Clone, Copy)]
pub struct Reader<'a> {
    fields: &'a Map<String, Value>,
}

impl<'a> Reader<'a> {
    pub fn new(fields: &'a Map<String, Value>) -> Self {
        Reader { fields }
    }

    /// Reader over a node, if the node is an object
    pub fn from_value(value: &'a Value) -> Option<Self> {
        value.as_object().map(Reader::new)
    }

    pub fn has(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Names of all fields present
    pub fn field_names(&self) -> impl Iterator<Item = &'a str> {
        self.fields.keys().map(String::as_str)
    }

    /// The object's own `$type`, when it was written as a nested object
    pub fn type_tag(&self) -> Option<&'a str> {
        self.fields.get(TYPE_KEY).and_then(Value::as_str)
    }

    /// Raw node for a field
    pub fn raw(&self, name: &str) -> Option<&'a Value> {
        self.fields.get(name)
    }

    /// Reads a field, returning `None` when absent or mismatched
    pub fn try_read<T: Field>(&self, name: &str) -> Option<T> {
        let value = self.fields.get(name)?;
        let parsed = T::from_value(value);
        if parsed.is_none() {
            log::debug!("Field '{}' has unexpected shape: {}", name, value);
        }
        parsed
    }

    /// Reads a field, or the type's default
    pub fn read<T: Field + Default>(&self, name: &str) -> T {
        self.try_read(name).unwrap_or_default()
    }

    pub fn read_or<T: Field>(&self, name: &str, default: T) -> T {
        self.try_read(name).unwrap_or(default)
    }

    /// Reads a list of plain values, dropping elements that do not convert
    pub fn read_list<T: Field>(&self, name: &str) -> Vec<T> {
        self.read(name)
    }

    /// Reads a string-keyed map of plain values
    pub fn read_map<T: Field>(&self, name: &str) -> BTreeMap<String, T> {
        self.read(name)
    }

    /// Restores a nested object in place
    ///
    /// Returns false (leaving `object` untouched) when the field is absent.
    pub fn read_object_into<T: Serializable + ?Sized>(&self, name: &str, object: &mut T) -> bool {
        match self.fields.get(name).and_then(Reader::from_value) {
            Some(nested) => {
                object.deserialize(&nested);
                true
            }
            None => false,
        }
    }

    /// Reads a nested object of a known concrete type
    pub fn read_object<T: Serializable + Default>(&self, name: &str) -> T {
        let mut object = T::default();
        self.read_object_into(name, &mut object);
        object
    }

    /// Reads a nested polymorphic object through `registry`
    pub fn read_polymorphic<T: Serializable>(
        &self,
        name: &str,
        registry: &TypeRegistry<T>,
    ) -> Option<T> {
        self.fields
            .get(name)
            .and_then(|value| Self::instantiate(value, registry))
    }

    /// Reads a sequence of polymorphic objects
    ///
    /// Elements with an unknown type tag are logged and skipped; the rest
    /// keep their order.
    pub fn read_collection<T: Serializable>(&self, name: &str, registry: &TypeRegistry<T>) -> Vec<T> {
        let Some(values) = self.fields.get(name).and_then(Value::as_array) else {
            return Vec::new();
        };
        values
            .iter()
            .filter_map(|value| Self::instantiate(value, registry))
            .collect()
    }

    /// Reads a string-keyed mapping of polymorphic objects
    pub fn read_dictionary<T: Serializable>(
        &self,
        name: &str,
        registry: &TypeRegistry<T>,
    ) -> BTreeMap<String, T> {
        let Some(map) = self.fields.get(name).and_then(Value::as_object) else {
            return BTreeMap::new();
        };
        map.iter()
            .filter_map(|(key, value)| {
                Self::instantiate(value, registry).map(|item| (key.clone(), item))
            })
            .collect()
    }

    /// Builds one element from its node, or `None` if it cannot be typed
    pub(crate) fn instantiate<T: Serializable>(value: &Value, registry: &TypeRegistry<T>) -> Option<T> {
        let nested = Reader::from_value(value)?;
        let tag = nested.type_tag();
        let Some(mut item) = registry.create_for(tag) else {
            log::warn!(
                "Skipping element with unregistered type '{}'",
                tag.unwrap_or("<none>")
            );
            return None;
        };
        item.deserialize(&nested);
        Some(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packer::{Color, IntRange};
    use crate::serialization::test_types::{Circle, Shape, Square, shape_registry};
    use crate::serialization::{PackStyle, Writer};
    use serde_json::json;

    #[test]
    fn test_missing_fields_default() {
        let doc = json!({ "hp": 5 });
        let reader = Reader::from_value(&doc).unwrap();
        assert_eq!(reader.read::<i32>("hp"), 5);
        assert_eq!(reader.read::<i32>("mana"), 0);
        assert_eq!(reader.read_or("mana", 10i32), 10);
        assert_eq!(reader.read::<String>("hp"), "");
        assert!(reader.read_list::<u8>("inventory").is_empty());
    }

    #[test]
    fn test_polymorphic_roundtrip() {
        let shapes: Vec<Box<dyn Shape>> = vec![
            Box::new(Square {
                side: 2.0,
                tint: Color::WHITE,
            }),
            Box::new(Circle {
                radius: 1.5,
                spawn: IntRange::new(1, 3),
            }),
        ];
        let mut writer = Writer::new(PackStyle::Token);
        writer.write_collection("shapes", &shapes);
        let doc = writer.into_value();

        let reader = Reader::from_value(&doc).unwrap();
        let loaded = reader.read_collection("shapes", &shape_registry());
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].type_tag(), "square");
        assert_eq!(loaded[0].area(), 4.0);
        assert_eq!(loaded[1].type_tag(), "circle");
        assert_eq!(loaded[1].area(), std::f64::consts::PI * 2.25);
    }

    #[test]
    fn test_unknown_type_skipped() {
        let doc = json!({
            "shapes": [
                { "$type": "square", "side": 3.0 },
                { "$type": "hexagon", "side": 1.0 },
                { "$type": "circle", "radius": 1.0 },
            ]
        });
        let reader = Reader::from_value(&doc).unwrap();
        let loaded = reader.read_collection("shapes", &shape_registry());
        let tags: Vec<&str> = loaded.iter().map(|s| s.type_tag()).collect();
        assert_eq!(tags, vec!["square", "circle"]);
        assert_eq!(loaded[0].area(), 9.0);
    }

    #[test]
    fn test_read_dictionary() {
        let doc = json!({
            "by_name": {
                "big": { "$type": "square", "side": 10.0 },
                "gone": { "$type": "triangle" },
            }
        });
        let reader = Reader::from_value(&doc).unwrap();
        let map = reader.read_dictionary("by_name", &shape_registry());
        assert_eq!(map.len(), 1);
        assert_eq!(map["big"].area(), 100.0);
    }

    #[test]
    fn test_read_object_into_keeps_state_when_absent() {
        let doc = json!({ "other": 1 });
        let reader = Reader::from_value(&doc).unwrap();
        let mut square = Square {
            side: 7.0,
            tint: Color::WHITE,
        };
        assert!(!reader.read_object_into("square", &mut square));
        assert_eq!(square.side, 7.0);
    }

    #[test]
    fn test_read_object_nested() {
        let mut writer = Writer::new(PackStyle::Token);
        writer.write_object(
            "hero",
            &Circle {
                radius: 2.0,
                spawn: IntRange::new(0, 1),
            },
        );
        let doc = writer.into_value();
        let reader = Reader::from_value(&doc).unwrap();
        let circle: Circle = reader.read_object("hero");
        assert_eq!(circle.radius, 2.0);
        assert_eq!(circle.spawn, IntRange::new(0, 1));
    }
}
