//! Named-field writer for one object

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use super::field::{Field, PackStyle};
use super::{Serializable, TYPE_KEY};

/// Collects an object's fields into a document node
pub struct Writer {
    fields: Map<String, Value>,
    style: PackStyle,
}

impl Writer {
    pub fn new(style: PackStyle) -> Self {
        Writer {
            fields: Map::new(),
            style,
        }
    }

    pub fn style(&self) -> PackStyle {
        self.style
    }

    /// Records a primitive, packed value or container of them
    ///
    /// Writing the same name twice keeps the last value.
    pub fn write<T: Field>(&mut self, name: &str, value: &T) {
        let value = value.to_value(self.style);
        self.fields.insert(name.to_string(), value);
    }

    /// Records a nested object, tagged with its type
    pub fn write_object<T: Serializable + ?Sized>(&mut self, name: &str, object: &T) {
        let value = Self::tagged(self.style, object);
        self.fields.insert(name.to_string(), value);
    }

    /// Records a sequence of (possibly polymorphic) objects
    pub fn write_collection<'a, T, I>(&mut self, name: &str, items: I)
    where
        T: Serializable + ?Sized + 'a,
        I: IntoIterator<Item = &'a T>,
    {
        let values = items
            .into_iter()
            .map(|item| Self::tagged(self.style, item))
            .collect();
        self.fields.insert(name.to_string(), Value::Array(values));
    }

    /// Records a string-keyed mapping of objects
    pub fn write_dictionary<T: Serializable>(&mut self, name: &str, entries: &BTreeMap<String, T>) {
        let map: Map<String, Value> = entries
            .iter()
            .map(|(key, item)| (key.clone(), Self::tagged(self.style, item)))
            .collect();
        self.fields.insert(name.to_string(), Value::Object(map));
    }

    /// Finishes the object without a type tag (document roots)
    pub fn into_value(self) -> Value {
        Value::Object(self.fields)
    }

    /// Serializes `object` into a node carrying its `$type`
    pub(crate) fn tagged<T: Serializable + ?Sized>(style: PackStyle, object: &T) -> Value {
        let mut nested = Writer::new(style);
        object.serialize(&mut nested);
        nested
            .fields
            .insert(TYPE_KEY.to_string(), Value::String(object.type_tag().to_string()));
        Value::Object(nested.fields)
    }
}
