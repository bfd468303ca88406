//! Object serialization contract
//!
//! Domain objects implement `Serializable` and describe themselves as a set
//! of named fields through a `Writer`; a `Reader` hands the same fields back
//! on load. Missing fields read as defaults, so old files load into newer
//! types and newer files load into older ones.
//!
//! # Architecture
//!
//! - `field`: `Field` conversions for primitives, packed values and containers
//! - `writer` / `reader`: named-field access for one object
//! - `registry`: `TypeRegistry`, explicit tag → factory map for polymorphic data
//! - `serializer`: `Serializer` trait and `JsonSerializer` text format
//!
//! # Polymorphism
//!
//! Every nested object is written with a `"$type"` discriminator taken from
//! `Serializable::type_tag`. On read, a `TypeRegistry` maps the tag back to a
//! factory. Elements whose tag is not registered are logged and skipped.

pub mod field;
pub mod reader;
pub mod registry;
pub mod serializer;
pub mod writer;

pub use field::{Field, PackStyle};
pub use reader::Reader;
pub use registry::TypeRegistry;
pub use serializer::{JsonSerializer, Serializer};
pub use writer::Writer;

/// Key holding the type discriminator of a nested object
pub const TYPE_KEY: &str = "$type";

/// An object that can be written to and rebuilt from named fields
///
/// # Example
///
/// ```ignore
/// impl Serializable for Reward {
///     fn type_tag(&self) -> &'static str { "reward" }
///
///     fn serialize(&self, writer: &mut Writer) {
///         writer.write("amount", &self.amount);
///         writer.write("range", &self.range);
///     }
///
///     fn deserialize(&mut self, reader: &Reader) {
///         self.amount = reader.read("amount");
///         self.range = reader.read("range");
///     }
/// }
/// ```
pub trait Serializable {
    /// Stable discriminator recorded next to the object's fields
    fn type_tag(&self) -> &'static str;

    fn serialize(&self, writer: &mut Writer);

    /// Restores state from `reader`, keeping current values for absent fields
    fn deserialize(&mut self, reader: &Reader<'_>);
}

impl<T: Serializable + ?Sized> Serializable for Box<T> {
    fn type_tag(&self) -> &'static str {
        (**self).type_tag()
    }

    fn serialize(&self, writer: &mut Writer) {
        (**self).serialize(writer)
    }

    fn deserialize(&mut self, reader: &Reader<'_>) {
        (**self).deserialize(reader)
    }
}
