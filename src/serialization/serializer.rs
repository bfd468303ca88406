//! Text formats for serialized documents
//!
//! A `Serializer` turns a document node into text and back, and owns the
//! file extension used for its files. `serialize`/`deserialize` bridge a
//! `Serializable` root and its text.

use serde_json::Value;

use super::field::PackStyle;
use super::reader::Reader;
use super::writer::Writer;
use super::Serializable;
use crate::error::{Result, StoreError};

pub trait Serializer: Send + Sync {
    /// File extension (without the dot) for documents in this format
    fn extension(&self) -> &'static str;

    fn style(&self) -> PackStyle;

    fn to_text(&self, document: &Value) -> Result<String>;

    fn from_text(&self, text: &str) -> Result<Value>;

    /// Writes `root` as a document
    fn serialize(&self, root: &dyn Serializable) -> Result<String> {
        let mut writer = Writer::new(self.style());
        root.serialize(&mut writer);
        self.to_text(&writer.into_value())
    }

    /// Restores `root` from `text`
    ///
    /// Fails when the text does not parse or its root is not an object.
    fn deserialize(&self, root: &mut dyn Serializable, text: &str) -> Result<()> {
        let document = self.from_text(text)?;
        let reader = Reader::from_value(&document)
            .ok_or_else(|| StoreError::Parse("document root is not an object".to_string()))?;
        root.deserialize(&reader);
        Ok(())
    }
}

/// JSON documents
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSerializer {
    /// Indented output (readable diffs for editor-side data)
    pub pretty: bool,
    pub style: PackStyle,
}

impl JsonSerializer {
    pub const EXTENSION: &'static str = "json";

    pub fn pretty() -> Self {
        JsonSerializer {
            pretty: true,
            style: PackStyle::Token,
        }
    }

    pub fn structured() -> Self {
        JsonSerializer {
            pretty: false,
            style: PackStyle::Structured,
        }
    }
}

impl Serializer for JsonSerializer {
    fn extension(&self) -> &'static str {
        Self::EXTENSION
    }

    fn style(&self) -> PackStyle {
        self.style
    }

    fn to_text(&self, document: &Value) -> Result<String> {
        let text = if self.pretty {
            serde_json::to_string_pretty(document)?
        } else {
            serde_json::to_string(document)?
        };
        Ok(text)
    }

    fn from_text(&self, text: &str) -> Result<Value> {
        Ok(serde_json::from_str(text)?)
    }
}
