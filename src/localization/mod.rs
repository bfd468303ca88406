//! Localized phrase tables
//!
//! - `language`: the `Language` enum and its ISO codes
//! - `content`: `LanguageContent`, one stored phrase table per language
//! - `pack`: `LanguagePack`, the export/import format used for translation

pub mod content;
pub mod language;
pub mod pack;

pub use content::LanguageContent;
pub use language::Language;
pub use pack::LanguagePack;
