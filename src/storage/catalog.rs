use serde::{Deserialize, Serialize};
use std::fmt;

/// Root directory class a data file belongs to
///
/// The choice matters beyond location: packaged data is encrypted on write
/// outside the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Catalog {
    /// User-writable persistent storage (saves, settings)
    Persistent,
    /// Read-only content packaged with the build
    Streaming,
    /// Project files only touched by the editor and tools
    Project,
}

impl Catalog {
    /// Subdirectory under every root that holds data files
    pub const DATA_DIR: &'static str = "Data";

    pub fn is_packaged(self) -> bool {
        matches!(self, Catalog::Streaming)
    }

    pub fn is_writable_at_runtime(self) -> bool {
        matches!(self, Catalog::Persistent)
    }
}

impl fmt::Display for Catalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Catalog::Persistent => "persistent",
            Catalog::Streaming => "streaming",
            Catalog::Project => "project",
        };
        write!(f, "{}", name)
    }
}
