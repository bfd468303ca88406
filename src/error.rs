//! Error types for storage and serialization operations
//!
//! Load paths catch these and fall back to an empty state; write paths
//! propagate them to the caller of `apply()`/`save()`.

use thiserror::Error;

/// Errors that can occur while reading, writing or transforming stored data
#[derive(Error, Debug)]
pub enum StoreError {
    /// I/O error (permission denied, disk full, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Document text could not be parsed or produced
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Document parsed but did not have the expected shape
    #[error("Parse error: {0}")]
    Parse(String),

    /// Encrypted payload could not be decrypted
    #[error("Decryption failed: {0}")]
    Crypt(#[from] CryptError),

    /// A type tag has no registered factory
    #[error("Unknown type tag: {0}")]
    UnknownType(String),

    /// Stored document is newer than this build understands
    #[error("Version mismatch: data is v{found}, but this build only supports up to v{expected_max}")]
    VersionMismatch { expected_max: u32, found: u32 },

    /// Operation requires a loaded document
    #[error("Not loaded: {0}")]
    NotLoaded(String),

    /// Configuration file is invalid
    #[error("Config error: {0}")]
    Config(String),
}

/// Why a ciphertext could not be turned back into text
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptError {
    #[error("invalid base64: {0}")]
    Base64(String),

    #[error("ciphertext length {0} is not a multiple of the block size")]
    BlockLength(usize),

    #[error("invalid padding")]
    Padding,

    #[error("plaintext is not valid UTF-8")]
    Utf8,
}

pub type Result<T> = std::result::Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_version_mismatch() {
        let err = StoreError::VersionMismatch {
            expected_max: 2,
            found: 7,
        };
        let msg = err.to_string();
        assert!(msg.contains("v7"), "got: {msg}");
        assert!(msg.contains("v2"), "got: {msg}");
    }

    #[test]
    fn test_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: StoreError = io_err.into();
        assert!(matches!(err, StoreError::Io(_)));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_crypt_error_wraps() {
        let err: StoreError = CryptError::Padding.into();
        assert_eq!(err.to_string(), "Decryption failed: invalid padding");
    }
}
