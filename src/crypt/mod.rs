//! Symmetric encryption for data at rest
//!
//! - `key`: `CryptKey` and passphrase derivation
//! - `cipher`: AES-256-CBC encrypt/decrypt with base64 framing

pub mod cipher;
pub mod key;

pub use cipher::{decrypt, encrypt, try_decrypt};
pub use key::CryptKey;

use crate::error::Result;

/// Encrypts stored text when a key applies
pub(crate) fn seal(text: String, key: Option<&CryptKey>) -> String {
    match key {
        Some(key) => encrypt(&text, key),
        None => text,
    }
}

/// Turns stored text back into a plain document
///
/// Text that already looks like a plain document (editor-authored data in a
/// packaged catalog) is passed through. Anything else is decrypted strictly,
/// so corrupt data surfaces as an error instead of an empty document.
pub(crate) fn unseal(raw: String, key: Option<&CryptKey>) -> Result<String> {
    match key {
        Some(key) if !looks_plain(&raw) => Ok(try_decrypt(&raw, key)?),
        _ => Ok(raw),
    }
}

fn looks_plain(text: &str) -> bool {
    matches!(text.trim_start().chars().next(), Some('{') | Some('['))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seal_unseal() {
        let key = CryptKey::get("secret");
        let sealed = seal("{\"a\":1}".to_string(), Some(&key));
        assert!(!sealed.starts_with('{'));
        assert_eq!(unseal(sealed, Some(&key)).unwrap(), "{\"a\":1}");
    }

    #[test]
    fn test_unseal_passes_plain_documents() {
        let key = CryptKey::get("secret");
        assert_eq!(unseal("  {\"a\":1}".to_string(), Some(&key)).unwrap(), "  {\"a\":1}");
        assert_eq!(unseal("plain".to_string(), None).unwrap(), "plain");
    }

    #[test]
    fn test_unseal_reports_corruption() {
        let key = CryptKey::get("secret");
        assert!(unseal("Zm9v!!".to_string(), Some(&key)).is_err());
    }
}
