//! Encryption keys
//!
//! A `CryptKey` is an immutable AES-256 key plus CBC initialization vector.
//! Keys are either supplied as raw bytes or derived from a passphrase with a
//! small deterministic generator. The generator is not a vetted KDF; it is
//! kept bit-for-bit so previously encrypted files stay readable.

use std::collections::HashMap;
use std::fmt;
use std::sync::{LazyLock, Mutex};

pub const KEY_LEN: usize = 32;
pub const IV_LEN: usize = 16;

const SEED: i32 = 12345;
const MULTIPLIER: i32 = 1103515245;
const DIVISOR: i32 = 65530;
const INCREMENT: i32 = 12345;
const MODULUS: i32 = 32768;

/// Memo table of derived keys, keyed by source passphrase
static DERIVED: LazyLock<Mutex<HashMap<String, CryptKey>>> =
    LazyLock::new(|| Mutex::new(HashMap::new()));

/// AES key + IV pair
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct CryptKey {
    key: [u8; KEY_LEN],
    iv: [u8; IV_LEN],
}

impl CryptKey {
    /// Creates a key from raw bytes
    pub fn new(key: [u8; KEY_LEN], iv: [u8; IV_LEN]) -> Self {
        CryptKey { key, iv }
    }

    /// Returns the key derived from `passphrase`
    ///
    /// The same passphrase always yields the same key. Derived keys are
    /// cached, so repeated calls are cheap.
    pub fn get(passphrase: &str) -> CryptKey {
        // A poisoned table only means another thread panicked mid-insert;
        // the map itself is still usable.
        let mut cache = DERIVED.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        cache
            .entry(passphrase.to_string())
            .or_insert_with(|| Self::derive(passphrase))
            .clone()
    }

    /// Runs the byte generator without touching the cache
    pub fn derive(passphrase: &str) -> CryptKey {
        let codes: Vec<u16> = passphrase.encode_utf16().collect();
        let mut bytes = [0u8; KEY_LEN + IV_LEN];
        let mut result = SEED;

        for (i, byte) in bytes.iter_mut().enumerate() {
            let code = if codes.is_empty() {
                0
            } else {
                codes[i % codes.len()] as i32
            };
            let product = MULTIPLIER.wrapping_mul(result).wrapping_mul(code);
            result = (product / DIVISOR).wrapping_add(INCREMENT) % MODULUS;
            *byte = (result % 256) as u8;
        }

        let mut key = [0u8; KEY_LEN];
        let mut iv = [0u8; IV_LEN];
        key.copy_from_slice(&bytes[..KEY_LEN]);
        iv.copy_from_slice(&bytes[KEY_LEN..]);
        CryptKey { key, iv }
    }

    pub fn key(&self) -> &[u8; KEY_LEN] {
        &self.key
    }

    pub fn iv(&self) -> &[u8; IV_LEN] {
        &self.iv
    }
}

// Key material never goes to logs.
impl fmt::Debug for CryptKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CryptKey").finish_non_exhaustive()
    }
}
