//! AES-256-CBC with PKCS#7 padding, framed as base64 text
//!
//! `encrypt`/`decrypt` are the lenient pair: empty in, empty out, and any
//! decryption failure collapses to an empty string. Load paths that need to
//! tell "corrupt" from "absent" use `try_decrypt` instead.

use aes::Aes256;
use aes::cipher::generic_array::GenericArray;
use aes::cipher::{BlockDecrypt, BlockEncrypt, KeyInit};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use super::key::CryptKey;
use crate::error::CryptError;

const BLOCK: usize = 16;

/// Encrypts `text` and returns base64 ciphertext
///
/// Empty input is a no-op and yields an empty string.
pub fn encrypt(text: &str, key: &CryptKey) -> String {
    if text.is_empty() {
        return String::new();
    }

    let cipher = Aes256::new(GenericArray::from_slice(key.key()));
    let mut data = pkcs7_pad(text.as_bytes());
    let mut prev = *key.iv();

    for chunk in data.chunks_exact_mut(BLOCK) {
        for (byte, p) in chunk.iter_mut().zip(prev.iter()) {
            *byte ^= p;
        }
        cipher.encrypt_block(GenericArray::from_mut_slice(chunk));
        prev.copy_from_slice(chunk);
    }

    STANDARD.encode(data)
}

/// Decrypts base64 ciphertext, returning an empty string on any failure
pub fn decrypt(cipher_text: &str, key: &CryptKey) -> String {
    match try_decrypt(cipher_text, key) {
        Ok(text) => text,
        Err(e) => {
            log::debug!("Decryption failed, treating as empty: {}", e);
            String::new()
        }
    }
}

/// Decrypts base64 ciphertext, reporting why it failed
///
/// Empty input decrypts to an empty string.
pub fn try_decrypt(cipher_text: &str, key: &CryptKey) -> Result<String, CryptError> {
    let trimmed = cipher_text.trim();
    if trimmed.is_empty() {
        return Ok(String::new());
    }

    let mut data = STANDARD
        .decode(trimmed)
        .map_err(|e| CryptError::Base64(e.to_string()))?;
    if data.is_empty() || data.len() % BLOCK != 0 {
        return Err(CryptError::BlockLength(data.len()));
    }

    let cipher = Aes256::new(GenericArray::from_slice(key.key()));
    let mut prev = *key.iv();

    for chunk in data.chunks_exact_mut(BLOCK) {
        let mut saved = [0u8; BLOCK];
        saved.copy_from_slice(chunk);
        cipher.decrypt_block(GenericArray::from_mut_slice(chunk));
        for (byte, p) in chunk.iter_mut().zip(prev.iter()) {
            *byte ^= p;
        }
        prev = saved;
    }

    let plain = pkcs7_unpad(data)?;
    String::from_utf8(plain).map_err(|_| CryptError::Utf8)
}

fn pkcs7_pad(data: &[u8]) -> Vec<u8> {
    let pad_len = BLOCK - (data.len() % BLOCK);
    let mut result = Vec::with_capacity(data.len() + pad_len);
    result.extend_from_slice(data);
    result.extend(std::iter::repeat_n(pad_len as u8, pad_len));
    result
}

fn pkcs7_unpad(mut data: Vec<u8>) -> Result<Vec<u8>, CryptError> {
    let pad_len = *data.last().ok_or(CryptError::Padding)? as usize;
    if pad_len == 0 || pad_len > BLOCK || pad_len > data.len() {
        return Err(CryptError::Padding);
    }
    if !data[data.len() - pad_len..]
        .iter()
        .all(|&byte| byte as usize == pad_len)
    {
        return Err(CryptError::Padding);
    }
    data.truncate(data.len() - pad_len);
    Ok(data)
}
