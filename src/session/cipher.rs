// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! AES-256-CBC cipher for session tokens.
//!
//! ## Wire Format
//!
//! `<ivHex>:<cipherHex>` where `ivHex` is exactly 32 hex characters (16 bytes)
//! and `cipherHex` is the PKCS#7-padded ciphertext of the raw token.
//!
//! ## Failure Policy
//!
//! Neither direction returns an error. Every failure is logged and collapses
//! to `None`; callers treat that as "no session".

use std::fmt;

use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use aes::Aes256;
use ring::rand::{SecureRandom, SystemRandom};

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

/// AES-256 key length in bytes.
pub const KEY_LEN: usize = 32;

/// CBC IV length in bytes.
pub const IV_LEN: usize = 16;

/// 32-byte session encryption key.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionKey([u8; KEY_LEN]);

impl SessionKey {
    pub const fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self(bytes)
    }

    /// Parse a 64-character hex key. No `0x` prefix.
    pub fn from_hex(value: &str) -> Option<Self> {
        if !is_hex_of_len(value, KEY_LEN * 2) {
            return None;
        }
        let bytes = alloy::hex::decode(value).ok()?;
        let key: [u8; KEY_LEN] = bytes.try_into().ok()?;
        Some(Self(key))
    }

    /// Random key from the system CSPRNG.
    pub fn generate() -> Option<Self> {
        let mut key = [0u8; KEY_LEN];
        SystemRandom::new().fill(&mut key).ok()?;
        Some(Self(key))
    }
}

impl fmt::Debug for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionKey(<redacted>)")
    }
}

/// Encrypts and decrypts bearer tokens for cookie storage.
pub struct TokenCipher {
    key: SessionKey,
    rng: SystemRandom,
}

impl TokenCipher {
    pub fn new(key: SessionKey) -> Self {
        Self {
            key,
            rng: SystemRandom::new(),
        }
    }

    /// Encrypt a token under a fresh random IV.
    pub fn encrypt(&self, plaintext: &str) -> Option<String> {
        let mut iv = [0u8; IV_LEN];
        if self.rng.fill(&mut iv).is_err() {
            tracing::error!("Failed to generate IV for session token");
            return None;
        }
        self.encrypt_with_iv(plaintext, &iv)
    }

    fn encrypt_with_iv(&self, plaintext: &str, iv: &[u8; IV_LEN]) -> Option<String> {
        let cipher = match Aes256CbcEnc::new_from_slices(&self.key.0, iv) {
            Ok(cipher) => cipher,
            Err(e) => {
                tracing::error!(error = %e, "Failed to initialise session token cipher");
                return None;
            }
        };
        let ciphertext = cipher.encrypt_padded_vec_mut::<Pkcs7>(plaintext.as_bytes());

        Some(format!(
            "{}:{}",
            alloy::hex::encode(iv),
            alloy::hex::encode(ciphertext)
        ))
    }

    /// Decrypt a packed `ivHex:cipherHex` value.
    pub fn decrypt(&self, packed: &str) -> Option<String> {
        let Some((iv_hex, cipher_hex)) = packed.split_once(':') else {
            tracing::debug!("Session token rejected: missing separator");
            return None;
        };
        if !is_hex_of_len(iv_hex, IV_LEN * 2) {
            tracing::debug!("Session token rejected: IV is not 16 bytes of hex");
            return None;
        }
        if cipher_hex.is_empty() || !cipher_hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            tracing::debug!("Session token rejected: ciphertext is not hex");
            return None;
        }

        let iv = alloy::hex::decode(iv_hex).ok()?;
        let ciphertext = alloy::hex::decode(cipher_hex).ok()?;

        let cipher = match Aes256CbcDec::new_from_slices(&self.key.0, &iv) {
            Ok(cipher) => cipher,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to initialise session token cipher");
                return None;
            }
        };

        let plaintext = match cipher.decrypt_padded_vec_mut::<Pkcs7>(&ciphertext) {
            Ok(plaintext) => plaintext,
            Err(_) => {
                tracing::warn!("Session token failed to decrypt (wrong key or corrupted value)");
                return None;
            }
        };

        match String::from_utf8(plaintext) {
            Ok(token) => Some(token),
            Err(_) => {
                tracing::warn!("Decrypted session token is not valid UTF-8");
                None
            }
        }
    }
}

fn is_hex_of_len(value: &str, len: usize) -> bool {
    value.len() == len && value.bytes().all(|b| b.is_ascii_hexdigit())
}
