//! At-rest obfuscation codec for stored values.
//!
//! # Responsibility
//! - Encrypt/decrypt UTF-8 text to and from a single base64 blob.
//! - Keep the byte-level blob format stable across releases.
//!
//! # Invariants
//! - Blob layout is `base64(iv[16] || ciphertext)`, never anything else.
//! - The key is the SHA-256 digest of a fixed application secret.
//! - A fresh random IV is drawn per encryption; two encryptions of the same
//!   text produce different blobs that decrypt identically.
//!
//! This XOR-with-cycled-key-and-IV scheme is NOT cryptographically secure:
//! there is no authentication and diffusion is weak. It exists as
//! lightweight obfuscation of at-rest values, and the exact byte behavior is
//! a compatibility contract with already-persisted data. Do not swap in a
//! real cipher here without a storage migration.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use rand::RngCore;
use sha2::{Digest, Sha256};
use std::error::Error;
use std::fmt::{Display, Formatter};

const IV_LEN: usize = 16;
const APP_SECRET: &str = "daybook-at-rest-v1";

pub type CryptoResult<T> = Result<T, CryptoError>;

/// Decode/shape failures for stored blobs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// Input is not valid base64.
    InvalidBase64(String),
    /// Decoded blob is shorter than the mandatory IV.
    BlobTooShort { len: usize },
    /// Decrypted bytes are not valid UTF-8.
    InvalidUtf8,
}

impl Display for CryptoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidBase64(detail) => write!(f, "blob is not valid base64: {detail}"),
            Self::BlobTooShort { len } => {
                write!(f, "blob decodes to {len} bytes, below the {IV_LEN}-byte IV")
            }
            Self::InvalidUtf8 => write!(f, "decrypted bytes are not valid UTF-8"),
        }
    }
}

impl Error for CryptoError {}

/// Obfuscation codec with a process-wide derived key.
#[derive(Debug, Clone)]
pub struct CryptoCodec {
    key: [u8; 32],
}

impl CryptoCodec {
    /// Codec keyed by the fixed application secret.
    pub fn new() -> Self {
        Self::with_secret(APP_SECRET)
    }

    /// Codec keyed by an explicit secret. Exposed for tests and for hosts
    /// that provision their own secret at startup.
    pub fn with_secret(secret: &str) -> Self {
        let digest = Sha256::digest(secret.as_bytes());
        let mut key = [0u8; 32];
        key.copy_from_slice(&digest);
        Self { key }
    }

    /// Encrypts text into a `base64(iv || ciphertext)` blob.
    pub fn encrypt(&self, text: &str) -> String {
        let mut iv = [0u8; IV_LEN];
        rand::thread_rng().fill_bytes(&mut iv);

        let mut out = Vec::with_capacity(IV_LEN + text.len());
        out.extend_from_slice(&iv);
        out.extend(self.xor_stream(text.as_bytes(), &iv));
        BASE64.encode(out)
    }

    /// Decrypts a blob produced by [`CryptoCodec::encrypt`].
    ///
    /// # Errors
    /// - [`CryptoError::InvalidBase64`] when the blob is not base64.
    /// - [`CryptoError::BlobTooShort`] when fewer than 16 bytes decode.
    /// - [`CryptoError::InvalidUtf8`] when the plaintext is not UTF-8.
    pub fn decrypt(&self, blob: &str) -> CryptoResult<String> {
        let raw = BASE64
            .decode(blob.trim())
            .map_err(|err| CryptoError::InvalidBase64(err.to_string()))?;
        if raw.len() < IV_LEN {
            return Err(CryptoError::BlobTooShort { len: raw.len() });
        }

        let (iv, ciphertext) = raw.split_at(IV_LEN);
        let plain = self.xor_stream(ciphertext, iv);
        String::from_utf8(plain).map_err(|_| CryptoError::InvalidUtf8)
    }

    // XOR is its own inverse; the same pass serves both directions.
    fn xor_stream(&self, data: &[u8], iv: &[u8]) -> Vec<u8> {
        data.iter()
            .enumerate()
            .map(|(i, byte)| byte ^ self.key[i % self.key.len()] ^ iv[i % IV_LEN])
            .collect()
    }
}

impl Default for CryptoCodec {
    fn default() -> Self {
        Self::new()
    }
}
