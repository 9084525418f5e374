//! Fingerprint Vault - Stream Cipher
//!
//! Blob layout:
//! ```text
//! [SALT 16B][random, fresh per encryption]
//! [CIPHERTEXT len(plaintext)][plaintext XOR key[i mod 32]]
//! ```
//!
//! The key stream is the 32-byte PBKDF2 output repeated, so this is a
//! repeating-key XOR with no authentication tag. Tampered blobs or wrong key
//! material decrypt to garbage without any error. The construction is kept
//! byte-for-byte so previously stored blobs stay readable.

use crate::config::CipherConfig;
use crate::error::{FingerprintError, FpResult};

use super::kdf::{derive_key, generate_salt, DerivedKey, SALT_LEN};

/// Salt-prefixed ciphertext
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CipherBlob {
    /// Salt used for key derivation
    pub salt: [u8; SALT_LEN],
    /// XOR-transformed payload
    pub ciphertext: Vec<u8>,
}

impl CipherBlob {
    /// Serialize to bytes (salt || ciphertext)
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut result = Vec::with_capacity(SALT_LEN + self.ciphertext.len());
        result.extend_from_slice(&self.salt);
        result.extend_from_slice(&self.ciphertext);
        result
    }

    /// Split a stored blob into salt and ciphertext
    pub fn from_bytes(data: &[u8]) -> FpResult<Self> {
        if data.len() < SALT_LEN {
            return Err(FingerprintError::InputTooShort {
                actual: data.len(),
                minimum: SALT_LEN,
            });
        }

        let mut salt = [0u8; SALT_LEN];
        salt.copy_from_slice(&data[..SALT_LEN]);

        Ok(Self {
            salt,
            ciphertext: data[SALT_LEN..].to_vec(),
        })
    }
}

/// XOR `data` in place with the key repeated cyclically
fn apply_keystream(key: &DerivedKey, data: &mut [u8]) {
    for (byte, k) in data.iter_mut().zip(key.iter().cycle()) {
        *byte ^= k;
    }
}

/// Fingerprint-keyed symmetric cipher
#[derive(Debug, Clone)]
pub struct CipherEngine {
    iterations: u32,
}

impl Default for CipherEngine {
    fn default() -> Self {
        Self {
            iterations: CipherConfig::default().kdf_iterations,
        }
    }
}

impl CipherEngine {
    /// Create an engine from validated configuration
    pub fn new(config: &CipherConfig) -> FpResult<Self> {
        config.validate()?;
        Ok(Self {
            iterations: config.kdf_iterations,
        })
    }

    /// Encrypt under a fresh random salt
    pub fn encrypt(&self, plaintext: &[u8], key_material: impl AsRef<[u8]>) -> FpResult<CipherBlob> {
        self.encrypt_with_salt(plaintext, key_material, generate_salt())
    }

    /// Encrypt under a caller-chosen salt (deterministic)
    pub fn encrypt_with_salt(
        &self,
        plaintext: &[u8],
        key_material: impl AsRef<[u8]>,
        salt: [u8; SALT_LEN],
    ) -> FpResult<CipherBlob> {
        let key = derive_key(key_material.as_ref(), &salt, self.iterations)?;

        let mut ciphertext = plaintext.to_vec();
        apply_keystream(&key, &mut ciphertext);

        log::debug!("Encrypted {} bytes", plaintext.len());
        Ok(CipherBlob { salt, ciphertext })
    }

    /// Decrypt a parsed blob
    pub fn decrypt(&self, blob: &CipherBlob, key_material: impl AsRef<[u8]>) -> FpResult<Vec<u8>> {
        let key = derive_key(key_material.as_ref(), &blob.salt, self.iterations)?;

        let mut plaintext = blob.ciphertext.clone();
        apply_keystream(&key, &mut plaintext);

        log::debug!("Decrypted {} bytes", plaintext.len());
        Ok(plaintext)
    }

    /// Encrypt to the stored byte layout
    pub fn encrypt_bytes(&self, plaintext: &[u8], key_material: impl AsRef<[u8]>) -> FpResult<Vec<u8>> {
        Ok(self.encrypt(plaintext, key_material)?.to_bytes())
    }

    /// Decrypt from the stored byte layout
    pub fn decrypt_bytes(&self, data: &[u8], key_material: impl AsRef<[u8]>) -> FpResult<Vec<u8>> {
        let blob = CipherBlob::from_bytes(data)?;
        self.decrypt(&blob, key_material)
    }
}

/// Encrypt with default parameters; output is `16 + plaintext.len()` bytes
pub fn encrypt_bytes(plaintext: &[u8], key_material: impl AsRef<[u8]>) -> FpResult<Vec<u8>> {
    CipherEngine::default().encrypt_bytes(plaintext, key_material)
}

/// Decrypt with default parameters; fails only when `data` is shorter than the salt
pub fn decrypt_bytes(data: &[u8], key_material: impl AsRef<[u8]>) -> FpResult<Vec<u8>> {
    CipherEngine::default().decrypt_bytes(data, key_material)
}
