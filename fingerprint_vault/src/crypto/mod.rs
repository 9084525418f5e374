//! Fingerprint Vault - Cryptographic Core
//!
//! Fingerprint-keyed file protection: PBKDF2-derived key, repeating-key XOR.

pub mod kdf;
pub mod stream;

pub use kdf::{derive_key, generate_salt, DerivedKey, DEFAULT_ITERATIONS, KEY_LEN, SALT_LEN};
pub use stream::{decrypt_bytes, encrypt_bytes, CipherBlob, CipherEngine};
