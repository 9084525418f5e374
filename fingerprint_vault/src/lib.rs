//! # Fingerprint Vault
//!
//! Derives a stable 256-bit identifier from a raw fingerprint scan and uses it
//! as key material to protect stored files.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │                    FEATURE HASHING                         │
//! │  decode → isolate region → enhance → thin → minutiae → SHA │
//! └─────────────────────────────┬─────────────────────────────┘
//!                               │ FingerprintDigest (64 hex)
//!            ┌──────────────────┴──────────────────┐
//!   ┌────────┴────────┐                  ┌─────────┴─────────┐
//!   │     MATCHER     │                  │   CIPHER ENGINE   │
//!   │ login by digest │                  │ PBKDF2 → XOR blob │
//!   └─────────────────┘                  └───────────────────┘
//! ```
//!
//! ## Security Model
//!
//! - Digests are exact: the same scan bytes always give the same digest, a
//!   different capture of the same finger usually does not
//! - Blobs are `salt(16) || plaintext XOR key`, key = PBKDF2-HMAC-SHA256
//!   (10 000 iterations) of the digest's hex string
//! - Blobs carry no authentication tag; a wrong key or tampered bytes
//!   decrypt to garbage without an error
//! - Derived keys are zeroized after each call

pub mod config;
pub mod crypto;
pub mod error;
pub mod matcher;
pub mod payload;
pub mod pipeline;
pub mod worker;

pub use config::{CipherConfig, PipelineConfig, VaultConfig};
pub use crypto::{decrypt_bytes, encrypt_bytes, CipherBlob, CipherEngine};
pub use error::{FingerprintError, FpResult};
pub use matcher::Enrollment;
pub use payload::decode_fingerprint_payload;
pub use pipeline::{
    hash_fingerprint, FingerprintAnalysis, FingerprintDigest, FingerprintPipeline, MinutiaKind,
    MinutiaPoint, MinutiaeSet,
};
pub use worker::{hash_with_deadline, HashPool};

/// Fingerprint Vault version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_then_protect_file() {
        let scan = pipeline::tests::synthetic_print();

        // Registration
        let mut enrollment = Enrollment::new();
        enrollment.register(hash_fingerprint(&scan).unwrap());

        // Login with the same scan
        let login = hash_fingerprint(&scan).unwrap();
        assert!(enrollment.matches(&login));

        // Upload and download
        let key = enrollment.primary().unwrap().key_material();
        let document = b"quarterly partition report".to_vec();
        let blob = encrypt_bytes(&document, &key).unwrap();

        assert_eq!(blob.len(), 16 + document.len());
        assert_eq!(decrypt_bytes(&blob, &key).unwrap(), document);
    }
}
