//! Fingerprint Vault - Key Derivation
//!
//! PBKDF2-HMAC-SHA256 over the fingerprint key material and a per-blob salt.

use hmac::Hmac;
use rand::RngCore;
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::error::{FingerprintError, FpResult};

/// Derived key length (bytes)
pub const KEY_LEN: usize = 32;

/// Salt length (bytes)
pub const SALT_LEN: usize = 16;

/// Default PBKDF2 iteration count
pub const DEFAULT_ITERATIONS: u32 = 10_000;

/// Per-call key, wiped when dropped
pub type DerivedKey = Zeroizing<[u8; KEY_LEN]>;

/// Generate a fresh random salt
pub fn generate_salt() -> [u8; SALT_LEN] {
    let mut salt = [0u8; SALT_LEN];
    rand::thread_rng().fill_bytes(&mut salt);
    salt
}

/// Derive a 32-byte key from key material and salt
pub fn derive_key(key_material: &[u8], salt: &[u8], iterations: u32) -> FpResult<DerivedKey> {
    if iterations == 0 {
        return Err(FingerprintError::InvalidConfig(
            "PBKDF2 iterations must be >= 1".into(),
        ));
    }

    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    pbkdf2::pbkdf2::<Hmac<Sha256>>(key_material, salt, iterations, &mut *key)
        .map_err(|e| FingerprintError::Processing(format!("key derivation failed: {e}")))?;

    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rfc_vector_single_iteration() {
        let key = derive_key(b"password", b"salt", 1).unwrap();
        assert_eq!(
            hex::encode(*key),
            "120fb6cffcf8b32c43e7225256c4f837a86548c92ccc35480805987cb70be17b"
        );
    }

    #[test]
    fn test_derivation_is_deterministic() {
        let salt = [7u8; SALT_LEN];
        let k1 = derive_key(b"seed", &salt, DEFAULT_ITERATIONS).unwrap();
        let k2 = derive_key(b"seed", &salt, DEFAULT_ITERATIONS).unwrap();
        assert_eq!(*k1, *k2);
    }

    #[test]
    fn test_salt_changes_key() {
        let k1 = derive_key(b"seed", &[1u8; SALT_LEN], 100).unwrap();
        let k2 = derive_key(b"seed", &[2u8; SALT_LEN], 100).unwrap();
        assert_ne!(*k1, *k2);
    }

    #[test]
    fn test_salts_are_fresh() {
        assert_ne!(generate_salt(), generate_salt());
    }

    #[test]
    fn test_zero_iterations_rejected() {
        assert!(derive_key(b"seed", b"salt", 0).is_err());
    }
}
