//! Fingerprint Vault - Digest
//!
//! SHA-256 over the canonical minutiae encoding, or over the raw scan bytes
//! when no minutiae survive.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::minutiae::MinutiaeSet;
use crate::error::{FingerprintError, FpResult};

/// Digest length (bytes)
pub const DIGEST_LEN: usize = 32;

/// 256-bit fingerprint credential, rendered as 64 lowercase hex characters
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct FingerprintDigest([u8; DIGEST_LEN]);

impl FingerprintDigest {
    pub fn from_bytes(bytes: [u8; DIGEST_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; DIGEST_LEN] {
        &self.0
    }

    /// Parse a stored digest string (hex, either case)
    pub fn from_hex(s: &str) -> FpResult<Self> {
        let s = s.trim();
        if s.len() != DIGEST_LEN * 2 {
            return Err(FingerprintError::InvalidDigest(format!(
                "expected {} hex characters, got {}",
                DIGEST_LEN * 2,
                s.len()
            )));
        }

        let mut bytes = [0u8; DIGEST_LEN];
        hex::decode_to_slice(s, &mut bytes)
            .map_err(|e| FingerprintError::InvalidDigest(e.to_string()))?;
        Ok(Self(bytes))
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Bytes used as cipher key material: the ASCII of the lowercase hex form
    pub fn key_material(&self) -> Vec<u8> {
        self.to_hex().into_bytes()
    }

    /// Constant-time equality
    pub fn ct_eq(&self, other: &FingerprintDigest) -> bool {
        use subtle::ConstantTimeEq;
        self.0[..].ct_eq(&other.0[..]).into()
    }
}

impl fmt::Display for FingerprintDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for FingerprintDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FingerprintDigest({})", self.to_hex())
    }
}

impl FromStr for FingerprintDigest {
    type Err = FingerprintError;

    fn from_str(s: &str) -> FpResult<Self> {
        Self::from_hex(s)
    }
}

impl Serialize for FingerprintDigest {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for FingerprintDigest {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// SHA-256 of arbitrary bytes
pub fn sha256(data: &[u8]) -> FingerprintDigest {
    FingerprintDigest(Sha256::digest(data).into())
}

/// Digest of a minutiae set, falling back to the raw scan bytes when empty.
///
/// Returns the digest and whether the fallback was used.
pub fn digest_minutiae(set: &MinutiaeSet, raw_image: &[u8]) -> (FingerprintDigest, bool) {
    if set.is_empty() {
        log::info!("No minutiae found, digesting raw image bytes");
        return (sha256(raw_image), true);
    }
    (sha256(&set.to_bytes()), false)
}
