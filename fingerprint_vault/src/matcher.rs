//! Fingerprint Vault - Digest Matching
//!
//! Login compares a freshly computed digest with the digests registered for
//! an account. Matching is exact; there is no similarity score.

use crate::error::FpResult;
use crate::pipeline::FingerprintDigest;

/// Registered digests of one account, in registration order
#[derive(Debug, Clone, Default)]
pub struct Enrollment {
    digests: Vec<FingerprintDigest>,
}

impl Enrollment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse stored digest strings
    pub fn from_stored<S: AsRef<str>>(stored: &[S]) -> FpResult<Self> {
        let digests = stored
            .iter()
            .map(|s| FingerprintDigest::from_hex(s.as_ref()))
            .collect::<FpResult<Vec<_>>>()?;
        Ok(Self { digests })
    }

    /// Register a digest; returns false if it was already present
    pub fn register(&mut self, digest: FingerprintDigest) -> bool {
        if self.position(&digest).is_some() {
            return false;
        }
        self.digests.push(digest);
        true
    }

    pub fn digests(&self) -> &[FingerprintDigest] {
        &self.digests
    }

    pub fn is_empty(&self) -> bool {
        self.digests.is_empty()
    }

    /// Digest whose hex form keys file encryption (the first registered)
    pub fn primary(&self) -> Option<&FingerprintDigest> {
        self.digests.first()
    }

    /// Index of the matching registered digest.
    ///
    /// Every candidate is compared so timing does not reveal the position.
    pub fn position(&self, candidate: &FingerprintDigest) -> Option<usize> {
        self.digests
            .iter()
            .enumerate()
            .fold(None, |found, (i, stored)| {
                let hit = stored.ct_eq(candidate);
                found.or(hit.then_some(i))
            })
    }

    pub fn matches(&self, candidate: &FingerprintDigest) -> bool {
        self.position(candidate).is_some()
    }
}
