//! Fingerprint Vault - Error Types

use std::time::Duration;

use thiserror::Error;

/// Result type for fingerprint and cipher operations
pub type FpResult<T> = Result<T, FingerprintError>;

/// Fingerprint vault error types
#[derive(Error, Debug)]
pub enum FingerprintError {
    // ═══════════════════════════════════════════════════════════════
    // INPUT ERRORS (caller's fault)
    // ═══════════════════════════════════════════════════════════════

    #[error("Image decode failed: {0}")]
    ImageDecode(String),

    #[error("Input too short: {actual} bytes (min: {minimum})")]
    InputTooShort { actual: usize, minimum: usize },

    #[error("Invalid fingerprint payload: {0}")]
    InvalidPayload(String),

    #[error("Invalid fingerprint digest: {0}")]
    InvalidDigest(String),

    // ═══════════════════════════════════════════════════════════════
    // INTERNAL ERRORS
    // ═══════════════════════════════════════════════════════════════

    #[error("Processing failure: {0}")]
    Processing(String),

    #[error("Pipeline did not finish within {0:?}")]
    Timeout(Duration),

    // ═══════════════════════════════════════════════════════════════
    // CONFIGURATION / IO
    // ═══════════════════════════════════════════════════════════════

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl FingerprintError {
    /// Errors caused by malformed input (reported as 4xx by a web layer)
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            FingerprintError::ImageDecode(_)
                | FingerprintError::InputTooShort { .. }
                | FingerprintError::InvalidPayload(_)
                | FingerprintError::InvalidDigest(_)
        )
    }

    /// Errors that indicate an internal fault (reported as 5xx)
    pub fn is_server_error(&self) -> bool {
        matches!(
            self,
            FingerprintError::Processing(_)
                | FingerprintError::Timeout(_)
                | FingerprintError::InvalidConfig(_)
                | FingerprintError::Serialization(_)
                | FingerprintError::Io(_)
        )
    }
}

impl From<image::ImageError> for FingerprintError {
    fn from(e: image::ImageError) -> Self {
        FingerprintError::ImageDecode(e.to_string())
    }
}

impl From<serde_json::Error> for FingerprintError {
    fn from(e: serde_json::Error) -> Self {
        FingerprintError::Serialization(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classes() {
        assert!(FingerprintError::ImageDecode("x".into()).is_client_error());
        assert!(FingerprintError::InputTooShort { actual: 3, minimum: 16 }.is_client_error());
        assert!(FingerprintError::Processing("x".into()).is_server_error());
        assert!(!FingerprintError::Processing("x".into()).is_client_error());
        assert!(FingerprintError::Timeout(Duration::from_secs(1)).is_server_error());
    }

    #[test]
    fn test_too_short_message() {
        let err = FingerprintError::InputTooShort { actual: 10, minimum: 16 };
        assert_eq!(err.to_string(), "Input too short: 10 bytes (min: 16)");
    }
}
