//! Fingerprint Vault - Upload Payloads
//!
//! Scanner uploads arrive as base64 text, optionally wrapped in a
//! `data:image/...;base64,` URL.

use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::error::{FingerprintError, FpResult};
use crate::pipeline::{FingerprintDigest, FingerprintPipeline};

const DATA_URL_PREFIX: &str = "data:image";

/// Decode an upload into raw image bytes
pub fn decode_fingerprint_payload(payload: &str) -> FpResult<Vec<u8>> {
    let payload = payload.trim();

    let encoded = if payload.starts_with(DATA_URL_PREFIX) {
        payload
            .split_once(',')
            .map(|(_, data)| data)
            .ok_or_else(|| FingerprintError::InvalidPayload("data URL without ','".into()))?
    } else {
        payload
    };

    let compact: String = encoded.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    if compact.is_empty() {
        return Err(FingerprintError::InvalidPayload("empty payload".into()));
    }

    STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| FingerprintError::InvalidPayload(e.to_string()))
}

/// Decode an upload and digest it
pub fn hash_payload(pipeline: &FingerprintPipeline, payload: &str) -> FpResult<FingerprintDigest> {
    let bytes = decode_fingerprint_payload(payload)?;
    pipeline.hash(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::hasher::sha256;
    use crate::pipeline::tests::png_bytes;
    use image::{GrayImage, Luma};

    #[test]
    fn test_plain_base64() {
        assert_eq!(decode_fingerprint_payload("aGVsbG8=").unwrap(), b"hello");
    }

    #[test]
    fn test_data_url() {
        let decoded = decode_fingerprint_payload("data:image/png;base64,aGVsbG8=").unwrap();
        assert_eq!(decoded, b"hello");
    }

    #[test]
    fn test_whitespace_is_ignored() {
        assert_eq!(decode_fingerprint_payload(" aGVs\nbG8=\n").unwrap(), b"hello");
    }

    #[test]
    fn test_invalid_payloads() {
        assert!(matches!(
            decode_fingerprint_payload("data:image/png;base64"),
            Err(FingerprintError::InvalidPayload(_))
        ));
        assert!(matches!(
            decode_fingerprint_payload("not base64 !!!"),
            Err(FingerprintError::InvalidPayload(_))
        ));
        assert!(decode_fingerprint_payload("   ").is_err());
    }

    #[test]
    fn test_hash_payload_matches_direct_hash() {
        let png = png_bytes(GrayImage::from_pixel(16, 16, Luma([255])));
        let payload = format!("data:image/png;base64,{}", STANDARD.encode(&png));

        let digest = hash_payload(&FingerprintPipeline::default(), &payload).unwrap();
        assert_eq!(digest, sha256(&png));
    }
}
