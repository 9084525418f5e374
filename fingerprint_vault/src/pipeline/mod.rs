//! Fingerprint Vault - Feature Hashing Pipeline
//!
//! ```text
//! bytes ─ decode ─ isolate region ─ enhance ridges ─ thin ─ minutiae ─ SHA-256
//! ```
//!
//! Every stage is a pure function over owned buffers, so a pipeline can be
//! shared freely between threads.

pub mod decode;
pub mod enhance;
pub mod filters;
pub mod hasher;
pub mod minutiae;
pub mod region;
pub mod skeleton;

use serde::{Deserialize, Serialize};

use crate::config::PipelineConfig;
use crate::error::FpResult;

pub use hasher::FingerprintDigest;
pub use minutiae::{MinutiaKind, MinutiaPoint, MinutiaeSet};
pub use region::Rect;

/// Full result of one pipeline run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FingerprintAnalysis {
    pub digest: FingerprintDigest,
    /// Canonical minutiae that were hashed
    pub minutiae: MinutiaeSet,
    /// Detected fingerprint bounds, `None` when the whole image was used
    pub region: Option<Rect>,
    /// Digest was taken over the raw input because no minutiae were found
    pub fallback: bool,
}

/// Raw scan to digest
#[derive(Debug, Clone, Default)]
pub struct FingerprintPipeline {
    config: PipelineConfig,
}

impl FingerprintPipeline {
    /// Create a pipeline from validated configuration
    pub fn new(config: PipelineConfig) -> FpResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run every stage and keep the intermediate feature set
    pub fn analyze(&self, image_bytes: &[u8]) -> FpResult<FingerprintAnalysis> {
        let gray = decode::decode_grayscale(image_bytes)?;
        log::debug!("Decoded scan {}x{}", gray.width(), gray.height());

        let region = region::isolate_region(&gray, self.config.region_margin);
        let ridges = enhance::enhance_ridges(&region.image, &self.config);
        let skeleton = skeleton::thin(&ridges);
        let minutiae = minutiae::extract_minutiae(
            &skeleton,
            region.offset,
            self.config.min_minutia_distance,
        );
        let (digest, fallback) = hasher::digest_minutiae(&minutiae, image_bytes);

        Ok(FingerprintAnalysis {
            digest,
            minutiae,
            region: region.bounds,
            fallback,
        })
    }

    /// Digest of a raw scan
    pub fn hash(&self, image_bytes: &[u8]) -> FpResult<FingerprintDigest> {
        Ok(self.analyze(image_bytes)?.digest)
    }
}

/// Digest a raw scan with default parameters
pub fn hash_fingerprint(image_bytes: &[u8]) -> FpResult<FingerprintDigest> {
    FingerprintPipeline::default().hash(image_bytes)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::FingerprintError;
    use image::{DynamicImage, GrayImage, ImageFormat, Luma};
    use std::io::Cursor;

    pub(crate) fn png_bytes(img: GrayImage) -> Vec<u8> {
        let mut buffer = Vec::new();
        DynamicImage::ImageLuma8(img)
            .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
            .unwrap();
        buffer
    }

    /// Concentric dark rings on a light pad, roughly print-shaped
    pub(crate) fn synthetic_print() -> Vec<u8> {
        let img = GrayImage::from_fn(120, 140, |x, y| {
            let (dx, dy) = (x as f64 - 60.0, (y as f64 - 70.0) * 0.8);
            let r = (dx * dx + dy * dy).sqrt();
            if r > 45.0 {
                Luma([240])
            } else if (r as u32 / 3) % 2 == 0 {
                Luma([35])
            } else {
                Luma([170])
            }
        });
        png_bytes(img)
    }

    #[test]
    fn test_blank_scan_digests_raw_bytes() {
        let png = png_bytes(GrayImage::from_pixel(64, 64, Luma([255])));

        let analysis = FingerprintPipeline::default().analyze(&png).unwrap();

        assert!(analysis.fallback);
        assert!(analysis.region.is_none());
        assert_eq!(analysis.digest, hasher::sha256(&png));
        assert_eq!(hash_fingerprint(&png).unwrap(), hasher::sha256(&png));
    }

    #[test]
    fn test_hash_is_deterministic() {
        let scan = synthetic_print();
        let a = hash_fingerprint(&scan).unwrap();
        let b = hash_fingerprint(&scan).unwrap();

        assert_eq!(a, b);
        assert_eq!(a.to_hex().len(), 64);
    }

    #[test]
    fn test_synthetic_print_yields_minutiae() {
        let analysis = FingerprintPipeline::default()
            .analyze(&synthetic_print())
            .unwrap();

        assert!(analysis.region.is_some());
        assert!(!analysis.fallback);
        assert!(!analysis.minutiae.is_empty());
        assert_eq!(analysis.digest, hasher::sha256(&analysis.minutiae.to_bytes()));

        let points = analysis.minutiae.points();
        for pair in points.windows(2) {
            assert!((pair[0].x, pair[0].y) < (pair[1].x, pair[1].y));
        }
        for (i, p) in points.iter().enumerate() {
            for q in &points[i + 1..] {
                assert!(p.distance(q) >= 10.0);
            }
            assert!(p.x < 120 && p.y < 140);
        }
    }

    #[test]
    fn test_synthetic_print_golden_digest() {
        let analysis = FingerprintPipeline::default()
            .analyze(&synthetic_print())
            .unwrap();

        assert_eq!(analysis.region, Some(Rect { x: 6, y: 4, width: 109, height: 133 }));

        let expected = [
            (59, 73, MinutiaKind::RidgeEnding),
            (103, 94, MinutiaKind::Bifurcation),
            (106, 63, MinutiaKind::RidgeEnding),
        ];
        let found: Vec<_> = analysis
            .minutiae
            .points()
            .iter()
            .map(|p| (p.x, p.y, p.kind))
            .collect();
        assert_eq!(found, expected);

        // Stored credentials depend on this exact value
        assert_eq!(
            analysis.digest.to_hex(),
            "3bf713fec7dd1291cd391f6cac4390d480294f38efbfb6b108036d8c0399c25e"
        );
    }

    #[test]
    fn test_undecodable_input() {
        assert!(matches!(
            hash_fingerprint(b"GIF? no."),
            Err(FingerprintError::ImageDecode(_))
        ));
        assert!(matches!(
            hash_fingerprint(&[]),
            Err(FingerprintError::ImageDecode(_))
        ));
    }

    #[test]
    fn test_tiny_scans_do_not_panic() {
        for (w, h) in [(1, 1), (2, 3), (5, 1)] {
            let png = png_bytes(GrayImage::from_pixel(w, h, Luma([0])));
            assert!(hash_fingerprint(&png).is_ok());
        }
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = PipelineConfig {
            adaptive_block_size: 4,
            ..Default::default()
        };
        assert!(FingerprintPipeline::new(config).is_err());
    }
}
