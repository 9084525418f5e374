//! Fingerprint Vault - Configuration
//!
//! Tunables for the feature-hashing pipeline and the cipher. The defaults are
//! the values every stored digest and blob was produced with; changing them
//! changes digests.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{FingerprintError, FpResult};

/// Largest accepted region margin (pixels)
pub const MAX_REGION_MARGIN: u32 = 4096;

/// Largest accepted CLAHE grid (tiles per axis)
pub const MAX_CLAHE_TILES: u32 = 64;

/// Feature-hashing pipeline parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Margin added around the detected fingerprint bounding box (pixels)
    pub region_margin: u32,
    /// Minimum Euclidean distance between two retained minutiae
    pub min_minutia_distance: f64,
    /// CLAHE clip limit
    pub clahe_clip_limit: f64,
    /// CLAHE tile grid (tiles per axis)
    pub clahe_tiles: u32,
    /// Adaptive threshold neighbourhood (odd, pixels)
    pub adaptive_block_size: u32,
    /// Constant subtracted from the local weighted mean
    pub adaptive_offset: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            region_margin: 10,
            min_minutia_distance: 10.0,
            clahe_clip_limit: 2.0,
            clahe_tiles: 8,
            adaptive_block_size: 11,
            adaptive_offset: 2.0,
        }
    }
}

impl PipelineConfig {
    /// Reject parameter combinations the pipeline cannot run with
    pub fn validate(&self) -> FpResult<()> {
        if self.adaptive_block_size < 3 || self.adaptive_block_size % 2 == 0 {
            return Err(FingerprintError::InvalidConfig(format!(
                "adaptive_block_size must be odd and >= 3, got {}",
                self.adaptive_block_size
            )));
        }
        if self.clahe_tiles == 0 || self.clahe_tiles > MAX_CLAHE_TILES {
            return Err(FingerprintError::InvalidConfig(format!(
                "clahe_tiles must be in 1..={}, got {}",
                MAX_CLAHE_TILES, self.clahe_tiles
            )));
        }
        if self.region_margin > MAX_REGION_MARGIN {
            return Err(FingerprintError::InvalidConfig(format!(
                "region_margin must be <= {}, got {}",
                MAX_REGION_MARGIN, self.region_margin
            )));
        }
        if !(self.clahe_clip_limit > 0.0) {
            return Err(FingerprintError::InvalidConfig(
                "clahe_clip_limit must be positive".into(),
            ));
        }
        if !(self.min_minutia_distance >= 0.0) {
            return Err(FingerprintError::InvalidConfig(
                "min_minutia_distance must be >= 0".into(),
            ));
        }
        if !self.adaptive_offset.is_finite() {
            return Err(FingerprintError::InvalidConfig(
                "adaptive_offset must be finite".into(),
            ));
        }
        Ok(())
    }
}

/// Cipher parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CipherConfig {
    /// PBKDF2-HMAC-SHA256 iteration count
    pub kdf_iterations: u32,
}

impl Default for CipherConfig {
    fn default() -> Self {
        Self {
            kdf_iterations: 10_000,
        }
    }
}

impl CipherConfig {
    pub fn validate(&self) -> FpResult<()> {
        if self.kdf_iterations == 0 {
            return Err(FingerprintError::InvalidConfig(
                "kdf_iterations must be >= 1".into(),
            ));
        }
        Ok(())
    }
}

/// Top-level configuration file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VaultConfig {
    pub pipeline: PipelineConfig,
    pub cipher: CipherConfig,
}

impl VaultConfig {
    /// Load and validate a JSON configuration file
    pub fn load<P: AsRef<Path>>(path: P) -> FpResult<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let config: VaultConfig = serde_json::from_str(&raw)?;
        config.validate()?;

        log::debug!("Loaded configuration from {}", path.as_ref().display());
        Ok(config)
    }

    pub fn validate(&self) -> FpResult<()> {
        self.pipeline.validate()?;
        self.cipher.validate()
    }
}
