//! # Pipeline Configuration
//!
//! Every numeric decision the pipeline makes lives in one [`PipelineConfig`]
//! value that is passed explicitly into each stage. Nothing reads an implicit
//! default behind the caller's back, so calibration runs and tests can vary a
//! single knob at a time.
//!
//! ## Configuration Parameters
//!
//! | Parameter | Default | Description |
//! |-----------|---------|-------------|
//! | `preprocess.blur_kernel` | 3 | Gaussian kernel side (odd) |
//! | `preprocess.threshold_block` | 11 | Adaptive-threshold neighbourhood side (odd) |
//! | `preprocess.threshold_bias` | 4 | Subtracted from the local mean |
//! | `preprocess.repair_kernel` | 1 | Dilation element side before labelling (odd) |
//! | `preprocess.speckle_max_area` | 60 | Components with area ≤ this are removed |
//! | `preprocess.close_kernel` | 3 | Closing element side (odd) |
//! | `contours.min_area_ratio` | 0.05 | Fraction of the largest contour area a contour must exceed |
//! | `roi.padding` | 25 | Margin around the ink bounding box, px |
//! | `roi.canvas_size` | 256 | Side of the square normalized canvas |
//! | `features.max_keypoints` | 500 | Upper bound on detected keypoints |
//! | `features.fast_threshold` | 20 | FAST intensity threshold |
//! | `features.scale_factor` | 1.2 | Pyramid decimation ratio |
//! | `features.levels` | 8 | Pyramid levels |
//! | `features.edge_threshold` | 31 | Border excluded from detection, px |
//! | `features.patch_size` | 31 | Orientation / descriptor patch side |
//! | `features.harris_k` | 0.04 | Harris corner constant |
//! | `matching.acceptance_threshold` | 0.20 | Score strictly above this is authentic |
//!
//! ## Examples
//!
//! ```rust
//! use signature_print::config::PipelineConfig;
//!
//! let mut config = PipelineConfig::default();
//! assert!(config.validate().is_ok());
//!
//! config.roi.canvas_size = 0;
//! assert!(config.validate().is_err());
//!
//! let partial: PipelineConfig =
//!     serde_json::from_str(r#"{ "matching": { "acceptance_threshold": 0.3 } }"#).unwrap();
//! assert_eq!(partial.matching.acceptance_threshold, 0.3);
//! assert_eq!(partial.roi.canvas_size, 256);
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SignatureError};

/// Binarization and morphology tunables.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PreprocessConfig {
    pub blur_kernel: u32,
    pub threshold_block: u32,
    pub threshold_bias: i32,
    pub repair_kernel: u32,
    pub speckle_max_area: u32,
    pub close_kernel: u32,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            blur_kernel: 3,
            threshold_block: 11,
            threshold_bias: 4,
            repair_kernel: 1,
            speckle_max_area: 60,
            close_kernel: 3,
        }
    }
}

/// Relative-area contour filter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ContourConfig {
    pub min_area_ratio: f64,
}

impl Default for ContourConfig {
    fn default() -> Self {
        Self { min_area_ratio: 0.05 }
    }
}

/// Region-of-interest padding and canvas size.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RoiConfig {
    pub padding: u32,
    pub canvas_size: u32,
}

impl Default for RoiConfig {
    fn default() -> Self {
        Self {
            padding: 25,
            canvas_size: 256,
        }
    }
}

/// Keypoint detector and descriptor tunables.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FeatureConfig {
    pub max_keypoints: usize,
    pub fast_threshold: u8,
    pub scale_factor: f32,
    pub levels: u32,
    pub edge_threshold: u32,
    pub patch_size: u32,
    pub harris_k: f32,
    /// Seed of the descriptor sampling pattern. Descriptors computed with
    /// different seeds are not comparable.
    pub pattern_seed: u64,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            max_keypoints: 500,
            fast_threshold: 20,
            scale_factor: 1.2,
            levels: 8,
            edge_threshold: 31,
            patch_size: 31,
            harris_k: 0.04,
            pattern_seed: 0x5167_5EED,
        }
    }
}

/// Verification decision policy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MatchConfig {
    pub acceptance_threshold: f32,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            acceptance_threshold: 0.20,
        }
    }
}

/// Complete configuration for the signature pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PipelineConfig {
    pub preprocess: PreprocessConfig,
    pub contours: ContourConfig,
    pub roi: RoiConfig,
    pub features: FeatureConfig,
    pub matching: MatchConfig,
}

impl PipelineConfig {
    /// Load a (possibly partial) JSON configuration file and validate it.
    /// Missing fields keep their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| SignatureError::io("read config", Some(path.display().to_string()), e))?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration parameters.
    pub fn validate(&self) -> Result<()> {
        let p = &self.preprocess;
        odd_kernel("preprocess.blur_kernel", p.blur_kernel)?;
        odd_kernel("preprocess.threshold_block", p.threshold_block)?;
        odd_kernel("preprocess.repair_kernel", p.repair_kernel)?;
        odd_kernel("preprocess.close_kernel", p.close_kernel)?;
        if p.threshold_block < 3 {
            return Err(SignatureError::config(
                "preprocess.threshold_block",
                p.threshold_block.to_string(),
                "must be at least 3",
            ));
        }

        let ratio = self.contours.min_area_ratio;
        if !(ratio > 0.0 && ratio < 1.0) {
            return Err(SignatureError::config(
                "contours.min_area_ratio",
                ratio.to_string(),
                "must be between 0 and 1 (exclusive)",
            ));
        }

        if self.roi.canvas_size == 0 {
            return Err(SignatureError::config(
                "roi.canvas_size",
                "0",
                "must be greater than 0",
            ));
        }

        let f = &self.features;
        if f.max_keypoints == 0 {
            return Err(SignatureError::config(
                "features.max_keypoints",
                "0",
                "must be greater than 0",
            ));
        }
        if !(f.scale_factor > 1.0) {
            return Err(SignatureError::config(
                "features.scale_factor",
                f.scale_factor.to_string(),
                "must be greater than 1",
            ));
        }
        if f.levels == 0 {
            return Err(SignatureError::config(
                "features.levels",
                "0",
                "must be at least 1",
            ));
        }
        odd_kernel("features.patch_size", f.patch_size)?;
        if f.patch_size < 7 {
            return Err(SignatureError::config(
                "features.patch_size",
                f.patch_size.to_string(),
                "must be at least 7",
            ));
        }
        if f.edge_threshold < f.patch_size / 2 + 1 {
            return Err(SignatureError::config(
                "features.edge_threshold",
                f.edge_threshold.to_string(),
                format!(
                    "must be at least {} for patch size {}",
                    f.patch_size / 2 + 1,
                    f.patch_size
                ),
            ));
        }

        let t = self.matching.acceptance_threshold;
        if !(0.0..=1.0).contains(&t) {
            return Err(SignatureError::config(
                "matching.acceptance_threshold",
                t.to_string(),
                "must be between 0 and 1",
            ));
        }
        Ok(())
    }
}

fn odd_kernel(field: &str, value: u32) -> Result<()> {
    if value == 0 || value % 2 == 0 {
        return Err(SignatureError::config(
            field,
            value.to_string(),
            "must be a positive odd number",
        ));
    }
    Ok(())
}
