//! # Pipeline
//!
//! Linear composition of the processing and feature stages:
//!
//! ```text
//! bytes → decode → preprocess → contours → roi/canvas → features → {fingerprint, score}
//! ```
//!
//! Capture and verification are the two synchronous entry points. Scoring
//! recomputes descriptors from both images; stored fingerprints are never
//! compared against each other.

use image::{DynamicImage, GrayImage};
use tracing::{debug, info, warn};

use crate::config::PipelineConfig;
use crate::error::Result;
use crate::features::{DescriptorSet, FeatureExtractor, encode_fingerprint, similarity_score};
use crate::processing::{
    Contour, NormalizedSignature, RasterImage, decode_image, extract_contours, normalize,
    preprocess, render_overlay,
};
use crate::report::{
    CanvasMetadata, CaptureReport, EncodedImage, ImageKind, ProcessedImages, VerificationReport,
};

/// Every intermediate product of one image's trip through the pipeline.
#[derive(Debug, Clone)]
pub struct SignatureAnalysis {
    pub raster: RasterImage,
    pub mask: GrayImage,
    pub contours: Vec<Contour>,
    pub normalized: NormalizedSignature,
    pub descriptors: DescriptorSet,
}

impl SignatureAnalysis {
    /// Run every stage on `bytes`. Fails with a config error before decoding
    /// when `config` does not validate.
    pub fn run(
        bytes: &[u8],
        config: &PipelineConfig,
        extractor: &FeatureExtractor,
    ) -> Result<Self> {
        config.validate()?;
        let raster = decode_image(bytes)?;
        let mask = preprocess(&raster, &config.preprocess)?;
        let contours = extract_contours(&mask, &config.contours);
        let normalized = normalize(&mask, &contours, &config.roi)?;
        let descriptors = extractor.extract(&normalized.canvas)?;
        if descriptors.is_empty() {
            warn!(contours = contours.len(), "no keypoints found on normalized canvas");
        }
        debug!(
            width = raster.width(),
            height = raster.height(),
            contours = contours.len(),
            keypoints = descriptors.len(),
            "analysed signature"
        );
        Ok(Self {
            raster,
            mask,
            contours,
            normalized,
            descriptors,
        })
    }

    /// Fingerprint plus the vis / roi / normalized images.
    pub fn capture_report(&self) -> Result<CaptureReport> {
        let overlay = render_overlay(&self.raster, &self.contours);
        let canvas = &self.normalized.canvas;
        Ok(CaptureReport {
            fingerprint: encode_fingerprint(&self.descriptors),
            processed_images: ProcessedImages {
                vis: EncodedImage::encode(ImageKind::Vis, &DynamicImage::ImageRgb8(overlay))?,
                roi: EncodedImage::encode(
                    ImageKind::Roi,
                    &DynamicImage::ImageLuma8(self.normalized.roi.clone()),
                )?,
                normalized: EncodedImage::encode(
                    ImageKind::Normalized,
                    &DynamicImage::ImageLuma8(canvas.clone()),
                )?,
            },
            metadata: CanvasMetadata {
                width: canvas.width(),
                height: canvas.height(),
            },
        })
    }
}

/// Score a live analysis against a reference one.
pub fn compare(
    live: &SignatureAnalysis,
    reference: &SignatureAnalysis,
    config: &PipelineConfig,
) -> VerificationReport {
    let score = similarity_score(&live.descriptors, &reference.descriptors);
    let report = VerificationReport::from_score(score, config.matching.acceptance_threshold);
    info!(
        score,
        authentic = report.is_authentic,
        live_keypoints = live.descriptors.len(),
        reference_keypoints = reference.descriptors.len(),
        "verification complete"
    );
    report
}

/// Decode, normalize and fingerprint one signature image.
pub fn capture_fingerprint(bytes: &[u8], config: &PipelineConfig) -> Result<CaptureReport> {
    config.validate()?;
    let extractor = FeatureExtractor::new(&config.features);
    let analysis = SignatureAnalysis::run(bytes, config, &extractor)?;
    let report = analysis.capture_report()?;
    info!(
        keypoints = analysis.descriptors.len(),
        zero_fingerprint = report.fingerprint.is_zero(),
        "fingerprint captured"
    );
    Ok(report)
}

/// Analyse both images in parallel and score them.
pub fn verify_signatures(
    live: &[u8],
    reference: &[u8],
    config: &PipelineConfig,
) -> Result<VerificationReport> {
    config.validate()?;
    let extractor = FeatureExtractor::new(&config.features);
    let (live, reference) = rayon::join(
        || SignatureAnalysis::run(live, config, &extractor),
        || SignatureAnalysis::run(reference, config, &extractor),
    );
    Ok(compare(&live?, &reference?, config))
}
