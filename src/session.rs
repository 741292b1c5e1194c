//! # Signature Session
//!
//! Async facade over the pipeline for use inside a Tokio runtime. The
//! pipeline is CPU-bound, so each image is analysed on the blocking pool and
//! the async side only joins results.
//!
//! A session owns one validated [`PipelineConfig`] and one
//! [`FeatureExtractor`], both shared read-only across requests.

use std::sync::Arc;

use futures_util::future::try_join_all;
use tracing::{debug, info};

use crate::config::PipelineConfig;
use crate::error::Result;
use crate::features::FeatureExtractor;
use crate::pipeline::{SignatureAnalysis, compare};
use crate::report::{CaptureReport, VerificationReport};

#[derive(Debug, Clone)]
pub struct SignatureSession {
    config: Arc<PipelineConfig>,
    extractor: Arc<FeatureExtractor>,
}

impl SignatureSession {
    /// Validate `config` and build the shared feature extractor.
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        let extractor = FeatureExtractor::new(&config.features);
        Ok(Self {
            config: Arc::new(config),
            extractor: Arc::new(extractor),
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Analyse one image on the blocking pool.
    pub async fn analyze(&self, bytes: Vec<u8>) -> Result<SignatureAnalysis> {
        let config = Arc::clone(&self.config);
        let extractor = Arc::clone(&self.extractor);
        tokio::task::spawn_blocking(move || SignatureAnalysis::run(&bytes, &config, &extractor))
            .await?
    }

    /// Fingerprint one signature image.
    pub async fn capture(&self, bytes: Vec<u8>) -> Result<CaptureReport> {
        let analysis = self.analyze(bytes).await?;
        let report = tokio::task::spawn_blocking(move || analysis.capture_report()).await??;
        info!(zero_fingerprint = report.fingerprint.is_zero(), "fingerprint captured");
        Ok(report)
    }

    /// Analyse live and reference concurrently, then score.
    pub async fn verify(&self, live: Vec<u8>, reference: Vec<u8>) -> Result<VerificationReport> {
        let (live, reference) = tokio::try_join!(self.analyze(live), self.analyze(reference))?;
        Ok(compare(&live, &reference, &self.config))
    }

    /// Score one live image against several references. The live image is
    /// analysed once; reports come back in reference order.
    pub async fn verify_against(
        &self,
        live: Vec<u8>,
        references: Vec<Vec<u8>>,
    ) -> Result<Vec<VerificationReport>> {
        let count = references.len();
        let (live, references) = tokio::try_join!(
            self.analyze(live),
            try_join_all(references.into_iter().map(|bytes| self.analyze(bytes))),
        )?;
        debug!(references = count, "bulk verification analysed");
        Ok(references
            .iter()
            .map(|reference| compare(&live, reference, &self.config))
            .collect())
    }
}
