//! # Signature Print
//!
//! Turns a photographed or scanned handwritten signature into a canonical,
//! size-normalized image plus a compact numeric fingerprint, and decides
//! whether two signature images were produced by the same hand.
//!
//! ## Architecture
//!
//! The library is organized into several key modules:
//! - `processing`: decode, binarize, isolate and normalize the signature
//! - `features`: keypoints, binary descriptors, fingerprint and matching
//! - `pipeline`: synchronous capture / verify entry points
//! - `session`: async facade running the pipeline on Tokio's blocking pool
//! - `config`: every tunable, with validation
//! - `report`: serializable results
//!
//! Canvas letterboxing and pyramid resampling go through the `sig-scale`
//! workspace crate.
//!
//! ## Degraded inputs
//!
//! An image without ink is not an error: the region of interest falls back to
//! the whole mask, the fingerprint is all zeros and any score against it is 0.
//!
//! ## Example
//!
//! ```rust,no_run
//! use signature_print::{PipelineConfig, SignatureSession};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let session = SignatureSession::new(PipelineConfig::default())?;
//! let live = std::fs::read("live.png")?;
//! let reference = std::fs::read("reference.png")?;
//!
//! let report = session.verify(live, reference).await?;
//! println!("authentic: {} ({})", report.is_authentic, report.similarity_score);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod features;
pub mod pipeline;
pub mod processing;
pub mod report;
pub mod session;

pub use config::PipelineConfig;
pub use error::{HasRecoverySuggestion, HasSeverity, Result, SignatureError};
pub use features::{DescriptorSet, FeatureExtractor, Fingerprint};
pub use pipeline::{SignatureAnalysis, capture_fingerprint, verify_signatures};
pub use report::{CaptureReport, VerificationReport};
pub use session::SignatureSession;
