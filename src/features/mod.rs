//! # Features Module
//!
//! Local features of the normalized canvas and everything computed from them:
//! the stored fingerprint and the live-versus-reference similarity score.

pub mod fast;
pub mod fingerprint;
pub mod matcher;
pub mod orb;
pub mod pyramid;

pub use fingerprint::{FINGERPRINT_LEN, Fingerprint, FingerprintError, encode_fingerprint};
pub use matcher::{Match, cross_check_matches, is_authentic, round_score, similarity_score};
pub use orb::{Descriptor, DescriptorSet, Feature, FeatureExtractor, Keypoint};
