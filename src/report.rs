//! # Reports
//!
//! Serializable results of the two public operations. Auxiliary images are
//! kept as PNG bytes and serialized as standard-alphabet base64.

use std::io::Cursor;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::{DynamicImage, ImageFormat};
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

use crate::error::{Result, SignatureError};
use crate::features::{Fingerprint, is_authentic, round_score};

/// Which auxiliary image an [`EncodedImage`] holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageKind {
    Vis,
    Roi,
    Normalized,
}

impl ImageKind {
    pub fn file_name(self) -> &'static str {
        match self {
            Self::Vis => "vis.png",
            Self::Roi => "roi.png",
            Self::Normalized => "normalized.png",
        }
    }
}

/// A PNG-encoded auxiliary image.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedImage {
    pub kind: ImageKind,
    pub png: Vec<u8>,
}

impl EncodedImage {
    pub fn encode(kind: ImageKind, image: &DynamicImage) -> Result<Self> {
        let mut png = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .map_err(|e| {
                SignatureError::encode("png", e).with_metadata("kind", format!("{kind:?}"))
            })?;
        Ok(Self { kind, png })
    }

    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.png)
    }
}

impl Serialize for EncodedImage {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("EncodedImage", 2)?;
        s.serialize_field("type", &self.kind)?;
        s.serialize_field("image", &self.to_base64())?;
        s.end()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessedImages {
    pub vis: EncodedImage,
    pub roi: EncodedImage,
    pub normalized: EncodedImage,
}

impl ProcessedImages {
    pub fn iter(&self) -> impl Iterator<Item = &EncodedImage> {
        [&self.vis, &self.roi, &self.normalized].into_iter()
    }
}

/// Dimensions of the normalized canvas the fingerprint was computed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CanvasMetadata {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaptureReport {
    pub fingerprint: Fingerprint,
    pub processed_images: ProcessedImages,
    pub metadata: CanvasMetadata,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VerificationReport {
    pub is_authentic: bool,
    /// Rounded to 4 decimal places.
    pub similarity_score: f32,
}

impl VerificationReport {
    /// Decide on the unrounded score, report the rounded one.
    pub fn from_score(score: f32, threshold: f32) -> Self {
        Self {
            is_authentic: is_authentic(score, threshold),
            similarity_score: round_score(score),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};

    #[test]
    fn encoded_image_serializes_as_base64_png() {
        let img = DynamicImage::ImageLuma8(GrayImage::from_pixel(4, 4, Luma([9])));
        let encoded = EncodedImage::encode(ImageKind::Roi, &img).unwrap();
        let json = serde_json::to_value(&encoded).unwrap();
        assert_eq!(json["type"], "roi");

        let b64 = json["image"].as_str().unwrap();
        let bytes = STANDARD.decode(b64).unwrap();
        assert_eq!(&bytes[..4], b"\x89PNG");
        let back = image::load_from_memory(&bytes).unwrap();
        assert_eq!(back.to_luma8().get_pixel(2, 2).0[0], 9);
    }

    #[test]
    fn decision_uses_unrounded_score() {
        let report = VerificationReport::from_score(0.200_04, 0.20);
        assert!(report.is_authentic);
        assert_eq!(report.similarity_score, 0.2);

        let report = VerificationReport::from_score(0.2, 0.20);
        assert!(!report.is_authentic);
    }

    #[test]
    fn verification_report_json_shape() {
        let json = serde_json::to_value(VerificationReport::from_score(0.5, 0.2)).unwrap();
        assert_eq!(json["is_authentic"], true);
        assert_eq!(json["similarity_score"], 0.5);
    }

    #[test]
    fn file_names_follow_kind() {
        assert_eq!(ImageKind::Vis.file_name(), "vis.png");
        assert_eq!(ImageKind::Normalized.file_name(), "normalized.png");
    }
}
