//! Fixed-length fingerprint vector derived from a descriptor set.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::orb::DescriptorSet;

pub const FINGERPRINT_LEN: usize = 128;

/// Exactly [`FINGERPRINT_LEN`] values, each in `[0, 1]`. Deserialization
/// rejects anything else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "Vec<f32>", try_from = "Vec<f32>")]
pub struct Fingerprint(Vec<f32>);

#[derive(Debug, Error, PartialEq)]
pub enum FingerprintError {
    #[error("fingerprint has {0} values, expected {FINGERPRINT_LEN}")]
    Length(usize),
    #[error("fingerprint value {value} at index {index} is outside [0, 1]")]
    OutOfRange { index: usize, value: f32 },
}

impl TryFrom<Vec<f32>> for Fingerprint {
    type Error = FingerprintError;

    fn try_from(values: Vec<f32>) -> Result<Self, Self::Error> {
        if values.len() != FINGERPRINT_LEN {
            return Err(FingerprintError::Length(values.len()));
        }
        if let Some((index, &value)) =
            values.iter().enumerate().find(|(_, v)| !(0.0..=1.0).contains(*v))
        {
            return Err(FingerprintError::OutOfRange { index, value });
        }
        Ok(Self(values))
    }
}

impl From<Fingerprint> for Vec<f32> {
    fn from(fingerprint: Fingerprint) -> Self {
        fingerprint.0
    }
}

impl Fingerprint {
    pub fn zeros() -> Self {
        Self(vec![0.0; FINGERPRINT_LEN])
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|&v| v == 0.0)
    }
}

/// Concatenate descriptor bytes in detection order, keep the first
/// [`FINGERPRINT_LEN`] (zero-padded when short) and scale to `[0, 1]`.
pub fn encode_fingerprint(set: &DescriptorSet) -> Fingerprint {
    let mut values: Vec<f32> = set
        .descriptors()
        .flat_map(|d| d.iter())
        .take(FINGERPRINT_LEN)
        .map(|&b| b as f32 / 255.0)
        .collect();
    values.resize(FINGERPRINT_LEN, 0.0);
    Fingerprint(values)
}
