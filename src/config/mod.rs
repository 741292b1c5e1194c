//! # Configuration Module
//!
//! This module provides the tunables for every pipeline stage and their validation.

pub mod config;

pub use config::{
    ContourConfig, FeatureConfig, MatchConfig, PipelineConfig, PreprocessConfig, RoiConfig,
};
