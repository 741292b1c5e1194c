//! # Oriented FAST / rotated BRIEF
//!
//! Keypoints are FAST-9 corners ranked by Harris response on every level of a
//! scale pyramid. Each keypoint gets an orientation from the intensity
//! centroid of its patch and a 256-bit descriptor from pairwise intensity
//! tests, the test pattern rotated by that orientation.
//!
//! The sampling pattern is drawn once per [`FeatureExtractor`] from a seeded
//! RNG, so two extractors built from equal [`FeatureConfig`]s produce
//! comparable descriptors.

use image::GrayImage;
use imageproc::filter::gaussian_blur_f32;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::Serialize;
use tracing::debug;

use super::fast::{Corner, detect_corners, retain_strongest};
use super::pyramid::{Level, build_pyramid, level_budgets};
use crate::config::FeatureConfig;
use crate::error::Result;

pub const DESCRIPTOR_BYTES: usize = 32;
const DESCRIPTOR_BITS: usize = DESCRIPTOR_BYTES * 8;
const SMOOTHING_SIGMA: f32 = 2.0;

/// 256-bit binary descriptor.
pub type Descriptor = [u8; DESCRIPTOR_BYTES];

/// Keypoint in level-0 (canvas) coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Keypoint {
    pub x: f32,
    pub y: f32,
    /// Patch diameter at level 0.
    pub size: f32,
    /// Degrees in `[0, 360)`.
    pub angle: f32,
    pub response: f32,
    /// Pyramid level the keypoint was detected on.
    pub octave: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub keypoint: Keypoint,
    pub descriptor: Descriptor,
}

/// Features of one image in detection order: level ascending, response
/// descending within a level. May be empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DescriptorSet {
    pub features: Vec<Feature>,
}

impl DescriptorSet {
    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn descriptors(&self) -> impl Iterator<Item = &Descriptor> {
        self.features.iter().map(|f| &f.descriptor)
    }

    pub fn keypoints(&self) -> impl Iterator<Item = &Keypoint> {
        self.features.iter().map(|f| &f.keypoint)
    }
}

/// One intensity comparison, offsets relative to the keypoint before rotation.
#[derive(Debug, Clone, Copy, PartialEq)]
struct SamplePair {
    a: (f32, f32),
    b: (f32, f32),
}

#[derive(Debug, Clone)]
pub struct FeatureExtractor {
    config: FeatureConfig,
    pattern: Vec<SamplePair>,
}

impl FeatureExtractor {
    pub fn new(config: &FeatureConfig) -> Self {
        Self {
            pattern: sampling_pattern(config.pattern_seed, config.patch_size),
            config: config.clone(),
        }
    }

    /// Detect and describe up to `max_keypoints` features on `canvas`.
    pub fn extract(&self, canvas: &GrayImage) -> Result<DescriptorSet> {
        let cfg = &self.config;
        let min_side = 2 * cfg.edge_threshold + 1;
        let pyramid = build_pyramid(canvas, cfg.levels, cfg.scale_factor, min_side)?;
        let budgets = level_budgets(cfg.max_keypoints, pyramid.len(), cfg.scale_factor);

        let per_level: Vec<Vec<Feature>> = pyramid
            .par_iter()
            .zip(budgets.par_iter())
            .map(|(level, &budget)| self.describe_level(level, budget))
            .collect();

        let features: Vec<Feature> = per_level.into_iter().flatten().collect();
        debug!(
            levels = pyramid.len(),
            keypoints = features.len(),
            "extracted features"
        );
        Ok(DescriptorSet { features })
    }

    fn describe_level(&self, level: &Level, budget: usize) -> Vec<Feature> {
        if budget == 0 {
            return Vec::new();
        }
        let cfg = &self.config;
        let corners = detect_corners(
            &level.image,
            cfg.fast_threshold,
            cfg.edge_threshold,
            cfg.harris_k,
        );
        let corners = retain_strongest(corners, budget);
        if corners.is_empty() {
            return Vec::new();
        }

        let radius = (cfg.patch_size / 2) as i32;
        let smoothed = gaussian_blur_f32(&level.image, SMOOTHING_SIGMA);
        corners
            .iter()
            .map(|corner| {
                let angle = intensity_centroid_angle(&level.image, corner, radius);
                Feature {
                    keypoint: Keypoint {
                        x: corner.x as f32 * level.scale,
                        y: corner.y as f32 * level.scale,
                        size: cfg.patch_size as f32 * level.scale,
                        angle: degrees_in_turn(angle),
                        response: corner.response,
                        octave: level.index,
                    },
                    descriptor: self.describe(&smoothed, corner, angle),
                }
            })
            .collect()
    }

    fn describe(&self, smoothed: &GrayImage, corner: &Corner, angle: f32) -> Descriptor {
        let (sin, cos) = angle.sin_cos();
        let (w, h) = smoothed.dimensions();
        let sample = |(dx, dy): (f32, f32)| {
            let rx = (cos * dx - sin * dy).round() as i64;
            let ry = (sin * dx + cos * dy).round() as i64;
            let x = (corner.x as i64 + rx).clamp(0, w as i64 - 1) as u32;
            let y = (corner.y as i64 + ry).clamp(0, h as i64 - 1) as u32;
            smoothed.get_pixel(x, y).0[0]
        };

        let mut descriptor = [0u8; DESCRIPTOR_BYTES];
        for (bit, pair) in self.pattern.iter().enumerate() {
            if sample(pair.a) < sample(pair.b) {
                descriptor[bit / 8] |= 1 << (bit % 8);
            }
        }
        descriptor
    }
}

/// Orientation (radians) of the vector from the keypoint to the intensity
/// centroid of the surrounding disc.
fn intensity_centroid_angle(img: &GrayImage, corner: &Corner, radius: i32) -> f32 {
    let (w, h) = (img.width() as i32, img.height() as i32);
    let (cx, cy) = (corner.x as i32, corner.y as i32);
    let (mut m10, mut m01) = (0i64, 0i64);
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if dx * dx + dy * dy > radius * radius {
                continue;
            }
            let (x, y) = (cx + dx, cy + dy);
            if x < 0 || y < 0 || x >= w || y >= h {
                continue;
            }
            let v = img.get_pixel(x as u32, y as u32).0[0] as i64;
            m10 += dx as i64 * v;
            m01 += dy as i64 * v;
        }
    }
    (m01 as f32).atan2(m10 as f32)
}

/// Radians to degrees in `[0, 360)`. `rem_euclid` rounds tiny negative
/// angles up to exactly 360.
fn degrees_in_turn(radians: f32) -> f32 {
    let degrees = radians.to_degrees().rem_euclid(360.0);
    if degrees >= 360.0 { 0.0 } else { degrees }
}

/// 256 point pairs with coordinates drawn from N(0, (patch/5)^2), clamped to
/// the patch.
fn sampling_pattern(seed: u64, patch_size: u32) -> Vec<SamplePair> {
    let mut rng = StdRng::seed_from_u64(seed);
    let sigma = patch_size as f32 / 5.0;
    let half = (patch_size / 2) as f32;
    let mut coord = || (standard_normal(&mut rng) * sigma).round().clamp(-half, half);
    (0..DESCRIPTOR_BITS)
        .map(|_| SamplePair {
            a: (coord(), coord()),
            b: (coord(), coord()),
        })
        .collect()
}

/// Box-Muller transform.
fn standard_normal(rng: &mut StdRng) -> f32 {
    let u1: f32 = rng.gen_range(f32::EPSILON..1.0);
    let u2: f32 = rng.gen_range(0.0..1.0);
    (-2.0 * u1.ln()).sqrt() * (std::f32::consts::TAU * u2).cos()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;
    use imageproc::drawing::draw_filled_rect_mut;
    use imageproc::rect::Rect;

    fn blocks_canvas() -> GrayImage {
        let mut img = GrayImage::new(256, 256);
        let blocks = [
            (50, 60, 40, 30),
            (120, 50, 25, 70),
            (70, 140, 90, 20),
            (180, 150, 30, 40),
        ];
        for (i, (x, y, w, h)) in blocks.into_iter().enumerate() {
            let shade = Luma([140 + 30 * i as u8]);
            draw_filled_rect_mut(&mut img, Rect::at(x, y).of_size(w, h), shade);
        }
        img
    }

    #[test]
    fn pattern_is_seeded_and_bounded() {
        let a = sampling_pattern(7, 31);
        let b = sampling_pattern(7, 31);
        let c = sampling_pattern(8, 31);
        assert_eq!(a.len(), 256);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.iter().all(|p| [p.a.0, p.a.1, p.b.0, p.b.1].iter().all(|v| v.abs() <= 15.0)));
    }

    #[test]
    fn blank_canvas_yields_no_features() {
        let extractor = FeatureExtractor::new(&FeatureConfig::default());
        let set = extractor.extract(&GrayImage::new(256, 256)).unwrap();
        assert!(set.is_empty());
    }

    #[test]
    fn extraction_is_deterministic_and_bounded() {
        let cfg = FeatureConfig::default();
        let canvas = blocks_canvas();
        let first = FeatureExtractor::new(&cfg).extract(&canvas).unwrap();
        let second = FeatureExtractor::new(&cfg).extract(&canvas).unwrap();
        assert!(!first.is_empty());
        assert!(first.len() <= cfg.max_keypoints);
        assert_eq!(first, second);
    }

    #[test]
    fn features_ordered_by_level_then_response() {
        let set = FeatureExtractor::new(&FeatureConfig::default())
            .extract(&blocks_canvas())
            .unwrap();
        for pair in set.features.windows(2) {
            let (a, b) = (&pair[0].keypoint, &pair[1].keypoint);
            assert!(a.octave <= b.octave);
            if a.octave == b.octave {
                assert!(a.response >= b.response);
            }
        }
        assert!(set.keypoints().all(|k| (0.0..360.0).contains(&k.angle)));
    }

    #[test]
    fn keypoint_budget_is_respected() {
        let cfg = FeatureConfig {
            max_keypoints: 5,
            ..FeatureConfig::default()
        };
        let set = FeatureExtractor::new(&cfg).extract(&blocks_canvas()).unwrap();
        assert!(set.len() <= 5);
    }

    #[test]
    fn centroid_points_toward_bright_side() {
        let img = GrayImage::from_fn(64, 64, |x, _| if x > 32 { Luma([255]) } else { Luma([0]) });
        let corner = Corner { x: 32, y: 32, response: 0.0 };
        let angle = intensity_centroid_angle(&img, &corner, 15);
        assert!(angle.abs() < 0.01);
    }

    #[test]
    fn angles_stay_below_full_turn() {
        assert_eq!(degrees_in_turn(-1e-7), 0.0);
        assert_eq!(degrees_in_turn(0.0), 0.0);
        assert!((degrees_in_turn(-std::f32::consts::FRAC_PI_2) - 270.0).abs() < 1e-3);
        assert!((degrees_in_turn(std::f32::consts::PI) - 180.0).abs() < 1e-3);
    }
}
