//! Scale pyramid built with the `sig-scale` resizer.

use image::GrayImage;
use sig_scale::presets::{AspectMode, Size, build_plan, pyramid_level_size};

use crate::error::Result;
use crate::processing::roi::resample;

/// One pyramid level and its scale relative to level 0.
#[derive(Debug, Clone)]
pub struct Level {
    pub index: u32,
    pub scale: f32,
    pub image: GrayImage,
}

/// Build up to `levels` levels, each `scale_factor` smaller than the last.
/// Stops early once a level would be smaller than `min_side` on either axis;
/// level 0 itself is subject to the same rule.
pub fn build_pyramid(
    base: &GrayImage,
    levels: u32,
    scale_factor: f32,
    min_side: u32,
) -> Result<Vec<Level>> {
    let base_size = Size { w: base.width(), h: base.height() };
    let mut pyramid: Vec<Level> = Vec::with_capacity(levels as usize);

    for index in 0..levels {
        let size = pyramid_level_size(base_size, scale_factor, index);
        if size.w < min_side || size.h < min_side {
            break;
        }
        let image = match pyramid.last() {
            None => base.clone(),
            Some(prev) => {
                let input = Size { w: prev.image.width(), h: prev.image.height() };
                resample(&prev.image, &build_plan(input, size, AspectMode::Distort))?
            }
        };
        pyramid.push(Level {
            index,
            scale: scale_factor.powi(index as i32),
            image,
        });
    }
    Ok(pyramid)
}

/// Split `total` keypoints across `levels` following a geometric series in
/// `1 / scale_factor`; the last level takes whatever remains.
pub fn level_budgets(total: usize, levels: usize, scale_factor: f32) -> Vec<usize> {
    if levels == 0 {
        return Vec::new();
    }
    let f = 1.0 / scale_factor as f64;
    let mut per_level = total as f64 * (1.0 - f) / (1.0 - f.powi(levels as i32));
    let mut budgets = Vec::with_capacity(levels);
    let mut assigned = 0usize;
    for _ in 0..levels - 1 {
        let n = (per_level.round() as usize).min(total - assigned);
        budgets.push(n);
        assigned += n;
        per_level *= f;
    }
    budgets.push(total - assigned);
    budgets
}
