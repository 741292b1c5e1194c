//! # Preprocessing
//!
//! Grayscale → blur → adaptive threshold → morphological cleanup.
//!
//! The output is a binary ink mask: ink pixels are 255, paper is 0. Every step
//! returns a fresh image; inputs are never modified.

use image::{DynamicImage, GrayImage, Luma};
use imageproc::definitions::Image;
use imageproc::distance_transform::Norm;
use imageproc::filter::separable_filter_equal;
use imageproc::integral_image::integral_image;
use imageproc::morphology::{close, dilate};
use imageproc::region_labelling::{Connectivity, connected_components};
use tracing::debug;

use super::decode::RasterImage;
use crate::config::PreprocessConfig;
use crate::error::{Result, SignatureError};

pub const INK: u8 = 255;
pub const PAPER: u8 = 0;

/// Run the full preprocessing chain on a decoded image.
pub fn preprocess(image: &RasterImage, cfg: &PreprocessConfig) -> Result<GrayImage> {
    let gray = to_grayscale(image.as_dynamic());
    binarize(&gray, cfg)
}

/// Blur, threshold and clean an 8-bit grayscale image.
pub fn binarize(gray: &GrayImage, cfg: &PreprocessConfig) -> Result<GrayImage> {
    if gray.width() == 0 || gray.height() == 0 {
        return Err(SignatureError::invalid_image(format!(
            "cannot binarize a {}x{} image",
            gray.width(),
            gray.height()
        )));
    }
    let blurred = gaussian_blur(gray, cfg.blur_kernel);
    let thresholded = adaptive_threshold_inv(&blurred, cfg.threshold_block, cfg.threshold_bias);
    let mask = clean_mask(&thresholded, cfg);
    debug!(
        width = mask.width(),
        height = mask.height(),
        ink_pixels = mask.pixels().filter(|p| p[0] == INK).count(),
        "binarized signature"
    );
    Ok(mask)
}

/// Single-channel 8-bit input passes through; everything else is converted
/// with BT.601 luma weights.
pub fn to_grayscale(image: &DynamicImage) -> GrayImage {
    match image {
        DynamicImage::ImageLuma8(gray) => gray.clone(),
        DynamicImage::ImageLumaA8(_)
        | DynamicImage::ImageLuma16(_)
        | DynamicImage::ImageLumaA16(_) => image.to_luma8(),
        other => {
            let rgb = other.to_rgb8();
            GrayImage::from_fn(rgb.width(), rgb.height(), |x, y| {
                let [r, g, b] = rgb.get_pixel(x, y).0;
                Luma([bt601(r, g, b)])
            })
        }
    }
}

/// Y = 0.299R + 0.587G + 0.114B in 14-bit fixed point, rounded.
#[inline]
fn bt601(r: u8, g: u8, b: u8) -> u8 {
    const R: u32 = 4899;
    const G: u32 = 9617;
    const B: u32 = 1868;
    ((r as u32 * R + g as u32 * G + b as u32 * B + (1 << 13)) >> 14) as u8
}

/// Separable Gaussian whose sigma follows from the kernel size.
pub fn gaussian_blur(gray: &GrayImage, kernel_size: u32) -> GrayImage {
    if kernel_size <= 1 {
        return gray.clone();
    }
    let kernel = gaussian_kernel(kernel_size);
    separable_filter_equal(gray, &kernel)
}

/// 1-D Gaussian weights for an odd `size`. Small kernels use the fixed
/// binomial tables, larger ones `sigma = 0.3 * ((size - 1) * 0.5 - 1) + 0.8`.
pub fn gaussian_kernel(size: u32) -> Vec<f32> {
    match size {
        1 => vec![1.0],
        3 => vec![0.25, 0.5, 0.25],
        5 => vec![0.0625, 0.25, 0.375, 0.25, 0.0625],
        7 => vec![0.03125, 0.109375, 0.21875, 0.28125, 0.21875, 0.109375, 0.03125],
        _ => {
            let sigma = 0.3 * ((size as f32 - 1.0) * 0.5 - 1.0) + 0.8;
            let center = (size / 2) as f32;
            let raw: Vec<f32> = (0..size)
                .map(|i| {
                    let d = i as f32 - center;
                    (-(d * d) / (2.0 * sigma * sigma)).exp()
                })
                .collect();
            let sum: f32 = raw.iter().sum();
            raw.into_iter().map(|w| w / sum).collect()
        }
    }
}

/// Inverted adaptive threshold against the rounded local mean of a
/// `block × block` window (clipped at the border): a pixel becomes ink when
/// `value <= mean - bias`.
pub fn adaptive_threshold_inv(gray: &GrayImage, block: u32, bias: i32) -> GrayImage {
    let (w, h) = gray.dimensions();
    let integral: Image<Luma<u64>> = integral_image::<_, u64>(gray);
    let sum_at = |x: u32, y: u32| integral.get_pixel(x, y).0[0];
    let r = block / 2;

    GrayImage::from_fn(w, h, |x, y| {
        let (x0, y0) = (x.saturating_sub(r), y.saturating_sub(r));
        let (x1, y1) = ((x + r).min(w - 1) + 1, (y + r).min(h - 1) + 1);
        let sum = sum_at(x1, y1) + sum_at(x0, y0) - sum_at(x0, y1) - sum_at(x1, y0);
        let count = ((x1 - x0) * (y1 - y0)) as u64;
        let mean = ((sum + count / 2) / count) as i32;
        if gray.get_pixel(x, y).0[0] as i32 - mean <= -bias {
            Luma([INK])
        } else {
            Luma([PAPER])
        }
    })
}

/// Dilate, drop small 8-connected speckles, then close remaining strokes.
pub fn clean_mask(binary: &GrayImage, cfg: &PreprocessConfig) -> GrayImage {
    let repaired = dilate(binary, Norm::LInf, radius(cfg.repair_kernel));
    let kept = remove_speckles(&repaired, cfg.speckle_max_area);
    close(&kept, Norm::LInf, radius(cfg.close_kernel))
}

/// Keep only 8-connected ink components whose pixel area exceeds `max_area`.
pub fn remove_speckles(binary: &GrayImage, max_area: u32) -> GrayImage {
    let labels = connected_components(binary, Connectivity::Eight, Luma([PAPER]));
    let max_label = labels.pixels().map(|p| p.0[0]).max().unwrap_or(0) as usize;
    let mut areas = vec![0u32; max_label + 1];
    for p in labels.pixels() {
        areas[p.0[0] as usize] += 1;
    }
    let kept = areas.iter().skip(1).filter(|&&a| a > max_area).count();
    debug!(components = max_label, kept, "speckle filter");

    GrayImage::from_fn(binary.width(), binary.height(), |x, y| {
        let label = labels.get_pixel(x, y).0[0] as usize;
        if label != 0 && areas[label] > max_area {
            Luma([INK])
        } else {
            Luma([PAPER])
        }
    })
}

#[inline]
fn radius(kernel: u32) -> u8 {
    (kernel / 2).min(u8::MAX as u32) as u8
}
