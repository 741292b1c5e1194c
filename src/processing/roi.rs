//! # Region of Interest
//!
//! Crops the mask to the padded union bounding box of the retained contours
//! and letterboxes the crop onto a square canvas of constant size.
//!
//! When no contours survive, the ROI is the whole mask and the canvas is the
//! whole mask letterboxed, so callers always receive a canvas of the
//! configured size.

use fast_image_resize::Resizer;
use image::GrayImage;
use serde::Serialize;
use sig_scale::cpu::scale_gray_cpu;
use sig_scale::presets::{AspectMode, ScalePlan, Size, build_plan};
use tracing::{debug, warn};

use super::contour::Contour;
use crate::config::RoiConfig;
use crate::error::{Result, SignatureError};

/// Axis-aligned rectangle in mask coordinates. `width` and `height` count
/// pixels, so the last covered column is `x + width - 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BoundingRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingRegion {
    /// Grow by `padding` on every side, clamped to a `bounds_w × bounds_h` image.
    pub fn padded(&self, padding: u32, bounds_w: u32, bounds_h: u32) -> Self {
        let x0 = self.x.saturating_sub(padding);
        let y0 = self.y.saturating_sub(padding);
        let x1 = (self.x + self.width).saturating_add(padding).min(bounds_w);
        let y1 = (self.y + self.height).saturating_add(padding).min(bounds_h);
        Self {
            x: x0,
            y: y0,
            width: x1.saturating_sub(x0),
            height: y1.saturating_sub(y0),
        }
    }
}

/// Inclusive bounding rectangle over the points of every contour.
pub fn union_bounds(contours: &[Contour]) -> Option<BoundingRegion> {
    let mut points = contours.iter().flat_map(|c| c.points.iter());
    let first = points.next()?;
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
    for p in points {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }
    Some(BoundingRegion {
        x: min_x,
        y: min_y,
        width: max_x - min_x + 1,
        height: max_y - min_y + 1,
    })
}

/// Cropped mask plus its fixed-size letterboxed canvas.
#[derive(Debug, Clone)]
pub struct NormalizedSignature {
    /// Padded crop of the mask, or the whole mask when nothing was detected.
    pub roi: GrayImage,
    /// `canvas_size × canvas_size`, zero outside the scaled ROI.
    pub canvas: GrayImage,
    /// Crop rectangle in mask coordinates; `None` on the passthrough path.
    pub region: Option<BoundingRegion>,
}

/// Crop `mask` around `contours` and letterbox it onto the canvas.
pub fn normalize(
    mask: &GrayImage,
    contours: &[Contour],
    cfg: &RoiConfig,
) -> Result<NormalizedSignature> {
    let (w, h) = mask.dimensions();
    if w == 0 || h == 0 {
        return Err(SignatureError::invalid_image("cannot normalize an empty mask"));
    }

    let (roi, region) = match union_bounds(contours) {
        Some(bounds) => {
            let region = bounds.padded(cfg.padding, w, h);
            let roi =
                image::imageops::crop_imm(mask, region.x, region.y, region.width, region.height)
                    .to_image();
            debug!(?bounds, ?region, "cropped signature region");
            (roi, Some(region))
        }
        None => {
            warn!(width = w, height = h, "no ink contours detected, using full mask");
            (mask.clone(), None)
        }
    };

    let canvas = letterbox(&roi, cfg.canvas_size)?;
    Ok(NormalizedSignature { roi, canvas, region })
}

/// Scale `image` so its larger side exactly fills a `side × side` canvas,
/// centred on a zero background. Small inputs are scaled up.
pub fn letterbox(image: &GrayImage, side: u32) -> Result<GrayImage> {
    let input = Size { w: image.width(), h: image.height() };
    let plan = build_plan(input, Size { w: side, h: side }, AspectMode::Pad { bg: 0 });
    resample(image, &plan)
}

/// Run a scale plan on an 8-bit grayscale image.
pub(crate) fn resample(image: &GrayImage, plan: &ScalePlan) -> Result<GrayImage> {
    let mut dst = vec![0u8; plan.out.w as usize * plan.out.h as usize];
    let mut resizer = Resizer::new();
    scale_gray_cpu(&mut resizer, image.as_raw(), plan.input, plan, &mut dst)
        .map_err(|e| SignatureError::from(e).with_operation("letterbox"))?;
    GrayImage::from_raw(plan.out.w, plan.out.h, dst).ok_or_else(|| {
        SignatureError::processing("resample", "output buffer does not match plan size")
            .with_metadata("out", format!("{}x{}", plan.out.w, plan.out.h))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;
    use imageproc::point::Point;

    fn rect_contour(x0: u32, y0: u32, x1: u32, y1: u32) -> Contour {
        Contour {
            points: vec![
                Point::new(x0, y0),
                Point::new(x0, y1),
                Point::new(x1, y1),
                Point::new(x1, y0),
            ],
        }
    }

    #[test]
    fn union_bounds_is_inclusive() {
        let bounds =
            union_bounds(&[rect_contour(10, 20, 30, 25), rect_contour(40, 5, 41, 6)]).unwrap();
        assert_eq!(
            bounds,
            BoundingRegion { x: 10, y: 5, width: 32, height: 21 }
        );
        assert!(union_bounds(&[]).is_none());
    }

    #[test]
    fn padding_clamps_to_image() {
        let region = BoundingRegion { x: 3, y: 90, width: 10, height: 10 }.padded(25, 120, 100);
        assert_eq!(region, BoundingRegion { x: 0, y: 65, width: 38, height: 35 });
    }

    #[test]
    fn crop_then_letterbox_wide_signature() {
        let mut mask = GrayImage::new(400, 200);
        for y in 90..110 {
            for x in 50..350 {
                mask.put_pixel(x, y, Luma([255]));
            }
        }
        let cfg = RoiConfig::default();
        let out = normalize(&mask, &[rect_contour(50, 90, 349, 109)], &cfg).unwrap();

        let region = out.region.unwrap();
        assert_eq!(region, BoundingRegion { x: 25, y: 65, width: 350, height: 70 });
        assert_eq!(out.roi.dimensions(), (350, 70));
        assert_eq!(out.canvas.dimensions(), (256, 256));
        // 350x70 → 256x51, centred vertically
        assert_eq!(out.canvas.get_pixel(128, 0).0[0], 0);
        assert_eq!(out.canvas.get_pixel(128, 255).0[0], 0);
        assert!(out.canvas.get_pixel(128, 128).0[0] > 200);
    }

    #[test]
    fn empty_contours_pass_mask_through() {
        let mask = GrayImage::new(90, 40);
        let out = normalize(&mask, &[], &RoiConfig::default()).unwrap();
        assert!(out.region.is_none());
        assert_eq!(out.roi, mask);
        assert_eq!(out.canvas.dimensions(), (256, 256));
        assert!(out.canvas.pixels().all(|p| p.0[0] == 0));
    }

    #[test]
    fn tiny_roi_is_upscaled() {
        let img = GrayImage::from_pixel(8, 4, Luma([255]));
        let canvas = letterbox(&img, 64).unwrap();
        assert_eq!(canvas.dimensions(), (64, 64));
        assert!(canvas.get_pixel(32, 32).0[0] >= 254);
        assert_eq!(canvas.get_pixel(32, 2).0[0], 0);
    }

    #[test]
    fn resample_failure_names_operation() {
        let err = letterbox(&GrayImage::new(0, 0), 64).unwrap_err();
        assert_eq!(err.category(), "processing");
        assert_eq!(err.context().operation.as_deref(), Some("letterbox"));
    }
}
