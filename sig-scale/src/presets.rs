// SPDX-License-Identifier: MIT
//! # Scaling Plan Computation
//!
//! A [`ScalePlan`] captures everything the CPU scaler needs: input size, final
//! buffer size and, for letterboxed output, the sub-rectangle receiving the
//! scaled content.
//!
//! - Letterbox sizes are computed in integer arithmetic and floored, so scaled
//!   content never overflows the canvas.
//! - Every scaled side is clamped to at least 1px.

/// Width and height in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Size {
    pub w: u32,
    pub h: u32,
}

/// What happens when the source and target aspect ratios differ.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AspectMode {
    /// Resample straight to the target size. Pyramid levels shrink both sides
    /// by the same factor, so nothing is distorted in practice.
    Distort,
    /// Fit the image inside the target preserving its aspect ratio and fill the
    /// remainder with `bg` (letterbox / pillarbox).
    Pad { bg: u8 },
}

/// Resolved geometry of one resize.
#[derive(Clone, Copy, Debug)]
pub struct ScalePlan {
    pub input: Size,
    pub aspect: AspectMode,
    /// Size of the whole destination buffer.
    pub out: Size,
    /// `(x, y, w, h)` of the scaled content inside `out` for padded plans.
    pub dst_roi: Option<(u32, u32, u32, u32)>,
}

/// Plan a resize of `input` into a `target`-sized buffer. Padded content is
/// centred, odd leftovers going to the right / bottom border.
pub fn build_plan(input: Size, target: Size, aspect: AspectMode) -> ScalePlan {
    match aspect {
        AspectMode::Distort => ScalePlan {
            input,
            aspect,
            out: target,
            dst_roi: None,
        },
        AspectMode::Pad { .. } => {
            let (rw, rh) = fit_within(input, target);
            let x = target.w.saturating_sub(rw) / 2;
            let y = target.h.saturating_sub(rh) / 2;
            ScalePlan {
                input,
                aspect,
                out: target,
                dst_roi: Some((x, y, rw, rh)),
            }
        }
    }
}

/// Scale `input` by the largest factor that keeps it inside `box_`.
/// Upscales as well as downscales. The limiting side fills the box exactly;
/// the other side is floored in integer arithmetic.
fn fit_within(input: Size, box_: Size) -> (u32, u32) {
    let (w, h) = (input.w.max(1) as u64, input.h.max(1) as u64);
    let (bw, bh) = (box_.w.max(1) as u64, box_.h.max(1) as u64);
    let (rw, rh) = if w * bh >= h * bw {
        (bw, h * bw / w)
    } else {
        (w * bh / h, bh)
    };
    (rw.clamp(1, bw) as u32, rh.clamp(1, bh) as u32)
}

/// Size of pyramid level `level` when every level shrinks by `scale_factor`.
pub fn pyramid_level_size(base: Size, scale_factor: f32, level: u32) -> Size {
    let s = (scale_factor as f64).powi(level as i32);
    Size {
        w: ((base.w as f64 / s).round() as u32).max(1),
        h: ((base.h as f64 / s).round() as u32).max(1),
    }
}
