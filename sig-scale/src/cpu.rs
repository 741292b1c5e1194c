// SPDX-License-Identifier: MIT
//! 8-bit grayscale resampling on the CPU through `fast_image_resize`.
//!
//! The scaler writes straight into a caller-owned buffer; padded plans fill the
//! border first and resize into the content rectangle only.

use fast_image_resize as fir;
use fir::images::{TypedCroppedImageMut, TypedImage, TypedImageRef};
use fir::pixels::U8;
use fir::{FilterType, ResizeAlg, ResizeOptions, Resizer};

use crate::presets::{AspectMode, ScalePlan, Size};

#[derive(Debug)]
pub enum ScaleError {
    EmptySource,
    DestinationTooSmall { needed: usize, got: usize },
    Buffer(fir::ImageBufferError),
    Resize(fir::ResizeError),
    Crop(fir::CropBoxError),
}

impl From<fir::ImageBufferError> for ScaleError {
    fn from(e: fir::ImageBufferError) -> Self {
        Self::Buffer(e)
    }
}

impl From<fir::ResizeError> for ScaleError {
    fn from(e: fir::ResizeError) -> Self {
        Self::Resize(e)
    }
}

impl From<fir::CropBoxError> for ScaleError {
    fn from(e: fir::CropBoxError) -> Self {
        Self::Crop(e)
    }
}

impl std::fmt::Display for ScaleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptySource => write!(f, "source has a zero dimension"),
            Self::DestinationTooSmall { needed, got } => {
                write!(f, "destination holds {got} bytes, plan needs {needed}")
            }
            Self::Buffer(e) => write!(f, "invalid pixel buffer: {e}"),
            Self::Resize(e) => write!(f, "resize failed: {e}"),
            Self::Crop(e) => write!(f, "content rectangle outside canvas: {e}"),
        }
    }
}

impl std::error::Error for ScaleError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Buffer(e) => Some(e),
            Self::Resize(e) => Some(e),
            Self::Crop(e) => Some(e),
            Self::EmptySource | Self::DestinationTooSmall { .. } => None,
        }
    }
}

/// Resample `src_gray` (tightly packed, `src.w * src.h` bytes) according to
/// `plan` into the first `plan.out.w * plan.out.h` bytes of `dst`.
pub fn scale_gray_cpu(
    resizer: &mut Resizer,
    src_gray: &[u8],
    src: Size,
    plan: &ScalePlan,
    dst: &mut [u8],
) -> Result<(), ScaleError> {
    if src.w == 0 || src.h == 0 {
        return Err(ScaleError::EmptySource);
    }
    let needed = plan.out.w as usize * plan.out.h as usize;
    if dst.len() < needed {
        return Err(ScaleError::DestinationTooSmall { needed, got: dst.len() });
    }
    let dst = &mut dst[..needed];

    if let AspectMode::Pad { bg } = plan.aspect {
        dst.fill(bg);
    }

    let source = TypedImageRef::<U8>::from_buffer(src.w, src.h, src_gray)?;
    let mut canvas = TypedImage::<U8>::from_buffer(plan.out.w, plan.out.h, dst)?;
    // Box averaging keeps thin strokes when shrinking.
    let options = ResizeOptions::new().resize_alg(ResizeAlg::Convolution(FilterType::Box));

    match plan.dst_roi {
        Some((x, y, w, h)) => {
            let mut content = TypedCroppedImageMut::from_ref(&mut canvas, x, y, w, h)?;
            resizer.resize_typed::<U8>(&source, &mut content, &options)?;
        }
        None => resizer.resize_typed::<U8>(&source, &mut canvas, &options)?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presets::build_plan;

    #[test]
    fn letterbox_leaves_border_at_background() {
        let src = vec![200u8; 100 * 50];
        let plan = build_plan(
            Size { w: 100, h: 50 },
            Size { w: 64, h: 64 },
            AspectMode::Pad { bg: 0 },
        );
        let mut dst = vec![7u8; 64 * 64];
        scale_gray_cpu(&mut Resizer::new(), &src, Size { w: 100, h: 50 }, &plan, &mut dst).unwrap();

        // content occupies rows 16..48
        assert!(dst[..16 * 64].iter().all(|&v| v == 0));
        assert!(dst[48 * 64..].iter().all(|&v| v == 0));
        assert!((199..=201).contains(&dst[32 * 64 + 32]));
    }

    #[test]
    fn distort_resize_fills_whole_buffer() {
        let src = vec![90u8; 30 * 30];
        let plan = build_plan(Size { w: 30, h: 30 }, Size { w: 25, h: 25 }, AspectMode::Distort);
        let mut dst = vec![0u8; 25 * 25];
        scale_gray_cpu(&mut Resizer::new(), &src, Size { w: 30, h: 30 }, &plan, &mut dst).unwrap();
        assert!(dst.iter().all(|&v| (89..=91).contains(&v)));
    }

    #[test]
    fn rejects_short_destination() {
        let src = vec![0u8; 10 * 10];
        let plan = build_plan(Size { w: 10, h: 10 }, Size { w: 20, h: 20 }, AspectMode::Distort);
        let mut dst = vec![0u8; 10];
        let err = scale_gray_cpu(&mut Resizer::new(), &src, Size { w: 10, h: 10 }, &plan, &mut dst);
        assert!(matches!(err, Err(ScaleError::DestinationTooSmall { needed: 400, got: 10 })));
    }

    #[test]
    fn rejects_empty_source() {
        let plan = build_plan(
            Size { w: 0, h: 10 },
            Size { w: 20, h: 20 },
            AspectMode::Pad { bg: 0 },
        );
        let mut dst = vec![0u8; 400];
        let err = scale_gray_cpu(&mut Resizer::new(), &[], Size { w: 0, h: 10 }, &plan, &mut dst);
        assert!(matches!(err, Err(ScaleError::EmptySource)));
    }
}
