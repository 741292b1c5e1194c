// SPDX-License-Identifier: MIT
//! # sig-scale: Canvas Scaling for Signature Masks
//!
//! This crate computes scaling plans and performs the actual resampling for the
//! 8-bit grayscale images produced by the signature pipeline.
//!
//! ## Key Components
//!
//! - [`presets`]: Scaling plan computation (distorting resize or letterboxed canvas)
//! - [`cpu`]: CPU-based scaling implementation using `fast_image_resize`
//!
//! ## Letterboxing
//!
//! A letterbox plan scales the source so that its larger side exactly fills the
//! square canvas and centres it, leaving a constant background border. Unlike a
//! thumbnailer, the plan upscales small inputs: downstream feature extraction
//! needs a constant canvas whatever the size of the cropped signature.
//!
//! ## Usage Example
//!
//! ```rust
//! use sig_scale::{cpu::scale_gray_cpu, presets::{build_plan, AspectMode, Size}};
//!
//! let input = Size { w: 400, h: 100 };
//! let plan = build_plan(input, Size { w: 256, h: 256 }, AspectMode::Pad { bg: 0 });
//! assert_eq!(plan.dst_roi, Some((0, 96, 256, 64)));
//!
//! let src = vec![255u8; 400 * 100];
//! let mut dst = vec![0u8; 256 * 256];
//! let mut resizer = fast_image_resize::Resizer::new();
//! scale_gray_cpu(&mut resizer, &src, input, &plan, &mut dst)?;
//! assert_eq!(dst[0], 0);
//! assert!(dst[128 * 256 + 128] >= 254);
//! # Ok::<(), sig_scale::cpu::ScaleError>(())
//! ```

pub mod cpu;
pub mod presets;
