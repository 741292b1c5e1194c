//! # Processing Module
//!
//! Image-side stages of the signature pipeline, in data-flow order:
//!
//! 1. [`decode`]: encoded bytes → [`RasterImage`]
//! 2. [`preprocess`]: grayscale, blur, adaptive threshold, morphology → binary mask
//! 3. [`contour`]: outer ink contours filtered by relative area
//! 4. [`roi`]: padded crop and letterboxed canvas
//! 5. [`visualize`]: audit overlay of the detected contours
//!
//! Every stage is a pure function of its inputs and the relevant config section.

pub mod contour;
pub mod decode;
pub mod preprocess;
pub mod roi;
pub mod visualize;

pub use contour::{Contour, extract_contours};
pub use decode::{RasterImage, decode_image};
pub use preprocess::preprocess;
pub use roi::{BoundingRegion, NormalizedSignature, normalize};
pub use visualize::render_overlay;
