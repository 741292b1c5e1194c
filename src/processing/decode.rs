//! Raw bytes → [`RasterImage`].

use image::{DynamicImage, GenericImageView};
use tracing::debug;

use crate::error::{Result, SignatureError};

/// A decoded, non-empty source image. Immutable once constructed.
#[derive(Debug, Clone)]
pub struct RasterImage {
    inner: DynamicImage,
}

impl RasterImage {
    /// Wrap an already decoded image, rejecting zero-dimension rasters.
    pub fn new(image: DynamicImage) -> Result<Self> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(SignatureError::invalid_image(format!(
                "decoded image has zero dimension ({width}x{height})"
            )));
        }
        Ok(Self { inner: image })
    }

    pub fn width(&self) -> u32 {
        self.inner.width()
    }

    pub fn height(&self) -> u32 {
        self.inner.height()
    }

    pub fn as_dynamic(&self) -> &DynamicImage {
        &self.inner
    }
}

/// Decode an encoded raster (PNG, JPEG, BMP, TIFF, WebP, ...) guessing the
/// format from its content.
pub fn decode_image(bytes: &[u8]) -> Result<RasterImage> {
    if bytes.is_empty() {
        return Err(SignatureError::invalid_image("empty input buffer"));
    }
    let image = image::load_from_memory(bytes).map_err(SignatureError::undecodable)?;
    let raster = RasterImage::new(image)?;
    debug!(
        width = raster.width(),
        height = raster.height(),
        color = ?raster.inner.color(),
        "decoded image"
    );
    Ok(raster)
}
