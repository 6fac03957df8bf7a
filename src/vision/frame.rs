//! Decoded image buffers and the conversions every stage needs

use image::{imageops::FilterType, DynamicImage, GrayImage, Luma};

use crate::error::{InputKind, Result, VerifyError};

/// A decoded image owned by a single pipeline stage
#[derive(Debug, Clone)]
pub struct PixelBuffer {
    image: DynamicImage,
}

impl PixelBuffer {
    /// Decode raw image bytes (JPEG, PNG, ...) without resizing or color conversion
    pub fn decode(bytes: &[u8], kind: InputKind) -> Result<Self> {
        let image = image::load_from_memory(bytes)
            .map_err(|source| VerifyError::Decode { kind, source })?;
        Ok(Self { image })
    }

    /// Image width in pixels
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Image height in pixels
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Number of channels per pixel
    pub fn channels(&self) -> u8 {
        self.image.color().channel_count()
    }

    /// Get dimensions as (width, height)
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width(), self.height())
    }

    /// True when the image has no pixels
    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    /// Resample to exactly `width` x `height`, ignoring aspect ratio.
    /// Nearest-neighbour, so pixel-level transitions survive instead of
    /// being averaged away.
    pub fn sample_exact(&self, width: u32, height: u32) -> PixelBuffer {
        if self.dimensions() == (width, height) {
            return self.clone();
        }
        Self {
            image: self.image.resize_exact(width, height, FilterType::Nearest),
        }
    }

    /// Downscale so the longer side is at most `max_side`, keeping aspect ratio.
    /// Images already within bounds are returned unchanged.
    pub fn downscale_to_fit(self, max_side: u32) -> PixelBuffer {
        let (width, height) = self.dimensions();
        let longer = width.max(height);
        if longer <= max_side || max_side == 0 {
            return self;
        }

        let scale = max_side as f64 / longer as f64;
        let new_w = ((width as f64 * scale).round() as u32).max(1);
        let new_h = ((height as f64 * scale).round() as u32).max(1);

        Self {
            image: self.image.resize_exact(new_w, new_h, FilterType::Triangle),
        }
    }

    /// Luminance-weighted single-channel copy (0.299 R + 0.587 G + 0.114 B)
    pub fn to_grayscale(&self) -> GrayImage {
        let rgb = self.image.to_rgb8();
        GrayImage::from_fn(rgb.width(), rgb.height(), |x, y| {
            let [r, g, b] = rgb.get_pixel(x, y).0;
            Luma([luminance(r, g, b)])
        })
    }
}

impl From<DynamicImage> for PixelBuffer {
    fn from(image: DynamicImage) -> Self {
        Self { image }
    }
}

/// Standard luminance weights
pub fn luminance(r: u8, g: u8, b: u8) -> u8 {
    (0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32)
        .round()
        .clamp(0.0, 255.0) as u8
}
