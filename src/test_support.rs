//! Shared fixtures for unit tests: synthetic images and stub engines

use anyhow::{bail, Result};
use async_trait::async_trait;
use image::{DynamicImage, GrayImage, ImageFormat, Luma, Rgb, RgbImage};
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Notify;

use crate::vision::correlation::CorrelationEngine;
use crate::vision::ocr::{OcrEngine, OcrOutput};

/// Black/white checkerboard with `cell`-pixel squares
pub fn checkerboard(width: u32, height: u32, cell: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        let v = if ((x / cell) + (y / cell)) % 2 == 0 { 0 } else { 255 };
        Rgb([v, v, v])
    }))
}

/// Alternating black/white vertical stripes `stripe` pixels wide
pub fn vertical_stripes(width: u32, height: u32, stripe: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, _| {
        let v = if (x / stripe) % 2 == 0 { 0 } else { 255 };
        Rgb([v, v, v])
    }))
}

/// Single-color image
pub fn flat(width: u32, height: u32, value: u8) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([value, value, value])))
}

/// Deterministic uniform noise
pub fn noise_gray(width: u32, height: u32, seed: u64) -> GrayImage {
    let mut state = seed.wrapping_mul(0x9E37_79B9_7F4A_7C15) | 1;
    GrayImage::from_fn(width, height, |_, _| {
        // xorshift64*
        state ^= state >> 12;
        state ^= state << 25;
        state ^= state >> 27;
        Luma([(state.wrapping_mul(0x2545_F491_4F6C_DD1D) >> 56) as u8])
    })
}

/// Deterministic noise as a grayscale `DynamicImage`
pub fn noise(width: u32, height: u32, seed: u64) -> DynamicImage {
    DynamicImage::ImageLuma8(noise_gray(width, height, seed))
}

/// PNG-encode an image, as an upload would arrive
pub fn encode_png(image: &DynamicImage) -> Vec<u8> {
    let mut bytes = Cursor::new(Vec::new());
    image
        .write_to(&mut bytes, ImageFormat::Png)
        .expect("PNG encoding");
    bytes.into_inner()
}

/// OCR engine returning fixed text, counting lifecycle calls
#[derive(Debug, Default)]
pub struct StubOcr {
    text: String,
    confidence: f32,
    pub initializations: AtomicUsize,
    pub recognitions: AtomicUsize,
    pub terminations: AtomicUsize,
}

impl StubOcr {
    pub fn new(text: &str, confidence: f32) -> Self {
        Self {
            text: text.to_string(),
            confidence,
            ..Default::default()
        }
    }

    pub fn recognitions(&self) -> usize {
        self.recognitions.load(Ordering::SeqCst)
    }

    pub fn terminations(&self) -> usize {
        self.terminations.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl OcrEngine for StubOcr {
    async fn initialize(&self) -> Result<()> {
        self.initializations.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn recognize(&self, _image: &[u8]) -> Result<OcrOutput> {
        self.recognitions.fetch_add(1, Ordering::SeqCst);
        Ok(OcrOutput {
            text: self.text.clone(),
            confidence: self.confidence,
        })
    }

    async fn terminate(&self) -> Result<()> {
        self.terminations.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn name(&self) -> &str {
        "stub"
    }
}

/// OCR engine whose recognition always fails
#[derive(Debug, Default)]
pub struct FailingOcr;

#[async_trait]
impl OcrEngine for FailingOcr {
    async fn initialize(&self) -> Result<()> {
        Ok(())
    }

    async fn recognize(&self, _image: &[u8]) -> Result<OcrOutput> {
        bail!("recognizer crashed")
    }

    async fn terminate(&self) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        "failing"
    }
}

/// OCR engine that cannot be initialized
#[derive(Debug, Default)]
pub struct UnavailableOcr;

#[async_trait]
impl OcrEngine for UnavailableOcr {
    async fn initialize(&self) -> Result<()> {
        bail!("model files missing")
    }

    async fn recognize(&self, _image: &[u8]) -> Result<OcrOutput> {
        bail!("not initialized")
    }

    async fn terminate(&self) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        "unavailable"
    }
}

/// Stub OCR that parks inside `recognize` until released
#[derive(Debug)]
pub struct GatedOcr {
    inner: StubOcr,
    /// Notified once recognition has started
    pub entered: Notify,
    /// Notify to let recognition finish
    pub release: Notify,
}

impl GatedOcr {
    pub fn new(text: &str, confidence: f32) -> Self {
        Self {
            inner: StubOcr::new(text, confidence),
            entered: Notify::new(),
            release: Notify::new(),
        }
    }
}

#[async_trait]
impl OcrEngine for GatedOcr {
    async fn initialize(&self) -> Result<()> {
        self.inner.initialize().await
    }

    async fn recognize(&self, image: &[u8]) -> Result<OcrOutput> {
        self.entered.notify_one();
        self.release.notified().await;
        self.inner.recognize(image).await
    }

    async fn terminate(&self) -> Result<()> {
        self.inner.terminate().await
    }

    fn name(&self) -> &str {
        "gated"
    }
}

/// Correlation engine that always reports the same score
#[derive(Debug, Clone, Copy)]
pub struct FixedCorrelator(pub f32);

#[async_trait]
impl CorrelationEngine for FixedCorrelator {
    async fn match_template(&self, _source: GrayImage, _template: GrayImage) -> Result<f32> {
        Ok(self.0)
    }

    fn name(&self) -> &str {
        "fixed"
    }
}
