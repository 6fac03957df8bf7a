//! OCR (Optical Character Recognition) engine interface
//!
//! Engines are large external components, so the pipeline talks to them only
//! through this trait. The bundled implementation drives Tesseract.

use anyhow::Result;
use async_trait::async_trait;

/// Text recognized in one image
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OcrOutput {
    /// Recognized text, lines separated by '\n'
    pub text: String,
    /// Recognition confidence on a 0-100 scale
    pub confidence: f32,
}

/// Recognizes text in encoded image bytes
#[async_trait]
pub trait OcrEngine: Send + Sync {
    /// Load models / verify the engine is available. Called once before first use.
    async fn initialize(&self) -> Result<()>;

    /// Run recognition on raw image bytes (PNG, JPEG, ...)
    async fn recognize(&self, image: &[u8]) -> Result<OcrOutput>;

    /// Release engine resources. Called once at teardown.
    async fn terminate(&self) -> Result<()>;

    /// Engine name for logging
    fn name(&self) -> &str;
}
