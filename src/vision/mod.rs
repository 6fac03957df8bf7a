//! Vision Layer
//!
//! Image decoding, quality gating, template matching and text recognition.
//! Correlation and OCR are delegated to engine traits so backends can be
//! swapped out:
//! - Tesseract (bundled OCR backend)
//! - CPU normalized cross-correlation (bundled correlation backend)

pub mod correlation;
pub mod frame;
pub mod matcher;
pub mod ocr;
pub mod quality;
pub mod tesseract_ocr;

pub use correlation::{CorrelationEngine, NccCorrelator};
pub use frame::PixelBuffer;
pub use matcher::{TemplateMatchResult, TemplateMatcher};
pub use ocr::{OcrEngine, OcrOutput};
pub use quality::{QualityGate, QualityReport};
pub use tesseract_ocr::TesseractOcr;
