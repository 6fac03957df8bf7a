//! IdVerifier - ID document verification
//!
//! Checks an identity document image against a reference layout template
//! and scans its text for standard field labels, then combines both signals
//! into a pass/fail verdict.

pub mod analysis;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod vision;

#[cfg(test)]
mod test_support;

pub use analysis::{OverallVerdict, TextExtractionResult, VerificationResult};
pub use config::VerifierConfig;
pub use error::{InputKind, Result, VerifyError};
pub use pipeline::{PipelineState, ProgressEvent, RunOptions, VerificationPipeline};
pub use vision::{
    CorrelationEngine, NccCorrelator, OcrEngine, OcrOutput, TemplateMatchResult, TesseractOcr,
};
