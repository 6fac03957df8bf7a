//! Analysis Layer
//!
//! Turns recognized text into labeled document fields and combines the
//! vision and text signals into a verdict.

pub mod fields;
pub mod labels;
pub mod verdict;

pub use fields::{FieldExtractor, TextExtractionResult};
pub use labels::{LabelEntry, LABELS};
pub use verdict::{aggregate, OverallVerdict, VerificationResult};
