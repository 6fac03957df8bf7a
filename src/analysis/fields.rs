//! Field extraction from recognized document text
//!
//! OCR output is noisy (missing punctuation, inconsistent casing, broken
//! lines), so fields are found by a permissive phrase scan rather than strict
//! parsing. A label's value is the text after it on the same line or, failing
//! that, the whole next line.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::time::Instant;
use tracing::{debug, warn};

use super::labels::find_labels;
use crate::vision::ocr::OcrEngine;

/// Labels and values recovered from a document's text
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TextExtractionResult {
    /// Canonical labels found, deduplicated and sorted
    pub extracted_labels: Vec<String>,
    /// One value per label; a later match overwrites an earlier one
    pub extracted_data: BTreeMap<String, String>,
    /// OCR confidence normalized to [0, 1]
    pub confidence: f32,
    /// Human-readable summary
    pub details: String,
}

impl TextExtractionResult {
    /// Empty zero-confidence result for an extraction that could not run
    pub fn failed(reason: impl std::fmt::Display) -> Self {
        Self {
            extracted_labels: Vec::new(),
            extracted_data: BTreeMap::new(),
            confidence: 0.0,
            details: format!("Text extraction failed: {}", reason),
        }
    }
}

/// Normalize a 0-100 OCR confidence to [0, 1]
pub fn normalize_ocr_confidence(raw: f32) -> f32 {
    if raw.is_nan() {
        return 0.0;
    }
    (raw / 100.0).clamp(0.0, 1.0)
}

/// Runs OCR and maps the text onto the label dictionary
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldExtractor;

impl FieldExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Recognize `image` and extract fields. Never fails: OCR errors degrade
    /// to an empty result.
    pub async fn extract(&self, engine: &dyn OcrEngine, image: &[u8]) -> TextExtractionResult {
        let start = Instant::now();

        match engine.recognize(image).await {
            Ok(output) => {
                debug!(
                    "OCR via {} in {:?}: {} chars, confidence {:.1}",
                    engine.name(),
                    start.elapsed(),
                    output.text.chars().count(),
                    output.confidence
                );
                self.extract_from_text(&output.text, output.confidence)
            }
            Err(e) => {
                warn!("Text extraction degraded: {:#}", e);
                TextExtractionResult::failed(e)
            }
        }
    }

    /// Extract fields from already-recognized text.
    /// `ocr_confidence` is on the engine's 0-100 scale.
    pub fn extract_from_text(&self, text: &str, ocr_confidence: f32) -> TextExtractionResult {
        let confidence = normalize_ocr_confidence(ocr_confidence);

        let lines: Vec<&str> = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();

        let mut found = BTreeSet::new();
        let mut data = BTreeMap::new();

        for (i, line) in lines.iter().enumerate() {
            for hit in find_labels(line) {
                debug!("Line {}: {} (matched '{}')", i, hit.label(), hit.phrase());
                found.insert(hit.label().to_string());

                let value = hit
                    .inline_value(line)
                    .or_else(|| lines.get(i + 1).map(|next| next.to_string()));

                if let Some(value) = value {
                    data.insert(hit.label().to_string(), value);
                }
            }
        }

        let extracted_labels: Vec<String> = found.into_iter().collect();
        let details = format!(
            "Extracted {} characters with {:.1}% OCR confidence. Found {} field label(s).",
            text.chars().count(),
            confidence * 100.0,
            extracted_labels.len()
        );

        TextExtractionResult {
            extracted_labels,
            extracted_data: data,
            confidence,
            details,
        }
    }
}
