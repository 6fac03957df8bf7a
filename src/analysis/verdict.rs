//! Verdict aggregation
//!
//! A forged document might pass the layout check or the text check, so a valid
//! verdict needs both, and the two confidences are weighted equally.

use serde::Serialize;

use super::fields::TextExtractionResult;
use crate::vision::matcher::TemplateMatchResult;

/// Final pass/fail judgment
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverallVerdict {
    /// Template matched and at least one field label was found
    pub is_valid: bool,
    /// Mean of the template and text confidences, in [0, 1]
    pub confidence: f32,
}

/// Everything a completed verification run produces
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationResult {
    pub template_match: TemplateMatchResult,
    pub text_extraction: TextExtractionResult,
    pub overall: OverallVerdict,
}

impl VerificationResult {
    /// Combine stage outputs into a result with its verdict
    pub fn new(template_match: TemplateMatchResult, text_extraction: TextExtractionResult) -> Self {
        let overall = aggregate(&template_match, &text_extraction);
        Self {
            template_match,
            text_extraction,
            overall,
        }
    }
}

/// Derive the overall verdict from the two independent signals
pub fn aggregate(
    template_match: &TemplateMatchResult,
    text_extraction: &TextExtractionResult,
) -> OverallVerdict {
    let is_valid = template_match.is_match && !text_extraction.extracted_labels.is_empty();
    let confidence =
        ((template_match.confidence + text_extraction.confidence) / 2.0).clamp(0.0, 1.0);

    OverallVerdict {
        is_valid,
        confidence,
    }
}
