//! Template matching against a reference document layout
//!
//! Both images are downscaled to a bounded size, converted to grayscale and
//! handed to a [`CorrelationEngine`]. Any failure along the way degrades to a
//! zero-confidence non-match instead of aborting the run.

use anyhow::{bail, Result};
use serde::Serialize;
use std::time::Instant;
use tracing::{debug, warn};

use super::correlation::CorrelationEngine;
use super::frame::PixelBuffer;
use crate::config::MatchSettings;

/// Outcome of comparing the document against its template
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateMatchResult {
    /// Whether the confidence exceeded the match threshold
    pub is_match: bool,
    /// Best correlation score, clamped to [0, 1]
    pub confidence: f32,
    /// Human-readable summary
    pub details: String,
}

impl TemplateMatchResult {
    /// Zero-confidence result for a matching attempt that could not complete
    pub fn failed(reason: impl std::fmt::Display) -> Self {
        Self {
            is_match: false,
            confidence: 0.0,
            details: format!("Template matching failed: {}", reason),
        }
    }
}

/// Compares an ID image against a reference template
#[derive(Debug, Clone)]
pub struct TemplateMatcher {
    settings: MatchSettings,
}

impl TemplateMatcher {
    pub fn new(settings: MatchSettings) -> Self {
        Self { settings }
    }

    /// Match `document` against `template`. Never fails; both buffers are
    /// consumed and released on every path.
    pub async fn match_images(
        &self,
        engine: &dyn CorrelationEngine,
        document: PixelBuffer,
        template: PixelBuffer,
    ) -> TemplateMatchResult {
        let start = Instant::now();

        match self.correlate(engine, document, template).await {
            Ok(score) => {
                let confidence = score.clamp(0.0, 1.0);
                let is_match = confidence > self.settings.match_threshold;
                debug!(
                    "Template match via {} in {:?}: raw score {:.4}",
                    engine.name(),
                    start.elapsed(),
                    score
                );

                TemplateMatchResult {
                    is_match,
                    confidence,
                    details: describe_match(confidence, is_match),
                }
            }
            Err(e) => {
                warn!("Template matching degraded: {:#}", e);
                TemplateMatchResult::failed(e)
            }
        }
    }

    async fn correlate(
        &self,
        engine: &dyn CorrelationEngine,
        document: PixelBuffer,
        template: PixelBuffer,
    ) -> Result<f32> {
        if document.is_empty() || template.is_empty() {
            bail!("image has zero area");
        }

        let source = document.downscale_to_fit(self.settings.max_dimension).to_grayscale();
        let template = template.downscale_to_fit(self.settings.max_dimension).to_grayscale();

        if template.width() > source.width() || template.height() > source.height() {
            bail!(
                "template ({}x{}) is larger than the document ({}x{}) after resizing",
                template.width(),
                template.height(),
                source.width(),
                source.height()
            );
        }

        let score = engine.match_template(source, template).await?;
        if !score.is_finite() {
            bail!("correlation engine returned a non-finite score");
        }
        Ok(score)
    }
}

impl Default for TemplateMatcher {
    fn default() -> Self {
        Self::new(MatchSettings::default())
    }
}

fn describe_match(confidence: f32, is_match: bool) -> String {
    if is_match {
        format!(
            "Template match confidence: {:.1}% - document layout matches the template",
            confidence * 100.0
        )
    } else {
        format!(
            "Template match confidence: {:.1}% - document layout does not match the template",
            confidence * 100.0
        )
    }
}
