//! Image quality gate
//!
//! Cheap sharpness estimate: resample to a fixed analysis square, then count
//! high-contrast transitions between horizontally adjacent pixels. Blurry or
//! featureless captures have few of them. This is a heuristic, not a
//! frequency-domain blur metric.

use tracing::debug;

use super::frame::PixelBuffer;
use crate::config::QualitySettings;
use crate::error::{Result, VerifyError};

/// Measurements from one quality check
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QualityReport {
    /// Pairs whose luminance difference exceeded the edge threshold
    pub edge_count: u64,
    /// Horizontally adjacent pairs examined
    pub pairs_examined: u64,
    /// edge_count / pairs_examined
    pub edge_ratio: f32,
}

/// Rejects images that are too blurry for reliable verification
#[derive(Debug, Clone)]
pub struct QualityGate {
    settings: QualitySettings,
}

impl QualityGate {
    pub fn new(settings: QualitySettings) -> Self {
        Self { settings }
    }

    /// Measure the edge ratio without accepting or rejecting
    pub fn assess(&self, image: &PixelBuffer) -> QualityReport {
        let size = self.settings.analysis_size.max(2);
        let gray = image.sample_exact(size, size).to_grayscale();
        let threshold = self.settings.edge_threshold;

        let mut edge_count = 0u64;
        let mut pairs_examined = 0u64;

        for row in gray.rows() {
            let row: Vec<u8> = row.map(|p| p.0[0]).collect();
            for pair in row.windows(2) {
                pairs_examined += 1;
                if pair[0].abs_diff(pair[1]) > threshold {
                    edge_count += 1;
                }
            }
        }

        let edge_ratio = if pairs_examined > 0 {
            edge_count as f32 / pairs_examined as f32
        } else {
            0.0
        };

        QualityReport {
            edge_count,
            pairs_examined,
            edge_ratio,
        }
    }

    /// Accept the image or fail with `LowQualityImage`
    pub fn check(&self, image: &PixelBuffer) -> Result<QualityReport> {
        let report = self.assess(image);
        debug!(
            "Quality gate: {} edges in {} pairs (ratio {:.4})",
            report.edge_count, report.pairs_examined, report.edge_ratio
        );

        if report.edge_ratio < self.settings.min_edge_ratio {
            return Err(VerifyError::LowQualityImage {
                edge_ratio: report.edge_ratio,
                min_edge_ratio: self.settings.min_edge_ratio,
            });
        }

        Ok(report)
    }
}

impl Default for QualityGate {
    fn default() -> Self {
        Self::new(QualitySettings::default())
    }
}
