//! Verifier Configuration
//!
//! Pipeline thresholds and engine settings stored in TOML format.

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Verifier settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VerifierConfig {
    /// Quality gate settings
    pub quality: QualitySettings,
    /// Template matching settings
    pub matching: MatchSettings,
    /// OCR engine settings
    pub ocr: OcrSettings,
    /// Orchestrator settings
    pub pipeline: PipelineSettings,
}

/// Blur/low-detail rejection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QualitySettings {
    /// Run the quality gate at all
    pub enabled: bool,
    /// Side of the square the image is resampled to before analysis
    pub analysis_size: u32,
    /// Minimum luminance difference (0-255) for a pair to count as an edge
    pub edge_threshold: u8,
    /// Images with a lower edge ratio are rejected
    pub min_edge_ratio: f32,
}

impl Default for QualitySettings {
    fn default() -> Self {
        Self {
            enabled: true,
            analysis_size: 400,
            edge_threshold: 30,
            min_edge_ratio: 0.1,
        }
    }
}

/// Template matching settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchSettings {
    /// Longer image side is downscaled to at most this many pixels
    pub max_dimension: u32,
    /// Correlation scores above this count as a match
    pub match_threshold: f32,
}

impl Default for MatchSettings {
    fn default() -> Self {
        Self {
            max_dimension: 800,
            match_threshold: 0.3,
        }
    }
}

/// Settings for the bundled Tesseract adapter
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrSettings {
    /// Tesseract executable name or path
    pub binary: String,
    /// Tesseract language pack (e.g., "eng")
    pub language: String,
    /// Maximum time a single recognition may take
    pub timeout_secs: u64,
}

impl Default for OcrSettings {
    fn default() -> Self {
        Self {
            binary: "tesseract".to_string(),
            language: "eng".to_string(),
            timeout_secs: 60,
        }
    }
}

/// Orchestrator settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    /// Initialize engines on the first run instead of failing with NotInitialized
    pub auto_initialize: bool,
}

/// Load configuration from file
pub fn load_config(path: &Path) -> Result<VerifierConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: VerifierConfig = toml::from_str(&content)?;
    Ok(config)
}

/// Save configuration to file
pub fn save_config(config: &VerifierConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}

/// Default location of the configuration file
pub fn default_config_path() -> Result<PathBuf> {
    let proj_dirs = directories::ProjectDirs::from("com", "idverifier", "IdVerifier")
        .ok_or_else(|| anyhow!("Could not determine config directory"))?;

    Ok(proj_dirs.config_dir().join("config.toml"))
}
