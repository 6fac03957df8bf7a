//! Tesseract OCR backend
//!
//! Runs an installed `tesseract` executable, feeding image bytes on stdin and
//! reading word-level TSV from stdout. Words are regrouped into lines so the
//! field extractor sees the same line structure as the printed document.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, info};

use super::ocr::{OcrEngine, OcrOutput};
use crate::config::OcrSettings;

/// TSV row level for individual words
const WORD_LEVEL: u32 = 5;

/// Tesseract command-line engine wrapper
pub struct TesseractOcr {
    settings: OcrSettings,
    ready: AtomicBool,
}

impl TesseractOcr {
    /// Create a new engine; nothing is executed until `initialize`
    pub fn new(settings: OcrSettings) -> Self {
        Self {
            settings,
            ready: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl OcrEngine for TesseractOcr {
    async fn initialize(&self) -> Result<()> {
        if self.ready.load(Ordering::Acquire) {
            return Ok(());
        }

        info!("Initializing Tesseract OCR ({})", self.settings.binary);

        let output = Command::new(&self.settings.binary)
            .arg("--version")
            .output()
            .await
            .with_context(|| format!("Failed to run {}", self.settings.binary))?;

        if !output.status.success() {
            bail!("{} --version exited with {}", self.settings.binary, output.status);
        }

        // Older releases print the version banner on stderr
        let banner = if output.stdout.is_empty() { &output.stderr } else { &output.stdout };
        let version = String::from_utf8_lossy(banner);
        info!(
            "Tesseract OCR initialized: {} (language: {})",
            version.lines().next().unwrap_or("unknown version"),
            self.settings.language
        );

        self.ready.store(true, Ordering::Release);
        Ok(())
    }

    async fn recognize(&self, image: &[u8]) -> Result<OcrOutput> {
        if !self.ready.load(Ordering::Acquire) {
            bail!("Tesseract OCR is not initialized");
        }
        if image.is_empty() {
            return Ok(OcrOutput::default());
        }

        let mut child = Command::new(&self.settings.binary)
            .args(["stdin", "stdout", "-l", self.settings.language.as_str(), "tsv"])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("Failed to start {}", self.settings.binary))?;

        let mut stdin = child.stdin.take().context("Tesseract stdin unavailable")?;
        let data = image.to_vec();
        let writer = tokio::spawn(async move {
            stdin.write_all(&data).await?;
            stdin.shutdown().await
        });

        let timeout = Duration::from_secs(self.settings.timeout_secs.max(1));
        let output = tokio::time::timeout(timeout, child.wait_with_output())
            .await
            .with_context(|| format!("Tesseract timed out after {:?}", timeout))?
            .context("Failed to wait for Tesseract")?;

        if !output.status.success() {
            bail!(
                "Tesseract exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        writer
            .await
            .context("Tesseract stdin writer panicked")?
            .context("Failed to write image to Tesseract")?;

        let result = parse_tsv(&String::from_utf8_lossy(&output.stdout));
        debug!(
            "Tesseract: {} chars, confidence {:.1}",
            result.text.len(),
            result.confidence
        );
        Ok(result)
    }

    async fn terminate(&self) -> Result<()> {
        if self.ready.swap(false, Ordering::AcqRel) {
            info!("Tesseract OCR released");
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "tesseract"
    }
}

/// Rebuild line-structured text and a mean word confidence from Tesseract TSV
pub fn parse_tsv(tsv: &str) -> OcrOutput {
    let mut lines: Vec<((u32, u32, u32, u32), Vec<&str>)> = Vec::new();
    let mut conf_sum = 0.0f64;
    let mut conf_count = 0usize;

    for row in tsv.lines() {
        let cols: Vec<&str> = row.split('\t').collect();
        if cols.len() < 12 {
            continue;
        }
        let Ok(level) = cols[0].parse::<u32>() else {
            // Header row
            continue;
        };
        if level != WORD_LEVEL {
            continue;
        }

        let text = cols[11].trim();
        if text.is_empty() {
            continue;
        }

        let field = |i: usize| cols[i].parse::<u32>().unwrap_or(0);
        let key = (field(1), field(2), field(3), field(4));

        if let Ok(conf) = cols[10].trim().parse::<f64>() {
            if conf >= 0.0 {
                conf_sum += conf;
                conf_count += 1;
            }
        }

        if let Some((last_key, words)) = lines.last_mut() {
            if *last_key == key {
                words.push(text);
                continue;
            }
        }
        lines.push((key, vec![text]));
    }

    let text = lines
        .iter()
        .map(|(_, words)| words.join(" "))
        .collect::<Vec<_>>()
        .join("\n");

    let confidence = if conf_count > 0 {
        (conf_sum / conf_count as f64) as f32
    } else {
        0.0
    };

    OcrOutput { text, confidence }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str =
        "level\tpage_num\tblock_num\tpar_num\tline_num\tword_num\tleft\ttop\twidth\theight\tconf\ttext";

    fn word(block: u32, line: u32, word: u32, conf: &str, text: &str) -> String {
        format!("5\t1\t{block}\t1\t{line}\t{word}\t0\t0\t10\t10\t{conf}\t{text}")
    }

    #[test]
    fn test_parse_tsv_groups_words_into_lines() {
        let tsv = [
            HEADER.to_string(),
            "1\t1\t0\t0\t0\t0\t0\t0\t640\t480\t-1\t".to_string(),
            "4\t1\t1\t1\t1\t0\t0\t0\t100\t10\t-1\t".to_string(),
            word(1, 1, 1, "90", "Name:"),
            word(1, 1, 2, "80", "John"),
            word(1, 1, 3, "70", "Smith"),
            word(1, 2, 1, "60", "DOB"),
            word(2, 1, 1, "100", "01/01/1990"),
        ]
        .join("\n");

        let output = parse_tsv(&tsv);
        assert_eq!(output.text, "Name: John Smith\nDOB\n01/01/1990");
        assert!((output.confidence - 80.0).abs() < 1e-4);
    }

    #[test]
    fn test_parse_tsv_ignores_negative_confidence_and_blank_words() {
        let tsv = [
            HEADER.to_string(),
            word(1, 1, 1, "-1", " "),
            word(1, 1, 2, "50", "CLASS"),
            word(1, 1, 3, "-1", "C"),
        ]
        .join("\n");

        let output = parse_tsv(&tsv);
        assert_eq!(output.text, "CLASS C");
        assert!((output.confidence - 50.0).abs() < 1e-4);
    }

    #[test]
    fn test_parse_empty_tsv() {
        let output = parse_tsv(HEADER);
        assert_eq!(output, OcrOutput::default());
    }

    #[tokio::test]
    async fn test_recognize_requires_initialize() {
        let engine = TesseractOcr::new(OcrSettings::default());
        assert!(engine.recognize(b"bytes").await.is_err());
    }

    #[tokio::test]
    async fn test_missing_binary_fails_initialize() {
        let engine = TesseractOcr::new(OcrSettings {
            binary: "/nonexistent/tesseract-binary".to_string(),
            ..OcrSettings::default()
        });
        assert!(engine.initialize().await.is_err());
    }
}
