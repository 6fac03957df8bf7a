//! Verification Pipeline
//!
//! Owns the engines and runs one verification at a time:
//! quality gate, image loading, template matching, text extraction, verdict.

pub mod messages;
pub mod state;

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::analysis::{FieldExtractor, VerificationResult};
use crate::config::VerifierConfig;
use crate::error::{InputKind, Result, VerifyError};
use crate::vision::{CorrelationEngine, OcrEngine, PixelBuffer, QualityGate, TemplateMatcher};

pub use messages::{ProgressEvent, ProgressReporter, ProgressStage};
pub use state::PipelineState;
use state::RunGuard;

/// Per-run options
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Progress observer
    pub progress: ProgressReporter,
    /// Checked between stages; a stage already underway runs to completion
    pub cancel: Option<CancellationToken>,
}

impl RunOptions {
    pub fn with_progress(mut self, sender: crossbeam_channel::Sender<ProgressEvent>) -> Self {
        self.progress = ProgressReporter::new(Some(sender));
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    fn checkpoint(&self) -> Result<()> {
        match &self.cancel {
            Some(token) if token.is_cancelled() => Err(VerifyError::Cancelled),
            _ => Ok(()),
        }
    }
}

/// ID document verification orchestrator
pub struct VerificationPipeline {
    config: VerifierConfig,
    ocr: Arc<dyn OcrEngine>,
    correlator: Arc<dyn CorrelationEngine>,
    quality_gate: QualityGate,
    matcher: TemplateMatcher,
    extractor: FieldExtractor,
    state: Mutex<PipelineState>,
    /// Serializes engine initialization and teardown
    lifecycle: tokio::sync::Mutex<()>,
}

impl VerificationPipeline {
    pub fn new(
        config: VerifierConfig,
        ocr: Arc<dyn OcrEngine>,
        correlator: Arc<dyn CorrelationEngine>,
    ) -> Self {
        Self {
            quality_gate: QualityGate::new(config.quality.clone()),
            matcher: TemplateMatcher::new(config.matching.clone()),
            extractor: FieldExtractor::new(),
            config,
            ocr,
            correlator,
            state: Mutex::new(PipelineState::NotReady),
            lifecycle: tokio::sync::Mutex::new(()),
        }
    }

    pub fn state(&self) -> PipelineState {
        *self.state.lock()
    }

    /// Bring up the engines. Calling again once initialized is a no-op.
    pub async fn initialize(&self) -> Result<()> {
        let _lifecycle = self.lifecycle.lock().await;
        if self.state().is_initialized() {
            debug!("Engines already initialized");
            return Ok(());
        }

        info!(
            "Initializing engines (OCR: {}, correlation: {})",
            self.ocr.name(),
            self.correlator.name()
        );

        self.ocr.initialize().await.map_err(|e| {
            VerifyError::engine_init(format!("OCR engine '{}': {:#}", self.ocr.name(), e))
        })?;

        if let Err(e) = self.correlator.initialize().await {
            if let Err(term) = self.ocr.terminate().await {
                warn!("Failed to release OCR engine after init failure: {:#}", term);
            }
            return Err(VerifyError::engine_init(format!(
                "correlation engine '{}': {:#}",
                self.correlator.name(),
                e
            )));
        }

        *self.state.lock() = PipelineState::Ready;
        info!("Engines ready");
        Ok(())
    }

    /// Release engine resources. Refused while a run is in flight.
    pub async fn shutdown(&self) -> Result<()> {
        let _lifecycle = self.lifecycle.lock().await;
        {
            let mut state = self.state.lock();
            match *state {
                PipelineState::NotReady => return Ok(()),
                PipelineState::Running => return Err(VerifyError::AlreadyRunning),
                _ => *state = PipelineState::NotReady,
            }
        }

        if let Err(e) = self.ocr.terminate().await {
            warn!("OCR engine '{}' did not shut down cleanly: {:#}", self.ocr.name(), e);
        }
        info!("Engines released");
        Ok(())
    }

    /// Verify an ID document image against a template image
    pub async fn verify(&self, id_image: &[u8], template_image: &[u8]) -> Result<VerificationResult> {
        self.run(Some(id_image), Some(template_image), RunOptions::default())
            .await
    }

    /// Run the full pipeline on encoded images. An absent or empty input
    /// counts as missing.
    pub async fn run(
        &self,
        id_image: Option<&[u8]>,
        template_image: Option<&[u8]>,
        options: RunOptions,
    ) -> Result<VerificationResult> {
        if self.config.pipeline.auto_initialize && !self.state().is_initialized() {
            self.initialize().await?;
        }

        let (guard, id_image, template_image) = self.begin_run(id_image, template_image)?;
        let start = Instant::now();
        info!("Verification run started");

        match self.execute(id_image, template_image, &options).await {
            Ok(result) => {
                info!(
                    "Verification finished in {:?}: valid={}, confidence={:.2}",
                    start.elapsed(),
                    result.overall.is_valid,
                    result.overall.confidence
                );
                guard.complete();
                Ok(result)
            }
            Err(e) => {
                warn!("Verification run failed: {}", e);
                Err(e)
            }
        }
    }

    /// Check preconditions and enter Running atomically
    fn begin_run<'b>(
        &self,
        id_image: Option<&'b [u8]>,
        template_image: Option<&'b [u8]>,
    ) -> Result<(RunGuard<'_>, &'b [u8], &'b [u8])> {
        let mut state = self.state.lock();
        match *state {
            PipelineState::NotReady => return Err(VerifyError::NotInitialized),
            PipelineState::Running => return Err(VerifyError::AlreadyRunning),
            _ => {}
        }

        let id_image = id_image.filter(|b| !b.is_empty());
        let template_image = template_image.filter(|b| !b.is_empty());
        let (id_image, template_image) = match (id_image, template_image) {
            (Some(id), Some(template)) => (id, template),
            (id, template) => {
                let mut missing = Vec::new();
                if id.is_none() {
                    missing.push(InputKind::IdDocument);
                }
                if template.is_none() {
                    missing.push(InputKind::Template);
                }
                *state = PipelineState::Failed;
                return Err(VerifyError::MissingInput(missing));
            }
        };

        *state = PipelineState::Running;
        drop(state);
        Ok((RunGuard::new(&self.state), id_image, template_image))
    }

    async fn execute(
        &self,
        id_image: &[u8],
        template_image: &[u8],
        options: &RunOptions,
    ) -> Result<VerificationResult> {
        let progress = &options.progress;

        progress.report(ProgressStage::QualityCheck);
        options.checkpoint()?;
        let document = PixelBuffer::decode(id_image, InputKind::IdDocument)?;
        if self.config.quality.enabled {
            let report = self.quality_gate.check(&document)?;
            debug!("Quality gate passed (edge ratio {:.4})", report.edge_ratio);
        } else {
            debug!("Quality gate disabled");
        }

        progress.report(ProgressStage::Loading);
        options.checkpoint()?;
        let template = PixelBuffer::decode(template_image, InputKind::Template)?;
        debug!(
            "Loaded document {:?} and template {:?}",
            document.dimensions(),
            template.dimensions()
        );

        progress.report(ProgressStage::TemplateMatching);
        options.checkpoint()?;
        let template_match = self
            .matcher
            .match_images(self.correlator.as_ref(), document, template)
            .await;

        progress.report(ProgressStage::TextExtraction);
        options.checkpoint()?;
        let text_extraction = self.extractor.extract(self.ocr.as_ref(), id_image).await;

        progress.report(ProgressStage::Verdict);
        options.checkpoint()?;
        let result = VerificationResult::new(template_match, text_extraction);

        progress.report(ProgressStage::Complete);
        Ok(result)
    }
}
