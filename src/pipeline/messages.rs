//! Progress messages emitted during a verification run

use crossbeam_channel::Sender;
use tracing::info;

/// Pipeline stages in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ProgressStage {
    QualityCheck,
    Loading,
    TemplateMatching,
    TextExtraction,
    Verdict,
    Complete,
}

impl ProgressStage {
    /// Percent complete when this stage starts
    pub fn percent(&self) -> u8 {
        match self {
            ProgressStage::QualityCheck => 5,
            ProgressStage::Loading => 10,
            ProgressStage::TemplateMatching => 30,
            ProgressStage::TextExtraction => 60,
            ProgressStage::Verdict => 90,
            ProgressStage::Complete => 100,
        }
    }

    /// Short description for display
    pub fn description(&self) -> &'static str {
        match self {
            ProgressStage::QualityCheck => "Checking image quality",
            ProgressStage::Loading => "Loading images",
            ProgressStage::TemplateMatching => "Matching against template",
            ProgressStage::TextExtraction => "Extracting text fields",
            ProgressStage::Verdict => "Computing verdict",
            ProgressStage::Complete => "Verification complete",
        }
    }
}

/// A progress notification sent before each stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressEvent {
    pub stage: ProgressStage,
    /// Stage description
    pub description: &'static str,
    /// Percent complete, 0-100
    pub percent: u8,
}

impl From<ProgressStage> for ProgressEvent {
    fn from(stage: ProgressStage) -> Self {
        Self {
            stage,
            description: stage.description(),
            percent: stage.percent(),
        }
    }
}

/// Sends progress events to an optional observer. Purely informational:
/// a missing or disconnected receiver never affects the run.
#[derive(Debug, Clone, Default)]
pub struct ProgressReporter {
    sender: Option<Sender<ProgressEvent>>,
}

impl ProgressReporter {
    pub fn new(sender: Option<Sender<ProgressEvent>>) -> Self {
        Self { sender }
    }

    pub fn report(&self, stage: ProgressStage) {
        info!("[{:>3}%] {}", stage.percent(), stage.description());
        if let Some(sender) = &self.sender {
            let _ = sender.send(stage.into());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;

    #[test]
    fn test_percentages_follow_stage_order() {
        let stages = [
            ProgressStage::QualityCheck,
            ProgressStage::Loading,
            ProgressStage::TemplateMatching,
            ProgressStage::TextExtraction,
            ProgressStage::Verdict,
            ProgressStage::Complete,
        ];
        let percents: Vec<u8> = stages.iter().map(|s| s.percent()).collect();
        assert_eq!(percents, [5, 10, 30, 60, 90, 100]);
    }

    #[test]
    fn test_reporter_sends_events() {
        let (tx, rx) = unbounded();
        let reporter = ProgressReporter::new(Some(tx));
        reporter.report(ProgressStage::Loading);

        let event = rx.try_recv().unwrap();
        assert_eq!(event.percent, 10);
        assert_eq!(event.description, "Loading images");
    }

    #[test]
    fn test_disconnected_receiver_is_ignored() {
        let (tx, rx) = unbounded();
        drop(rx);
        ProgressReporter::new(Some(tx)).report(ProgressStage::Complete);
        ProgressReporter::default().report(ProgressStage::Complete);
    }
}
