//! Error types for the verification pipeline

use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, VerifyError>;

/// Which of the two pipeline inputs an error refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InputKind {
    /// The identity document being verified
    IdDocument,
    /// The reference layout template
    Template,
}

impl std::fmt::Display for InputKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InputKind::IdDocument => write!(f, "ID document"),
            InputKind::Template => write!(f, "template"),
        }
    }
}

/// Errors that abort a verification run
///
/// Template matching and text extraction never surface here: they degrade to
/// zero-confidence results instead.
#[derive(Error, Debug)]
pub enum VerifyError {
    #[error("Verification engines are not initialized")]
    NotInitialized,

    #[error("Missing input image: {}", join_kinds(.0))]
    MissingInput(Vec<InputKind>),

    #[error("A verification run is already in progress")]
    AlreadyRunning,

    #[error("Image quality too low for verification (edge ratio {edge_ratio:.3}, minimum {min_edge_ratio:.3})")]
    LowQualityImage { edge_ratio: f32, min_edge_ratio: f32 },

    #[error("Failed to decode {kind} image: {source}")]
    Decode {
        kind: InputKind,
        #[source]
        source: image::ImageError,
    },

    #[error("Verification run was cancelled")]
    Cancelled,

    #[error("Engine initialization failed: {0}")]
    EngineInit(String),
}

impl VerifyError {
    pub fn engine_init<S: Into<String>>(msg: S) -> Self {
        Self::EngineInit(msg.into())
    }
}

fn join_kinds(kinds: &[InputKind]) -> String {
    kinds
        .iter()
        .map(|k| k.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_input_message_lists_every_input() {
        let err = VerifyError::MissingInput(vec![InputKind::IdDocument, InputKind::Template]);
        assert_eq!(err.to_string(), "Missing input image: ID document, template");
    }

    #[test]
    fn test_low_quality_message() {
        let err = VerifyError::LowQualityImage {
            edge_ratio: 0.05,
            min_edge_ratio: 0.1,
        };
        assert!(err.to_string().contains("0.050"));
        assert!(err.to_string().contains("0.100"));
    }
}
