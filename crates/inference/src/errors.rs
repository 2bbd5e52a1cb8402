use crate::detector::ModelKind;
use preprocess::PreprocessError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Invalid image: {0}")]
    InvalidImage(String),

    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),

    #[error("Malformed output tensor from {model} model: {shape:?}")]
    MalformedOutputTensor { model: ModelKind, shape: Vec<usize> },

    #[error("Preprocessing failed: {0}")]
    Preprocess(PreprocessError),

    #[error("Inference failed on {model} model: {source}")]
    Inference {
        model: ModelKind,
        #[source]
        source: anyhow::Error,
    },

    #[error("{model} detector panicked")]
    DetectorPanicked { model: ModelKind },

    #[error("No model produced usable output ({failures} failed)")]
    NoModelOutput {
        failures: usize,
        #[source]
        last: Box<PipelineError>,
    },
}

impl PipelineError {
    /// Whether this failure only invalidates one model's contribution, as
    /// opposed to the whole run.
    pub fn is_per_model(&self) -> bool {
        matches!(
            self,
            PipelineError::MalformedOutputTensor { .. }
                | PipelineError::Inference { .. }
                | PipelineError::DetectorPanicked { .. }
                | PipelineError::Preprocess(_)
        )
    }
}

impl From<PreprocessError> for PipelineError {
    fn from(err: PreprocessError) -> Self {
        match err {
            PreprocessError::InvalidImage { .. } | PreprocessError::BufferSizeMismatch { .. } => {
                PipelineError::InvalidImage(err.to_string())
            }
            other => PipelineError::Preprocess(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_formatting() {
        let err = PipelineError::MalformedOutputTensor {
            model: ModelKind::Coin,
            shape: vec![1, 300, 4],
        };
        assert_eq!(
            err.to_string(),
            "Malformed output tensor from coin model: [1, 300, 4]"
        );

        let err = PipelineError::Inference {
            model: ModelKind::General,
            source: anyhow::anyhow!("session poisoned"),
        };
        assert_eq!(
            err.to_string(),
            "Inference failed on general model: session poisoned"
        );

        let err = PipelineError::NoModelOutput {
            failures: 2,
            last: Box::new(PipelineError::DetectorPanicked {
                model: ModelKind::Coin,
            }),
        };
        assert_eq!(err.to_string(), "No model produced usable output (2 failed)");
        let source = std::error::Error::source(&err).map(ToString::to_string);
        assert_eq!(source.as_deref(), Some("coin detector panicked"));
    }

    #[test]
    fn test_invalid_preprocess_input_maps_to_invalid_image() {
        let err: PipelineError = PreprocessError::InvalidImage {
            width: 0,
            height: 480,
        }
        .into();
        assert!(matches!(err, PipelineError::InvalidImage(_)));
        assert!(!err.is_per_model());

        let err: PipelineError = PreprocessError::BufferSizeMismatch {
            expected: 12,
            actual: 10,
        }
        .into();
        assert!(matches!(err, PipelineError::InvalidImage(_)));
    }

    #[test]
    fn test_per_model_classification() {
        assert!(
            PipelineError::DetectorPanicked {
                model: ModelKind::General
            }
            .is_per_model()
        );
        assert!(!PipelineError::ModelUnavailable("x".to_string()).is_per_model());
        assert!(
            !PipelineError::NoModelOutput {
                failures: 1,
                last: Box::new(PipelineError::ModelUnavailable("x".to_string())),
            }
            .is_per_model()
        );
    }
}
