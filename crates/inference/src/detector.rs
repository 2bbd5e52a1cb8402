use crate::backend::InferenceBackend;
use crate::errors::PipelineError;
use fusion::{Decoder, DenominationTable, Detection, FusionError};
use preprocess::{CpuPreProcessor, Preprocess};
use std::fmt;
use std::path::PathBuf;

/// Which of the deployed detectors a model is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelKind {
    /// Trained on banknotes and coins together.
    General,
    /// Specialised on coins.
    Coin,
}

impl ModelKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelKind::General => "general",
            ModelKind::Coin => "coin",
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything needed to bring one detector up.
#[derive(Debug, Clone)]
pub struct ModelSpec {
    pub kind: ModelKind,
    pub path: PathBuf,
    pub input_size: u32,
    pub table: DenominationTable,
}

/// How hard to try when a model fails to load.
#[derive(Debug, Clone, Copy)]
pub struct LoadRetry {
    pub attempts: u32,
    pub base_delay_ms: u64,
}

impl Default for LoadRetry {
    fn default() -> Self {
        Self {
            attempts: 3,
            base_delay_ms: 200,
        }
    }
}

/// One model together with the input and output transforms it was trained
/// with. Both deployed detectors are instances of this type.
pub struct LabeledDetector<B> {
    kind: ModelKind,
    backend: B,
    preprocessor: CpuPreProcessor,
    decoder: Decoder,
}

impl<B: InferenceBackend> LabeledDetector<B> {
    pub fn new(kind: ModelKind, backend: B, input_size: u32, decoder: Decoder) -> Self {
        Self {
            kind,
            backend,
            preprocessor: CpuPreProcessor::new(input_size),
            decoder,
        }
    }

    /// Acquire the model behind `spec`, retrying transient load failures.
    pub fn load(
        spec: &ModelSpec,
        confidence_threshold: f32,
        retry: LoadRetry,
    ) -> Result<Self, PipelineError> {
        let operation = format!("Loading {} model", spec.kind);

        let backend = common::retry_with_backoff(
            || B::load_model(&spec.path),
            retry.attempts,
            retry.base_delay_ms,
            &operation,
        )
        .map_err(|e| {
            PipelineError::ModelUnavailable(format!(
                "{} model at {}: {e}",
                spec.kind,
                spec.path.display()
            ))
        })?;

        tracing::info!(
            model = %spec.kind,
            path = %spec.path.display(),
            input_size = spec.input_size,
            classes = spec.table.len(),
            "Detector ready"
        );

        let decoder =
            Decoder::new(spec.table.clone()).with_confidence_threshold(confidence_threshold);
        Ok(Self::new(spec.kind, backend, spec.input_size, decoder))
    }

    pub fn kind(&self) -> ModelKind {
        self.kind
    }

    pub fn input_size(&self) -> u32 {
        self.preprocessor.input_size()
    }

    /// Preprocess, run the model and decode its output for one RGB frame.
    pub fn detect(
        &mut self,
        pixels: &[u8],
        width: u32,
        height: u32,
    ) -> Result<Vec<Detection>, PipelineError> {
        let _span = tracing::debug_span!("detect", model = %self.kind).entered();

        let input = self.preprocessor.preprocess(pixels, width, height)?;

        let output = {
            let _infer_span = tracing::debug_span!("model_inference").entered();
            self.backend
                .infer(&input)
                .map_err(|source| PipelineError::Inference {
                    model: self.kind,
                    source,
                })?
        };

        self.decoder
            .decode(&output.view())
            .map_err(|err| match err {
                FusionError::MalformedOutputTensor { shape } => {
                    PipelineError::MalformedOutputTensor {
                        model: self.kind,
                        shape,
                    }
                }
                other => PipelineError::Inference {
                    model: self.kind,
                    source: other.into(),
                },
            })
    }
}
