use super::InferenceBackend;
use memmap2::Mmap;
use ndarray::{Array, ArrayD, IxDyn};
use ort::{
    session::{
        Session,
        builder::{GraphOptimizationLevel, SessionBuilder},
    },
    value::TensorRef,
};
use std::fs::File;
use std::path::Path;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionProvider {
    #[default]
    Cpu,
    Cuda,
}

impl FromStr for ExecutionProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cpu" => Ok(ExecutionProvider::Cpu),
            "cuda" | "gpu" => Ok(ExecutionProvider::Cuda),
            other => anyhow::bail!("Unknown execution provider: {other}"),
        }
    }
}

pub struct OrtBackend {
    session: Session,
}

impl OrtBackend {
    /// Load model with specified execution provider
    ///
    /// The model file is memory-mapped read-only and the session is built
    /// from the mapped bytes.
    pub fn load_model_with_provider(
        path: &Path,
        provider: ExecutionProvider,
    ) -> anyhow::Result<Self> {
        // Initialize ORT environment (idempotent)
        let _ = ort::init().commit();

        let file = File::open(path)?;
        // SAFETY: mapped read-only; model files are not rewritten while loaded.
        let weights = unsafe { Mmap::map(&file)? };

        let builder = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(4)?;

        let builder = match provider {
            ExecutionProvider::Cuda => with_cuda(builder)?,
            ExecutionProvider::Cpu => {
                tracing::info!("Initializing ONNX Runtime with CPU execution provider");
                builder
            }
        };

        let session = builder.commit_from_memory(&weights)?;

        tracing::info!(
            path = %path.display(),
            bytes = weights.len(),
            provider = ?provider,
            "Model loaded"
        );
        Ok(Self { session })
    }
}

#[cfg(feature = "cuda")]
fn with_cuda(builder: SessionBuilder) -> anyhow::Result<SessionBuilder> {
    tracing::info!("Initializing ONNX Runtime with CUDA execution provider");
    Ok(builder.with_execution_providers([
        ort::execution_providers::CUDAExecutionProvider::default()
            .with_device_id(0)
            .build()
            .error_on_failure(),
    ])?)
}

#[cfg(not(feature = "cuda"))]
fn with_cuda(builder: SessionBuilder) -> anyhow::Result<SessionBuilder> {
    tracing::warn!("CUDA requested but the `cuda` feature is disabled, falling back to CPU");
    Ok(builder)
}

impl InferenceBackend for OrtBackend {
    fn load_model(path: &Path) -> anyhow::Result<Self> {
        let provider = common::env_or("EXECUTION_PROVIDER", ExecutionProvider::Cpu);
        Self::load_model_with_provider(path, provider)
    }

    fn infer(&mut self, input: &Array<f32, IxDyn>) -> anyhow::Result<ArrayD<f32>> {
        let outputs = self
            .session
            .run(ort::inputs![TensorRef::from_array_view(input.view())?])?;

        let raw = outputs[0].try_extract_array::<f32>()?;
        tracing::trace!(shape = ?raw.shape(), "Model output");

        Ok(raw.into_owned())
    }
}
