use crate::detector::{LoadRetry, ModelKind, ModelSpec};
use common::env_or;
use fusion::{DEFAULT_CONFIDENCE_THRESHOLD, DEFAULT_IOU_THRESHOLD, DenominationTable, Locale};
use std::env;
use std::path::PathBuf;

pub use common::Environment;

/// Both detectors were exported at this resolution.
const DEFAULT_MODEL_INPUT_SIZE: u32 = 832;

/// Knobs shared by every detector and by the fusion stage.
#[derive(Debug, Clone)]
pub struct FusionSettings {
    pub confidence_threshold: f32,
    pub iou_threshold: f32,
    pub locale: Locale,
    pub load_retry: LoadRetry,
}

impl Default for FusionSettings {
    fn default() -> Self {
        Self {
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            iou_threshold: DEFAULT_IOU_THRESHOLD,
            locale: Locale::default(),
            load_retry: LoadRetry::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct InferenceConfig {
    pub environment: Environment,
    pub models: Vec<ModelSpec>,
    pub settings: FusionSettings,
    pub otel_endpoint: Option<String>,
}

impl InferenceConfig {
    /// Load configuration from environment variables with sensible defaults
    pub fn from_env() -> anyhow::Result<Self> {
        let environment = Environment::from_env();

        let models = vec![
            model_from_env(ModelKind::General, "GENERAL", "models/best_general.onnx"),
            model_from_env(ModelKind::Coin, "COIN", "models/best_coin.onnx"),
        ];

        let defaults = FusionSettings::default();
        let settings = FusionSettings {
            confidence_threshold: env_or("CONFIDENCE_THRESHOLD", defaults.confidence_threshold),
            iou_threshold: env_or("IOU_THRESHOLD", defaults.iou_threshold),
            locale: env_or("NARRATION_LOCALE", defaults.locale),
            load_retry: LoadRetry {
                attempts: env_or("MODEL_LOAD_RETRIES", defaults.load_retry.attempts),
                base_delay_ms: env_or("MODEL_RETRY_DELAY_MS", defaults.load_retry.base_delay_ms),
            },
        };

        if !(0.0..=1.0).contains(&settings.confidence_threshold) {
            anyhow::bail!(
                "CONFIDENCE_THRESHOLD must be within [0, 1], got {}",
                settings.confidence_threshold
            );
        }
        if !(0.0..=1.0).contains(&settings.iou_threshold) {
            anyhow::bail!(
                "IOU_THRESHOLD must be within [0, 1], got {}",
                settings.iou_threshold
            );
        }
        if let Some(zero) = models.iter().find(|m| m.input_size == 0) {
            anyhow::bail!("{} model input size must be positive", zero.kind);
        }

        let otel_endpoint = env::var("OTEL_ENDPOINT").ok().filter(|s| !s.is_empty());

        Ok(Self {
            environment,
            models,
            settings,
            otel_endpoint,
        })
    }

    /// Create default configuration for testing
    #[cfg(test)]
    pub fn test_default() -> Self {
        Self {
            environment: Environment::Development,
            models: vec![
                ModelSpec {
                    kind: ModelKind::General,
                    path: PathBuf::from("/models/general.onnx"),
                    input_size: DEFAULT_MODEL_INPUT_SIZE,
                    table: DenominationTable::korean_won(),
                },
                ModelSpec {
                    kind: ModelKind::Coin,
                    path: PathBuf::from("/models/coin.onnx"),
                    input_size: DEFAULT_MODEL_INPUT_SIZE,
                    table: DenominationTable::korean_won(),
                },
            ],
            settings: FusionSettings::default(),
            otel_endpoint: None,
        }
    }
}

fn model_from_env(kind: ModelKind, prefix: &str, default_path: &str) -> ModelSpec {
    let path = env::var(format!("{prefix}_MODEL_PATH"))
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(default_path));

    ModelSpec {
        kind,
        path,
        input_size: env_or(&format!("{prefix}_INPUT_SIZE"), DEFAULT_MODEL_INPUT_SIZE),
        table: DenominationTable::korean_won(),
    }
}
