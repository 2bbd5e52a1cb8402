pub mod backend;
pub mod config;
pub mod detector;
pub mod errors;
pub mod logging;
pub mod narration;
pub mod pipeline;

// Re-export commonly used types for convenience
pub use backend::InferenceBackend;
pub use config::{FusionSettings, InferenceConfig};
pub use detector::{LabeledDetector, ModelKind, ModelSpec};
pub use errors::PipelineError;
pub use fusion::{Detection, Locale, RunResult};
pub use narration::{ConsoleNarrator, NarrationContext, NarrationError, NarrationState, Narrator};
pub use pipeline::Pipeline;
