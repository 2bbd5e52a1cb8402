use ndarray::{Array, ArrayD, IxDyn};
use std::path::Path;

#[cfg(feature = "ort-backend")]
pub mod ort;

/// A loaded detection model.
///
/// Implementations own their runtime session for as long as they live;
/// dropping the backend releases the model.
pub trait InferenceBackend {
    fn load_model(path: &Path) -> anyhow::Result<Self>
    where
        Self: Sized;

    /// Run the model on a preprocessed `[1, S, S, 3]` tensor.
    ///
    /// Returns the raw output tensor, expected to be `[1, K, 6]`; shape
    /// validation happens in the decoder.
    fn infer(&mut self, input: &Array<f32, IxDyn>) -> anyhow::Result<ArrayD<f32>>;
}
