use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FusionError {
    #[error("Malformed output tensor: expected [1, K, 6], got {shape:?}")]
    MalformedOutputTensor { shape: Vec<usize> },

    #[error("Unknown locale: {0}")]
    UnknownLocale(String),
}
