pub mod config;
pub mod cpu;

use ndarray::{Array, IxDyn};
use thiserror::Error;

pub use config::DEFAULT_INPUT_SIZE;
pub use cpu::CpuPreProcessor;

#[derive(Error, Debug)]
pub enum PreprocessError {
    #[error("Invalid image: {width}x{height}")]
    InvalidImage { width: u32, height: u32 },

    #[error("Buffer size mismatch: expected {expected}, got {actual} bytes")]
    BufferSizeMismatch { expected: usize, actual: usize },

    #[error("Image buffer error: {0}")]
    Buffer(#[from] fast_image_resize::ImageBufferError),

    #[error("Resize failed: {0}")]
    Resize(#[from] fast_image_resize::ResizeError),

    #[error("Tensor shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),
}

/// Trait for image preprocessing implementations
pub trait Preprocess {
    /// Turn tightly packed RGB8 pixels into the model input tensor.
    ///
    /// # Arguments
    /// * `pixels` - RGB pixel data in HWC format
    /// * `width` - Image width
    /// * `height` - Image height
    fn preprocess(
        &mut self,
        pixels: &[u8],
        width: u32,
        height: u32,
    ) -> Result<Array<f32, IxDyn>, PreprocessError>;

    /// Side length of the square tensor this preprocessor produces
    fn input_size(&self) -> u32;
}
