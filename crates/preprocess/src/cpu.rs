use crate::config::{CHANNELS, DEFAULT_INPUT_SIZE};
use crate::{Preprocess, PreprocessError};
use common::span;
use fast_image_resize::{
    FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer,
    images::{Image, ImageRef},
};
use ndarray::{Array, IxDyn};
use std::default::Default;

/// Squash-resizes RGB frames to `input_size x input_size` and scales every
/// channel into `[0, 1]`.
///
/// Aspect ratio is not preserved: detection models here were trained on
/// stretched inputs, so box coordinates are only meaningful with this exact
/// transform.
pub struct CpuPreProcessor {
    pub input_size: u32,
    resizer: Resizer,
    resized: Image<'static>,
}

impl CpuPreProcessor {
    pub fn new(input_size: u32) -> Self {
        Self {
            input_size,
            resizer: Resizer::new(),
            resized: Image::new(input_size, input_size, PixelType::U8x3),
        }
    }

    /// Returns a `[1, S, S, 3]` tensor in row-major RGB order.
    pub fn preprocess_from_u8_slice(
        &mut self,
        pixels: &[u8],
        width: u32,
        height: u32,
    ) -> Result<Array<f32, IxDyn>, PreprocessError> {
        let _s = span!("preprocess_frame");

        tracing::trace!(
            width,
            height,
            pixel_bytes = pixels.len(),
            input_size = self.input_size,
            "Preprocessing frame dimensions"
        );

        if width == 0 || height == 0 {
            return Err(PreprocessError::InvalidImage { width, height });
        }

        let expected = width as usize * height as usize * CHANNELS;
        if pixels.len() != expected {
            return Err(PreprocessError::BufferSizeMismatch {
                expected,
                actual: pixels.len(),
            });
        }

        self.squash(pixels, width, height)?;
        self.normalize()
    }

    fn squash(&mut self, pixels: &[u8], width: u32, height: u32) -> Result<(), PreprocessError> {
        let _s = span!("squash_resize");

        let src = ImageRef::new(width, height, pixels, PixelType::U8x3)?;

        self.resizer.resize(
            &src,
            &mut self.resized,
            &ResizeOptions::new().resize_alg(ResizeAlg::Convolution(FilterType::Bilinear)),
        )?;

        Ok(())
    }

    fn normalize(&self) -> Result<Array<f32, IxDyn>, PreprocessError> {
        let _s = span!("normalize");

        let side = self.input_size as usize;
        let output: Vec<f32> = self
            .resized
            .buffer()
            .iter()
            .map(|&channel| channel as f32 / 255.0)
            .collect();

        Ok(Array::from_shape_vec(
            IxDyn(&[1, side, side, CHANNELS]),
            output,
        )?)
    }
}

impl Default for CpuPreProcessor {
    fn default() -> Self {
        Self::new(DEFAULT_INPUT_SIZE)
    }
}

impl Preprocess for CpuPreProcessor {
    fn preprocess(
        &mut self,
        pixels: &[u8],
        width: u32,
        height: u32,
    ) -> Result<Array<f32, IxDyn>, PreprocessError> {
        self.preprocess_from_u8_slice(pixels, width, height)
    }

    fn input_size(&self) -> u32 {
        self.input_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(width: u32, height: u32, rgb: [u8; 3]) -> Vec<u8> {
        rgb.iter()
            .copied()
            .cycle()
            .take((width * height * 3) as usize)
            .collect()
    }

    #[test]
    fn output_is_nhwc_square_tensor() {
        let pixels = vec![
            255, 0, 0, // Red pixel
            0, 255, 0, // Green pixel
            0, 0, 255, // Blue pixel
            255, 255, 255, // White pixel
        ];

        let mut preprocessor = CpuPreProcessor::new(8);
        let output = preprocessor.preprocess_from_u8_slice(&pixels, 2, 2).unwrap();

        assert_eq!(output.shape(), &[1, 8, 8, 3]);
        assert!(output.iter().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn default_targets_default_input_size() {
        let preprocessor = CpuPreProcessor::default();
        assert_eq!(preprocessor.input_size(), DEFAULT_INPUT_SIZE);
    }

    #[test]
    fn channels_are_scaled_by_255() {
        let pixels = solid(4, 4, [255, 128, 0]);

        let mut preprocessor = CpuPreProcessor::new(4);
        let output = preprocessor.preprocess_from_u8_slice(&pixels, 4, 4).unwrap();

        let tolerance = 1.0 / 255.0 + f32::EPSILON;
        assert!((output[[0, 2, 2, 0]] - 1.0).abs() <= tolerance);
        assert!((output[[0, 2, 2, 1]] - 128.0 / 255.0).abs() <= tolerance);
        assert!(output[[0, 2, 2, 2]].abs() <= tolerance);
    }

    /// A wide frame is stretched, not letterboxed: no padding rows appear.
    #[test]
    fn wide_image_is_squashed_without_padding() {
        let pixels = solid(40, 10, [200, 10, 30]);

        let mut preprocessor = CpuPreProcessor::new(16);
        let output = preprocessor
            .preprocess_from_u8_slice(&pixels, 40, 10)
            .unwrap();

        let tolerance = 2.0 / 255.0;
        for y in [0usize, 7, 15] {
            for x in [0usize, 8, 15] {
                assert!(
                    (output[[0, y, x, 0]] - 200.0 / 255.0).abs() <= tolerance,
                    "pixel ({x},{y}) red channel was {}",
                    output[[0, y, x, 0]]
                );
            }
        }
    }

    #[test]
    fn zero_dimension_is_invalid_image() {
        let mut preprocessor = CpuPreProcessor::new(8);

        let result = preprocessor.preprocess_from_u8_slice(&[], 0, 10);
        assert!(matches!(
            result,
            Err(PreprocessError::InvalidImage { width: 0, height: 10 })
        ));

        let result = preprocessor.preprocess_from_u8_slice(&[], 10, 0);
        assert!(matches!(result, Err(PreprocessError::InvalidImage { .. })));
    }

    #[test]
    fn buffer_size_mismatch_detection() {
        let pixels = vec![0u8; 200]; // Wrong size for 10x10

        let mut preprocessor = CpuPreProcessor::new(8);
        let result = preprocessor.preprocess_from_u8_slice(&pixels, 10, 10);

        assert!(result.is_err(), "Size mismatch should return error");
        assert!(
            result.unwrap_err().to_string().contains("mismatch"),
            "Error should mention mismatch"
        );
    }

    /// The same preprocessor is reused across frames of different sizes.
    #[test]
    fn reuse_across_frame_sizes() {
        let mut preprocessor = CpuPreProcessor::new(8);

        let first = preprocessor
            .preprocess(&solid(3, 5, [10, 20, 30]), 3, 5)
            .unwrap();
        let second = preprocessor
            .preprocess(&solid(12, 9, [10, 20, 30]), 12, 9)
            .unwrap();

        assert_eq!(first.shape(), second.shape());
    }
}
