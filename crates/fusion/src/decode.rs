use crate::denomination::DenominationTable;
use crate::detection::{BoundingBox, Detection};
use crate::errors::FusionError;

pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.5;

/// Values per candidate slot: `x1, y1, x2, y2, confidence, class_id`.
pub const SLOT_WIDTH: usize = 6;

const CONFIDENCE: usize = 4;
const CLASS_ID: usize = 5;

/// Turns a raw `[1, K, 6]` detector output into monetary detections.
#[derive(Debug, Clone)]
pub struct Decoder {
    table: DenominationTable,
    confidence_threshold: f32,
}

impl Decoder {
    pub fn new(table: DenominationTable) -> Self {
        Self {
            table,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
        }
    }

    pub fn with_confidence_threshold(mut self, confidence_threshold: f32) -> Self {
        self.confidence_threshold = confidence_threshold;
        self
    }

    pub fn table(&self) -> &DenominationTable {
        &self.table
    }

    pub fn confidence_threshold(&self) -> f32 {
        self.confidence_threshold
    }

    /// Keep every slot whose confidence is strictly above the threshold and
    /// whose class maps to money. Slot order is preserved.
    ///
    /// A tensor of any other shape is rejected whole: nothing is decoded from
    /// it.
    pub fn decode(&self, output: &ndarray::ArrayViewD<f32>) -> Result<Vec<Detection>, FusionError> {
        let num_slots = match output.shape() {
            &[1, slots, SLOT_WIDTH] => slots,
            shape => {
                return Err(FusionError::MalformedOutputTensor {
                    shape: shape.to_vec(),
                });
            }
        };

        let mut detections = Vec::new();

        for i in 0..num_slots {
            let confidence = output[[0, i, CONFIDENCE]];

            if confidence.is_nan() || confidence <= self.confidence_threshold {
                continue;
            }

            let Some(class_id) = truncate_class_id(output[[0, i, CLASS_ID]]) else {
                continue;
            };

            let amount = self.table.amount(class_id);
            if amount == 0 {
                continue;
            }

            detections.push(Detection {
                class_id,
                confidence,
                amount,
                bbox: BoundingBox::new(
                    output[[0, i, 0]],
                    output[[0, i, 1]],
                    output[[0, i, 2]],
                    output[[0, i, 3]],
                ),
            });
        }

        tracing::trace!(
            num_slots,
            kept = detections.len(),
            "Decoded detector output"
        );

        Ok(detections)
    }
}

/// Class ids are emitted as exact floats; truncate toward zero the same way
/// the training export did.
#[inline]
fn truncate_class_id(raw: f32) -> Option<u32> {
    if !raw.is_finite() {
        return None;
    }
    u32::try_from(raw.trunc() as i64).ok()
}
