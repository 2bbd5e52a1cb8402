use crate::detection::Detection;
use crate::locale::Locale;

/// Renders detection totals as natural-language text for narration.
pub trait MessageFormatter {
    /// Sentence spoken when nothing was detected.
    fn no_detections(&self) -> String;

    /// Sentence listing every amount, in order, followed by the total.
    fn summary(&self, amounts: &[u32], total: u64) -> String;
}

/// Outcome of one end-to-end run, ready to be narrated.
#[derive(Debug, Clone, PartialEq)]
pub struct RunResult {
    pub detections: Vec<Detection>,
    pub total: u64,
    pub message: String,
}

impl RunResult {
    pub fn is_empty(&self) -> bool {
        self.detections.is_empty()
    }

    pub fn amounts(&self) -> Vec<u32> {
        self.detections.iter().map(|d| d.amount).collect()
    }
}

pub struct Aggregator {
    formatter: Box<dyn MessageFormatter + Send + Sync>,
}

impl Aggregator {
    pub fn new(formatter: impl MessageFormatter + Send + Sync + 'static) -> Self {
        Self {
            formatter: Box::new(formatter),
        }
    }

    pub fn aggregate(&self, detections: Vec<Detection>) -> RunResult {
        let amounts: Vec<u32> = detections.iter().map(|d| d.amount).collect();
        let total: u64 = amounts.iter().map(|&amount| u64::from(amount)).sum();

        let message = if detections.is_empty() {
            self.formatter.no_detections()
        } else {
            self.formatter.summary(&amounts, total)
        };

        RunResult {
            detections,
            total,
            message,
        }
    }
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new(Locale::default())
    }
}
