use crate::{
    backend::InferenceBackend,
    config::FusionSettings,
    detector::{LabeledDetector, ModelKind, ModelSpec},
    errors::PipelineError,
};
use fusion::{Aggregator, Deduplicator, Detection, RunResult};
use image::RgbImage;
use opentelemetry::{
    KeyValue, global,
    metrics::{Counter, Histogram},
};
use std::thread;
use std::time::Instant;

struct PipelineMetrics {
    duration: Histogram<f64>,
    runs: Counter<u64>,
    detections: Counter<u64>,
    suppressed: Counter<u64>,
    model_failures: Counter<u64>,
}

impl PipelineMetrics {
    fn init(meter_name: &'static str) -> Self {
        let meter = global::meter(meter_name);
        let latency_buckets = [
            0.01, 0.025, 0.05, 0.075, 0.1, 0.15, 0.2, 0.3, 0.5, 0.75, 1.0, 1.5, 2.0, 5.0,
        ];

        Self {
            duration: meter
                .f64_histogram("pipeline_run_duration_seconds")
                .with_description("Time to detect and fuse one image across all models")
                .with_unit("s")
                .with_boundaries(latency_buckets.to_vec())
                .build(),
            runs: meter
                .u64_counter("pipeline_runs_total")
                .with_description("Total images processed")
                .build(),
            detections: meter
                .u64_counter("pipeline_detections_total")
                .with_description("Detections kept after fusion")
                .build(),
            suppressed: meter
                .u64_counter("pipeline_suppressed_total")
                .with_description("Duplicate detections removed during fusion")
                .build(),
            model_failures: meter
                .u64_counter("pipeline_model_failures_total")
                .with_description("Model runs whose output was discarded")
                .build(),
        }
    }
}

/// Runs every loaded detector on an image and fuses their findings into one
/// narrated result.
pub struct Pipeline<B> {
    detectors: Vec<LabeledDetector<B>>,
    deduplicator: Deduplicator,
    aggregator: Aggregator,
    metrics: PipelineMetrics,
}

impl<B: InferenceBackend + Send> Pipeline<B> {
    pub fn new(
        detectors: Vec<LabeledDetector<B>>,
        settings: &FusionSettings,
    ) -> Result<Self, PipelineError> {
        if detectors.is_empty() {
            return Err(PipelineError::ModelUnavailable(
                "no detector was provided".to_string(),
            ));
        }

        Ok(Self {
            detectors,
            deduplicator: Deduplicator::new().with_iou_threshold(settings.iou_threshold),
            aggregator: Aggregator::new(settings.locale),
            metrics: PipelineMetrics::init("coinsense"),
        })
    }

    /// Load every model in `specs`. Models that cannot be loaded are skipped
    /// so the pipeline keeps working with whatever remains.
    pub fn load(specs: &[ModelSpec], settings: &FusionSettings) -> Result<Self, PipelineError> {
        let mut detectors = Vec::with_capacity(specs.len());
        let mut last_error = None;

        for spec in specs {
            match LabeledDetector::load(spec, settings.confidence_threshold, settings.load_retry) {
                Ok(detector) => detectors.push(detector),
                Err(e) => {
                    tracing::warn!(
                        model = %spec.kind,
                        error = %e,
                        "Model unavailable, continuing without it"
                    );
                    last_error = Some(e);
                }
            }
        }

        if detectors.is_empty() {
            return Err(last_error.unwrap_or_else(|| {
                PipelineError::ModelUnavailable("no model configured".to_string())
            }));
        }

        tracing::info!(
            loaded = detectors.len(),
            configured = specs.len(),
            "Pipeline ready"
        );
        Self::new(detectors, settings)
    }

    pub fn models(&self) -> Vec<ModelKind> {
        self.detectors.iter().map(|d| d.kind()).collect()
    }

    /// Detect currency in `image` with every model and fuse the results.
    pub fn detect_and_fuse(&mut self, image: &RgbImage) -> Result<RunResult, PipelineError> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(PipelineError::InvalidImage(format!(
                "image has a zero dimension ({width}x{height})"
            )));
        }

        let span = tracing::info_span!("detect_and_fuse", width, height);
        let _enter = span.enter();
        let start = Instant::now();
        let pixels = image.as_raw().as_slice();

        let outcomes: Vec<(ModelKind, Result<Vec<Detection>, PipelineError>)> =
            thread::scope(|scope| {
                let handles: Vec<_> = self
                    .detectors
                    .iter_mut()
                    .map(|detector| {
                        let kind = detector.kind();
                        let span = span.clone();
                        let handle = scope.spawn(move || {
                            let _enter = span.enter();
                            detector.detect(pixels, width, height)
                        });
                        (kind, handle)
                    })
                    .collect();

                handles
                    .into_iter()
                    .map(|(kind, handle)| {
                        let outcome = handle
                            .join()
                            .unwrap_or(Err(PipelineError::DetectorPanicked { model: kind }));
                        (kind, outcome)
                    })
                    .collect()
            });

        let mut per_model = Vec::with_capacity(outcomes.len());
        let mut failures = 0usize;
        let mut last_failure = None;

        for (kind, outcome) in outcomes {
            match outcome {
                Ok(detections) => {
                    tracing::info!(model = %kind, count = detections.len(), "Model detections");
                    per_model.push(detections);
                }
                Err(e) if e.is_per_model() => {
                    tracing::warn!(model = %kind, error = %e, "Discarding model output");
                    self.metrics
                        .model_failures
                        .add(1, &[KeyValue::new("model", kind.as_str())]);
                    failures += 1;
                    last_failure = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        if per_model.is_empty()
            && let Some(last) = last_failure
        {
            return Err(PipelineError::NoModelOutput {
                failures,
                last: Box::new(last),
            });
        }

        let before = per_model.iter().map(Vec::len).sum::<usize>();
        let fused = self.deduplicator.fuse(per_model);
        let suppressed = before - fused.len();
        tracing::info!(
            before,
            after = fused.len(),
            suppressed,
            failures,
            "Merged detections"
        );

        let result = self.aggregator.aggregate(fused);

        self.metrics
            .duration
            .record(start.elapsed().as_secs_f64(), &[]);
        self.metrics.runs.add(1, &[]);
        self.metrics
            .detections
            .add(result.detections.len() as u64, &[]);
        self.metrics.suppressed.add(suppressed as u64, &[]);

        tracing::debug!(total = result.total, message = %result.message, "Run complete");
        Ok(result)
    }

    /// Release every loaded model.
    pub fn shutdown(self) {
        for detector in self.detectors {
            tracing::info!(model = %detector.kind(), "Releasing model");
            drop(detector);
        }
    }
}
