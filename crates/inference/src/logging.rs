use crate::config::InferenceConfig;
use common::TelemetryGuard;

/// Install the tracing subscriber, exporting to OTLP when an endpoint is
/// configured. Hold on to the returned guard until the process exits.
pub fn init_observability(config: &InferenceConfig) -> anyhow::Result<Option<TelemetryGuard>> {
    match config.otel_endpoint.as_deref() {
        Some(endpoint) => {
            let guard = TelemetryGuard::init("coinsense", endpoint, config.environment)?;
            Ok(Some(guard))
        }
        None => {
            common::setup_logging(config.environment);
            Ok(None)
        }
    }
}
