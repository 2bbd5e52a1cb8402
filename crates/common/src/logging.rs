use crate::config::Environment;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter from `RUST_LOG`, defaulting to `info`.
pub(crate) fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Initialize the global tracing subscriber without any exporter attached.
///
/// Development gets pretty, colored output; production gets one JSON object
/// per event. Use [`crate::TelemetryGuard::init`] instead when an OTLP
/// collector is available, it installs the same formatting plus the
/// OpenTelemetry bridge.
pub fn setup_logging(environment: Environment) {
    let registry = tracing_subscriber::registry().with(env_filter());

    match environment {
        Environment::Production => {
            registry
                .with(tracing_subscriber::fmt::layer().json().with_level(true))
                .init();
        }
        Environment::Development => {
            registry
                .with(tracing_subscriber::fmt::layer().pretty().with_ansi(true))
                .init();
        }
    }
}
