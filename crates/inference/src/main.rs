use clap::Parser;
use inference::{
    ConsoleNarrator, InferenceConfig, Locale, NarrationContext, Pipeline, logging::init_observability,
};
use std::path::PathBuf;

#[cfg(feature = "ort-backend")]
use inference::backend::ort::OrtBackend as Backend;

#[cfg(not(feature = "ort-backend"))]
compile_error!("The 'ort-backend' feature must be enabled to build the coinsense binary");

/// Detect Korean coins and banknotes in images and announce the total.
#[derive(Parser, Debug)]
#[command(name = "coinsense", version)]
struct Args {
    /// Image files or glob patterns (e.g. "photos/*.jpg")
    #[arg(required = true)]
    images: Vec<String>,

    /// Narration language (ko, en, ja, zh); overrides NARRATION_LOCALE
    #[arg(long)]
    locale: Option<Locale>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = InferenceConfig::from_env()?;
    if let Some(locale) = args.locale {
        config.settings.locale = locale;
    }

    let _telemetry = init_observability(&config)?;

    tracing::info!(config = ?config, "Loaded configuration");

    let mut pipeline = Pipeline::<Backend>::load(&config.models, &config.settings)?;
    tracing::info!(models = ?pipeline.models(), "Models loaded");

    let mut narration = NarrationContext::new(ConsoleNarrator::stdout());
    if let Err(e) = narration.initialize() {
        tracing::warn!(error = %e, "Narration disabled");
    }

    let inputs = expand_inputs(&args.images)?;
    if inputs.is_empty() {
        anyhow::bail!("No image matched {:?}", args.images);
    }

    let mut failed = 0usize;
    for path in &inputs {
        let image = match image::open(path) {
            Ok(image) => image.to_rgb8(),
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "Failed to decode image");
                failed += 1;
                continue;
            }
        };

        match pipeline.detect_and_fuse(&image) {
            Ok(result) => {
                for detection in &result.detections {
                    tracing::info!(
                        path = %path.display(),
                        class_id = detection.class_id,
                        amount = detection.amount,
                        confidence = detection.confidence,
                        bbox = ?detection.bbox,
                        "Detection"
                    );
                }
                tracing::info!(path = %path.display(), total = result.total, "Result");

                if narration.is_ready()
                    && let Err(e) = narration.speak(&result.message)
                {
                    tracing::warn!(error = %e, "Narration failed");
                }
            }
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "Detection failed");
                failed += 1;
            }
        }
    }

    pipeline.shutdown();

    if failed > 0 {
        anyhow::bail!("{failed} of {} images could not be processed", inputs.len());
    }
    Ok(())
}

/// Resolve each argument as a glob pattern when it contains one, otherwise as
/// a plain path.
fn expand_inputs(patterns: &[String]) -> anyhow::Result<Vec<PathBuf>> {
    let mut paths = Vec::new();

    for pattern in patterns {
        if pattern.contains(['*', '?', '[']) {
            for entry in glob::glob(pattern)? {
                paths.push(entry?);
            }
        } else {
            paths.push(PathBuf::from(pattern));
        }
    }

    Ok(paths)
}
