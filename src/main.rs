use anyhow::Context;
use spanmeasure::{
    default_config_path, demo, init_logging, Config, LogFormat, MeasurementOutcome,
    SimulatedTracking, BUILD_DATE, VERSION,
};
use std::path::PathBuf;

fn load_config() -> anyhow::Result<Config> {
    if let Some(path) = std::env::args().nth(1).map(PathBuf::from) {
        return Config::load_from_file(&path)
            .with_context(|| format!("loading config {}", path.display()));
    }

    match default_config_path() {
        Ok(path) => Config::load_or_default(&path)
            .with_context(|| format!("loading config {}", path.display())),
        Err(e) => {
            tracing::warn!("{}, using default config", e);
            Ok(Config::default())
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging(LogFormat::from_env())?;
    tracing::info!("SpanMeasure {} (built {})", VERSION, BUILD_DATE);

    let config = load_config()?;
    let sim = SimulatedTracking::new();
    let outcome = demo::run_script(&sim, &config, &demo::L_SHAPE).await?;

    match outcome {
        MeasurementOutcome::Measured(report) => println!("{}", report),
        MeasurementOutcome::Cancelled => println!("Measurement cancelled"),
        MeasurementOutcome::Unsupported => println!("Spatial tracking is not supported"),
    }

    Ok(())
}
