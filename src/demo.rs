//! Scripted measurement against [`SimulatedTracking`]
//!
//! Drives the same loop a platform binding would: aim, place, glance at the
//! preview, finish. Used by the `spanmeasure` binary.

use spanmeasure_core::{MeasureError, Result, WorldPoint};
use spanmeasure_session::{
    MeasurementHandle, MeasurementLoop, MeasurementOutcome, PresentationFrame, PresentationSink,
};
use spanmeasure_settings::Config;
use spanmeasure_tracking::{SimulatedTracking, TrackingProvider};
use std::sync::Arc;

/// Two sides of a one meter square
pub const L_SHAPE: [WorldPoint; 3] = [
    WorldPoint { x: 0.0, y: 0.0, z: 0.0 },
    WorldPoint { x: 1.0, y: 0.0, z: 0.0 },
    WorldPoint { x: 1.0, y: 1.0, z: 0.0 },
];

/// Start a measurement loop configured from `config`
///
/// `Ok(None)` when the provider cannot track; the caller reports
/// [`MeasurementOutcome::Unsupported`] without ever starting a session.
pub fn start_measurement(
    provider: Arc<dyn TrackingProvider>,
    config: &Config,
    sink: impl PresentationSink + 'static,
) -> Result<Option<MeasurementHandle>> {
    let spawned = MeasurementLoop::new(provider)
        .session_options(config.session_options())
        .loop_options(config.loop_options())
        .sink(sink)
        .spawn();

    match spawned {
        Ok(handle) => Ok(Some(handle)),
        Err(MeasureError::CapabilityAbsent) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Place every point of `path` in turn and finish
///
/// Each placement is retried for a few ticks while the provider has no hit.
/// Paths with fewer than two points end cancelled.
pub async fn run_script(
    sim: &SimulatedTracking,
    config: &Config,
    path: &[WorldPoint],
) -> Result<MeasurementOutcome> {
    let Some(mut handle) = start_measurement(Arc::new(sim.clone()), config, log_frame)? else {
        return Ok(MeasurementOutcome::Unsupported);
    };
    let tick = config.loop_options().tick_period;

    for target in path {
        sim.aim_at(*target);
        // let the preview catch up with the new aim
        tokio::time::sleep(tick).await;

        let mut placed = false;
        for _ in 0..5 {
            if handle.add_point().await?.is_committed() {
                placed = true;
                break;
            }
            tokio::time::sleep(tick).await;
        }
        if !placed {
            tracing::warn!("Could not place a point at {}", target);
        }
    }

    match handle.finish().await {
        Ok(report) => tracing::info!("Measured {}", report),
        Err(e) if e.is_rejection() => {
            tracing::info!("Nothing to finish ({}), cancelling", e);
            handle.cancel().await?;
        }
        Err(e) => return Err(e),
    }

    let outcome = handle.outcome().await;
    handle.shutdown().await;
    Ok(outcome)
}

fn log_frame(frame: &PresentationFrame) {
    let labels: Vec<&str> = frame.segments.iter().map(|s| s.label.as_str()).collect();
    match &frame.preview {
        Some(preview) => tracing::debug!(
            "{} {} | {} point(s) [{}] | aiming at {} ({})",
            frame.session,
            frame.state,
            frame.points.len(),
            labels.join(", "),
            preview.end,
            preview.label
        ),
        None => tracing::debug!(
            "{} {} | {} point(s) [{}]",
            frame.session,
            frame.state,
            frame.points.len(),
            labels.join(", ")
        ),
    }
}
