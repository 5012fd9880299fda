//! Drowsiness Monitor - Demo Entry Point
//!
//! Runs the evaluation loop against a scripted synthetic signal source:
//! an alert phase, an eye-closure episode, a head-sway episode, a dropped
//! face, and a head-down episode. A real deployment replaces the script
//! with a landmark/pose extractor feeding the same samples.

use alerting::ConsoleAlertSystem;
use anyhow::Result;
use monitor::{init_logging, FrameEvaluator, MonitorConfig, SignalSample};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use telemetry::JsonExporter;
use tracing::info;

const FRAME_INTERVAL: Duration = Duration::from_millis(33);
const SESSION_SECS: f64 = 34.0;

/// Scripted per-frame signals, by offset into the session
fn scripted_signal(t: f64) -> (f64, f64, f64, bool) {
    match t {
        // Alert driving
        t if t < 5.0 => (0.32, -2.0, 1.0, true),
        // Eyes drift closed long enough to trigger the eyes alarm
        t if t < 12.0 => (0.12, -2.0, 1.0, true),
        // Eyes reopen
        t if t < 14.0 => (0.30, -2.0, 1.0, true),
        // Head sways left-right twice a second
        t if t < 24.0 => {
            let yaw = if (t * 2.0) as u64 % 2 == 0 { 16.0 } else { -16.0 };
            (0.30, 0.0, yaw, true)
        }
        // Tracking drops for a moment
        t if t < 25.0 => (0.0, 0.0, 0.0, false),
        // Head sinks down
        t if t < 31.0 => (0.30, -24.0, 0.0, true),
        // Recovered
        _ => (0.32, -2.0, 0.0, true),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    info!("=== Vigil Monitor v{} ===", env!("CARGO_PKG_VERSION"));

    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = MonitorConfig::load(config_path.as_deref())?;
    info!(?config, "configuration loaded");

    let alerts = Arc::new(ConsoleAlertSystem::new());
    let exporter = JsonExporter::new("dashboard")?;
    let mut evaluator = FrameEvaluator::new(config, alerts, Box::new(exporter))?;

    let start = Instant::now();
    let mut ticker = tokio::time::interval(FRAME_INTERVAL);
    let mut last_status = String::new();

    loop {
        ticker.tick().await;
        let now = Instant::now();
        let t = now.duration_since(start).as_secs_f64();
        if t >= SESSION_SECS {
            break;
        }

        let (ear, pitch, yaw, face_present) = scripted_signal(t);
        let status = evaluator.process(&SignalSample {
            now,
            ear,
            pitch,
            yaw,
            face_present,
        });

        let text = status.to_string();
        if text != last_status {
            info!(t = format!("{t:.1}s"), status = %text, "status change");
            last_status = text;
        }
    }

    evaluator.finalize();
    info!("session complete");
    Ok(())
}
