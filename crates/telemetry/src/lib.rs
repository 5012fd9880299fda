//! Telemetry Sink
//!
//! Pure sink for monitor state: per-frame realtime snapshots, session
//! statistics, a capped dialogue log, and a capped alert history. The JSON
//! exporter writes the files a web dashboard polls; the core never depends
//! on the schema.

mod exporter;

pub use exporter::JsonExporter;

use serde::Serialize;
use thiserror::Error;

/// Telemetry errors (construction only; writes are swallowed)
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// Output directory could not be created
    #[error("failed to create output directory: {0}")]
    OutputDir(#[from] std::io::Error),
}

/// Message severity in the dialogue log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

/// Per-frame monitor state pushed to the dashboard
#[derive(Debug, Clone, Default, Serialize)]
pub struct RealtimeSnapshot {
    /// Eye-aspect-ratio of this frame
    pub ear: f64,
    /// PERCLOS over the trailing window, percent
    pub perclos_pct: f64,
    /// Unified status text
    pub status: String,
    /// 0 nominal, 1 info, 2 warning, 3 critical
    pub alert_level: u8,
    /// Head pitch in degrees
    pub pitch: f64,
    /// Head yaw in degrees
    pub yaw: f64,
    /// Direction reversals in the current sway episode
    pub head_movements: u32,
    /// Continuous eyes-closed time, seconds
    pub eyes_closed_secs: f64,
    /// Continuous head-down time, seconds
    pub head_down_secs: f64,
    /// Sway detector verdict
    pub head_drowsy: bool,
    pub eyes_alert_active: bool,
    pub head_alert_active: bool,
    pub head_down_alert_active: bool,
    pub eyes_continuous_mode: bool,
    pub head_continuous_mode: bool,
}

/// Telemetry collaborator interface.
///
/// Implementations must swallow their own I/O failures; a telemetry outage
/// must never stall or fail the evaluation loop.
pub trait TelemetrySink: Send {
    /// Push this frame's snapshot
    fn update_realtime(&mut self, snapshot: &RealtimeSnapshot);

    /// Append to the dialogue log
    fn add_message(&mut self, message: &str, severity: Severity);

    /// Append to the alert history
    fn add_alert(&mut self, kind: &str, level: u8, duration_secs: f64);

    /// Refresh session statistics
    fn update_session(&mut self, perclos_average: f64);

    /// Close out the session
    fn finalize(&mut self, perclos_average: f64);
}

/// Discards everything; for tests and headless runs
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl TelemetrySink for NullSink {
    fn update_realtime(&mut self, _snapshot: &RealtimeSnapshot) {}

    fn add_message(&mut self, _message: &str, _severity: Severity) {}

    fn add_alert(&mut self, _kind: &str, _level: u8, _duration_secs: f64) {}

    fn update_session(&mut self, _perclos_average: f64) {}

    fn finalize(&mut self, _perclos_average: f64) {}
}
