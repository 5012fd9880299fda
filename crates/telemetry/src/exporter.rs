//! JSON file exporter for the web dashboard

use crate::{RealtimeSnapshot, Severity, TelemetryError, TelemetrySink};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const MAX_DIALOGUE_ENTRIES: usize = 50;
const MAX_ALERT_ENTRIES: usize = 100;

const REALTIME_FILE: &str = "realtime_data.json";
const SESSION_FILE: &str = "session_report.json";
const DIALOGUE_FILE: &str = "dialogue_log.json";
const ALERTS_FILE: &str = "alert_history.json";

#[derive(Debug, Clone, Serialize)]
struct DialogueEntry {
    timestamp: DateTime<Utc>,
    message: String,
    severity: Severity,
}

#[derive(Debug, Clone, Serialize)]
struct AlertEntry {
    timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    kind: String,
    level: u8,
    duration: f64,
}

#[derive(Debug, Serialize)]
struct SessionReport {
    duration_seconds: f64,
    total_alerts: u64,
    average_perclos_pct: f64,
    start_time: DateTime<Utc>,
    last_update: DateTime<Utc>,
}

/// Writes monitor state as JSON files under an output directory, one file
/// per dashboard panel. Every write failure is logged and swallowed; the
/// exporter never propagates errors back into the evaluation loop.
pub struct JsonExporter {
    out_dir: PathBuf,
    session_start: DateTime<Utc>,
    total_alerts: u64,
    dialogue_log: Vec<DialogueEntry>,
    alert_history: Vec<AlertEntry>,
}

impl JsonExporter {
    /// Create an exporter and seed the dashboard files
    pub fn new(out_dir: impl Into<PathBuf>) -> Result<Self, TelemetryError> {
        let out_dir = out_dir.into();
        fs::create_dir_all(&out_dir)?;

        let mut exporter = Self {
            out_dir,
            session_start: Utc::now(),
            total_alerts: 0,
            dialogue_log: Vec::new(),
            alert_history: Vec::new(),
        };

        info!(dir = %exporter.out_dir.display(), "dashboard export started");
        exporter.write_json(REALTIME_FILE, &RealtimeSnapshot::default());
        exporter.update_session(0.0);
        exporter.write_json(DIALOGUE_FILE, &exporter.dialogue_log);
        exporter.write_json(ALERTS_FILE, &exporter.alert_history);
        Ok(exporter)
    }

    /// Number of alerts recorded this session
    pub fn total_alerts(&self) -> u64 {
        self.total_alerts
    }

    /// Dialogue log length (capped)
    pub fn dialogue_len(&self) -> usize {
        self.dialogue_log.len()
    }

    /// Alert history length (capped)
    pub fn alert_history_len(&self) -> usize {
        self.alert_history.len()
    }

    fn write_json<T: Serialize>(&self, filename: &str, data: &T) {
        let path = self.out_dir.join(filename);
        match serde_json::to_vec_pretty(data) {
            Ok(bytes) => {
                if let Err(e) = write_atomic(&path, &bytes) {
                    warn!(file = filename, error = %e, "telemetry write failed");
                }
            }
            Err(e) => warn!(file = filename, error = %e, "telemetry serialization failed"),
        }
    }

    fn session_report(&self, perclos_average: f64) -> SessionReport {
        let now = Utc::now();
        let duration = (now - self.session_start).num_milliseconds() as f64 / 1000.0;
        SessionReport {
            duration_seconds: duration,
            total_alerts: self.total_alerts,
            average_perclos_pct: perclos_average * 100.0,
            start_time: self.session_start,
            last_update: now,
        }
    }
}

impl TelemetrySink for JsonExporter {
    fn update_realtime(&mut self, snapshot: &RealtimeSnapshot) {
        self.write_json(REALTIME_FILE, snapshot);
    }

    fn add_message(&mut self, message: &str, severity: Severity) {
        debug!(%message, ?severity, "dialogue entry");
        self.dialogue_log.push(DialogueEntry {
            timestamp: Utc::now(),
            message: message.to_string(),
            severity,
        });
        if self.dialogue_log.len() > MAX_DIALOGUE_ENTRIES {
            let excess = self.dialogue_log.len() - MAX_DIALOGUE_ENTRIES;
            self.dialogue_log.drain(..excess);
        }
        self.write_json(DIALOGUE_FILE, &self.dialogue_log);
    }

    fn add_alert(&mut self, kind: &str, level: u8, duration_secs: f64) {
        self.total_alerts += 1;
        self.alert_history.push(AlertEntry {
            timestamp: Utc::now(),
            kind: kind.to_string(),
            level,
            duration: duration_secs,
        });
        if self.alert_history.len() > MAX_ALERT_ENTRIES {
            let excess = self.alert_history.len() - MAX_ALERT_ENTRIES;
            self.alert_history.drain(..excess);
        }
        self.write_json(ALERTS_FILE, &self.alert_history);
    }

    fn update_session(&mut self, perclos_average: f64) {
        let report = self.session_report(perclos_average);
        self.write_json(SESSION_FILE, &report);
    }

    fn finalize(&mut self, perclos_average: f64) {
        self.update_session(perclos_average);
        let closing = format!(
            "Session ended. Duration: {:.0}s, alerts: {}",
            (Utc::now() - self.session_start).num_milliseconds() as f64 / 1000.0,
            self.total_alerts
        );
        self.add_message(&closing, Severity::Info);
        info!(total_alerts = self.total_alerts, "dashboard export finalized");
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    // Write-then-rename so the dashboard never reads a half-written file
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    fn test_dir(name: &str) -> PathBuf {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        let n = COUNTER.fetch_add(1, Ordering::SeqCst);
        std::env::temp_dir().join(format!(
            "vigil-telemetry-{}-{}-{}",
            name,
            std::process::id(),
            n
        ))
    }

    #[test]
    fn test_seeds_dashboard_files() {
        let dir = test_dir("seed");
        let _exporter = JsonExporter::new(&dir).unwrap();

        for file in [REALTIME_FILE, SESSION_FILE, DIALOGUE_FILE, ALERTS_FILE] {
            assert!(dir.join(file).exists(), "{file} missing");
        }
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_dialogue_log_is_capped() {
        let dir = test_dir("dialogue");
        let mut exporter = JsonExporter::new(&dir).unwrap();

        for i in 0..60 {
            exporter.add_message(&format!("message {i}"), Severity::Info);
        }
        assert_eq!(exporter.dialogue_len(), MAX_DIALOGUE_ENTRIES);

        // Oldest entries were dropped
        let raw = fs::read_to_string(dir.join(DIALOGUE_FILE)).unwrap();
        assert!(!raw.contains("message 0\""));
        assert!(raw.contains("message 59"));
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_alert_history_capped_and_counted() {
        let dir = test_dir("alerts");
        let mut exporter = JsonExporter::new(&dir).unwrap();

        for i in 0..110 {
            exporter.add_alert("eyes closed", 2, i as f64);
        }
        assert_eq!(exporter.alert_history_len(), MAX_ALERT_ENTRIES);
        assert_eq!(exporter.total_alerts(), 110);
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_realtime_snapshot_roundtrip() {
        let dir = test_dir("realtime");
        let mut exporter = JsonExporter::new(&dir).unwrap();

        let snapshot = RealtimeSnapshot {
            ear: 0.18,
            perclos_pct: 12.5,
            status: "EYES ALERT (2.1s)".into(),
            alert_level: 2,
            eyes_alert_active: true,
            ..Default::default()
        };
        exporter.update_realtime(&snapshot);

        let raw = fs::read_to_string(dir.join(REALTIME_FILE)).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed["alert_level"], 2);
        assert_eq!(parsed["status"], "EYES ALERT (2.1s)");
        fs::remove_dir_all(&dir).unwrap();
    }
}
