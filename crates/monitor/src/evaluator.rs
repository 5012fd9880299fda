//! Per-frame evaluation loop

use crate::{MonitorConfig, MonitorError, MonitorStatus};
use alerting::{AlertChannel, AlertSystem, ChannelKind, ChannelTransition, EscalationPolicy};
use std::sync::Arc;
use std::time::Instant;
use telemetry::{RealtimeSnapshot, Severity, TelemetrySink};
use tracing::info;
use vigilance::{HeadSwayDetector, PerclosEstimator};

/// One frame's signals from the perception collaborator
#[derive(Debug, Clone, Copy)]
pub struct SignalSample {
    /// Frame timestamp
    pub now: Instant,
    /// Averaged eye-aspect-ratio
    pub ear: f64,
    /// Head pitch in degrees (negative = down)
    pub pitch: f64,
    /// Head yaw in degrees (positive = right)
    pub yaw: f64,
    /// Whether landmark tracking found a face this frame
    pub face_present: bool,
}

/// Per-frame entry point driving the estimators and the three alert
/// channels, and forwarding state to the telemetry sink.
pub struct FrameEvaluator {
    config: MonitorConfig,
    perclos: PerclosEstimator,
    sway: HeadSwayDetector,
    eyes: AlertChannel,
    head_sway: AlertChannel,
    head_down: AlertChannel,
    alerts: Arc<dyn AlertSystem>,
    telemetry: Box<dyn TelemetrySink>,
}

impl FrameEvaluator {
    /// Build the evaluator; configuration errors are fatal here
    pub fn new(
        config: MonitorConfig,
        alerts: Arc<dyn AlertSystem>,
        telemetry: Box<dyn TelemetrySink>,
    ) -> Result<Self, MonitorError> {
        config.validate()?;
        Ok(Self {
            perclos: PerclosEstimator::new(config.perclos_window())?,
            sway: HeadSwayDetector::new(config.sway_config())?,
            eyes: AlertChannel::new(ChannelKind::Eyes, EscalationPolicy::eyes())?,
            head_sway: AlertChannel::new(ChannelKind::HeadSway, EscalationPolicy::head_sway())?,
            head_down: AlertChannel::new(ChannelKind::HeadDown, EscalationPolicy::head_down())?,
            config,
            alerts,
            telemetry,
        })
    }

    /// Evaluate one frame and return the unified status
    pub fn process(&mut self, sample: &SignalSample) -> MonitorStatus {
        let now = sample.now;

        if !sample.face_present {
            return self.handle_face_lost(now);
        }

        let eye_closed = sample.ear < self.config.ear_threshold;
        let head_is_down = sample.pitch < self.config.head_down_threshold_degrees;

        self.perclos.update(now, eye_closed);
        self.sway.update(now, sample.pitch, sample.yaw);
        let head_drowsy = self.sway.is_drowsy(now);

        // Fixed evaluation order: eyes, then head-sway, then head-down
        if let Some(tr) = self.eyes.evaluate(eye_closed, now, &*self.alerts) {
            self.report_transition(ChannelKind::Eyes, tr, now);
        }
        if let Some(tr) = self.head_sway.evaluate(head_drowsy, now, &*self.alerts) {
            self.report_transition(ChannelKind::HeadSway, tr, now);
        }
        if let Some(tr) = self.head_down.evaluate(head_is_down, now, &*self.alerts) {
            self.report_transition(ChannelKind::HeadDown, tr, now);
        }

        let closed_secs = self.eyes.condition_elapsed(now).as_secs_f64();
        let down_secs = self.head_down.condition_elapsed(now).as_secs_f64();
        let reversals = self.sway.direction_changes();

        let status = self.derive_status(
            eye_closed,
            head_is_down,
            closed_secs,
            down_secs,
            reversals,
        );

        let snapshot = RealtimeSnapshot {
            ear: sample.ear,
            perclos_pct: self.perclos.value() * 100.0,
            status: status.to_string(),
            alert_level: self.alert_level(),
            pitch: sample.pitch,
            yaw: sample.yaw,
            head_movements: reversals,
            eyes_closed_secs: closed_secs,
            head_down_secs: down_secs,
            head_drowsy,
            eyes_alert_active: self.eyes.is_alerting(),
            head_alert_active: self.head_sway.is_alerting(),
            head_down_alert_active: self.head_down.is_alerting(),
            eyes_continuous_mode: self.eyes.in_continuous_mode(),
            head_continuous_mode: self.head_sway.in_continuous_mode(),
        };
        self.telemetry.update_realtime(&snapshot);
        self.telemetry.update_session(self.perclos.value());

        status
    }

    /// Forward the closing PERCLOS average to the telemetry sink
    pub fn finalize(&mut self) {
        self.telemetry.finalize(self.perclos.value());
    }

    /// Escalation tier of the eyes channel (for tests and display)
    pub fn eyes_state(&self) -> alerting::ChannelState {
        self.eyes.state()
    }

    /// Escalation tier of the head-sway channel
    pub fn head_sway_state(&self) -> alerting::ChannelState {
        self.head_sway.state()
    }

    /// Escalation tier of the head-down channel
    pub fn head_down_state(&self) -> alerting::ChannelState {
        self.head_down.state()
    }

    fn handle_face_lost(&mut self, now: Instant) -> MonitorStatus {
        self.perclos.update(now, false);
        self.sway.reset();

        // Loss of tracking unconditionally resets every channel, even a
        // single dropped frame during CRITICAL. Policy carried from the
        // original system; see DESIGN.md.
        let mut cleared = false;
        for channel in [&mut self.eyes, &mut self.head_sway, &mut self.head_down] {
            if channel.force_inactive(&*self.alerts).is_some() {
                cleared = true;
            }
        }
        if cleared {
            info!("face lost, alarms reset");
            self.telemetry
                .add_message("Face lost - alarms reset", Severity::Info);
        }
        MonitorStatus::FaceLost
    }

    fn report_transition(&mut self, kind: ChannelKind, transition: ChannelTransition, now: Instant) {
        let channel = match kind {
            ChannelKind::Eyes => &self.eyes,
            ChannelKind::HeadSway => &self.head_sway,
            ChannelKind::HeadDown => &self.head_down,
        };
        let elapsed = channel.condition_elapsed(now).as_secs_f64();

        match transition {
            ChannelTransition::Triggered { .. } => {
                let severity = match kind {
                    ChannelKind::HeadDown => Severity::Info,
                    _ => Severity::Warning,
                };
                self.telemetry.add_message(
                    &format!("ALERT: {} for {:.1}s", kind.label(), elapsed),
                    severity,
                );
                self.telemetry
                    .add_alert(kind.label(), kind.alert_level(), elapsed);
            }
            ChannelTransition::Escalated { .. } => {
                self.telemetry.add_message(
                    &format!("CRITICAL DANGER: {} for {:.1}s - siren engaged", kind.label(), elapsed),
                    Severity::Critical,
                );
                self.telemetry
                    .add_alert(&format!("{} - critical", kind.label()), 3, elapsed);
            }
            ChannelTransition::Cleared => {
                info!(channel = kind.label(), "condition cleared");
            }
        }
    }

    fn derive_status(
        &self,
        eye_closed: bool,
        head_is_down: bool,
        closed_secs: f64,
        down_secs: f64,
        reversals: u32,
    ) -> MonitorStatus {
        let eyes_active = self.eyes.is_alerting();
        let sway_active = self.head_sway.is_alerting();
        let down_active = self.head_down.is_alerting();

        if eyes_active && sway_active {
            MonitorStatus::CriticalCombined
        } else if eyes_active && down_active {
            MonitorStatus::EyesAndHeadDown
        } else if eyes_active {
            MonitorStatus::EyesAlert { closed_secs }
        } else if sway_active {
            MonitorStatus::HeadSwayAlert { reversals }
        } else if down_active {
            MonitorStatus::HeadDownAlert { down_secs }
        } else if eye_closed {
            MonitorStatus::EyesClosing { closed_secs }
        } else if head_is_down {
            MonitorStatus::HeadLowering { down_secs }
        } else if reversals > 0 {
            MonitorStatus::Swaying { reversals }
        } else {
            MonitorStatus::Nominal
        }
    }

    fn alert_level(&self) -> u8 {
        if self.eyes.in_continuous_mode() || self.head_sway.in_continuous_mode() {
            3
        } else if self.eyes.is_alerting() || self.head_sway.is_alerting() {
            2
        } else if self.head_down.is_alerting() {
            1
        } else {
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alerting::{ChannelState, NullAlertSystem};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;
    use telemetry::NullSink;

    fn secs(s: f64) -> Duration {
        Duration::from_secs_f64(s)
    }

    fn sample(now: Instant, ear: f64, pitch: f64, yaw: f64) -> SignalSample {
        SignalSample {
            now,
            ear,
            pitch,
            yaw,
            face_present: true,
        }
    }

    fn evaluator() -> FrameEvaluator {
        FrameEvaluator::new(
            MonitorConfig::default(),
            Arc::new(NullAlertSystem),
            Box::new(NullSink),
        )
        .unwrap()
    }

    /// Counts siren stops across channels
    #[derive(Default)]
    struct CountingAlertSystem {
        siren_starts: AtomicUsize,
        siren_stops: AtomicUsize,
    }

    impl AlertSystem for CountingAlertSystem {
        fn beep(&self, _frequency: u32, _duration_ms: u64) {}

        fn start_continuous_beep(&self, _frequency: u32) {
            self.siren_starts.fetch_add(1, Ordering::SeqCst);
        }

        fn stop_continuous_beep(&self) {
            self.siren_stops.fetch_add(1, Ordering::SeqCst);
        }

        fn say_async(&self, _text: &str, _force: bool) -> bool {
            true
        }
    }

    /// Records alert history entries through a shared handle
    #[derive(Default)]
    struct RecordingSink {
        alerts: Arc<Mutex<Vec<(String, u8)>>>,
    }

    impl RecordingSink {
        fn handle(&self) -> Arc<Mutex<Vec<(String, u8)>>> {
            Arc::clone(&self.alerts)
        }
    }

    impl TelemetrySink for RecordingSink {
        fn update_realtime(&mut self, _snapshot: &RealtimeSnapshot) {}

        fn add_message(&mut self, _message: &str, _severity: Severity) {}

        fn add_alert(&mut self, kind: &str, level: u8, _duration_secs: f64) {
            self.alerts.lock().unwrap().push((kind.to_string(), level));
        }

        fn update_session(&mut self, _perclos_average: f64) {}

        fn finalize(&mut self, _perclos_average: f64) {}
    }

    #[test]
    fn test_nominal_frames() {
        let base = Instant::now();
        let mut eval = evaluator();

        let status = eval.process(&sample(base, 0.30, 0.0, 0.0));
        assert_eq!(status, MonitorStatus::Nominal);
        assert_eq!(eval.eyes_state(), ChannelState::Inactive);
    }

    #[test]
    fn test_eyes_closing_then_alert() {
        let base = Instant::now();
        let mut eval = evaluator();

        let status = eval.process(&sample(base, 0.10, 0.0, 0.0));
        assert!(matches!(status, MonitorStatus::EyesClosing { .. }));
        assert_eq!(eval.eyes_state(), ChannelState::Sustained);

        let status = eval.process(&sample(base + secs(2.0), 0.10, 0.0, 0.0));
        assert!(matches!(status, MonitorStatus::EyesAlert { .. }));
        assert_eq!(eval.eyes_state(), ChannelState::Alerting);
    }

    #[test]
    fn test_face_lost_during_critical_resets_and_stops_siren() {
        let base = Instant::now();
        let sounds = Arc::new(CountingAlertSystem::default());
        let mut eval = FrameEvaluator::new(
            MonitorConfig::default(),
            Arc::clone(&sounds) as Arc<dyn AlertSystem>,
            Box::new(NullSink),
        )
        .unwrap();

        // Drive the eyes channel into CRITICAL
        eval.process(&sample(base, 0.10, 0.0, 0.0));
        eval.process(&sample(base + secs(2.0), 0.10, 0.0, 0.0));
        eval.process(&sample(base + secs(12.5), 0.10, 0.0, 0.0));
        assert_eq!(eval.eyes_state(), ChannelState::Critical);
        assert_eq!(sounds.siren_starts.load(Ordering::SeqCst), 1);

        // One frame without a face
        let status = eval.process(&SignalSample {
            now: base + secs(12.6),
            ear: 0.0,
            pitch: 0.0,
            yaw: 0.0,
            face_present: false,
        });
        assert_eq!(status, MonitorStatus::FaceLost);
        assert_eq!(eval.eyes_state(), ChannelState::Inactive);
        assert_eq!(sounds.siren_stops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_head_down_alert_level_one() {
        let base = Instant::now();
        let mut eval = FrameEvaluator::new(
            MonitorConfig::default(),
            Arc::new(NullAlertSystem),
            Box::new(RecordingSink::default()),
        )
        .unwrap();

        eval.process(&sample(base, 0.30, -25.0, 0.0));
        let status = eval.process(&sample(base + secs(2.5), 0.30, -25.0, 0.0));
        assert!(matches!(status, MonitorStatus::HeadDownAlert { .. }));
        assert_eq!(eval.head_down_state(), ChannelState::Alerting);
    }

    #[test]
    fn test_sway_alert_via_oscillation() {
        let base = Instant::now();
        let mut eval = evaluator();

        // Oscillate yaw past the movement threshold every 0.8s
        let mut status = MonitorStatus::Nominal;
        for i in 0..8 {
            let yaw = if i % 2 == 0 { 15.0 } else { -15.0 };
            status = eval.process(&sample(base + secs(i as f64 * 0.8), 0.30, 0.0, yaw));
        }

        assert!(matches!(status, MonitorStatus::HeadSwayAlert { .. }));
        assert_eq!(eval.head_sway_state(), ChannelState::Alerting);
    }

    #[test]
    fn test_combined_status_priority() {
        let base = Instant::now();
        let mut eval = evaluator();

        // Eyes closed while head is down, both past their triggers
        eval.process(&sample(base, 0.10, -25.0, 0.0));
        let status = eval.process(&sample(base + secs(2.5), 0.10, -25.0, 0.0));
        assert_eq!(status, MonitorStatus::EyesAndHeadDown);
    }

    #[test]
    fn test_alert_history_records_trigger_and_critical() {
        let base = Instant::now();
        let sink = RecordingSink::default();
        let recorded = sink.handle();
        let mut eval = FrameEvaluator::new(
            MonitorConfig::default(),
            Arc::new(NullAlertSystem),
            Box::new(sink),
        )
        .unwrap();

        eval.process(&sample(base, 0.10, 0.0, 0.0));
        eval.process(&sample(base + secs(2.0), 0.10, 0.0, 0.0));
        eval.process(&sample(base + secs(12.5), 0.10, 0.0, 0.0));
        assert_eq!(eval.eyes_state(), ChannelState::Critical);

        let alerts = recorded.lock().unwrap().clone();
        assert_eq!(
            alerts,
            vec![
                ("eyes closed".to_string(), 2),
                ("eyes closed - critical".to_string(), 3),
            ]
        );
    }

    #[test]
    fn test_swaying_substatus_before_alert() {
        let base = Instant::now();
        let mut eval = evaluator();

        eval.process(&sample(base, 0.30, 0.0, 15.0));
        let status = eval.process(&sample(base + secs(0.5), 0.30, 0.0, -15.0));
        assert!(matches!(status, MonitorStatus::Swaying { reversals: 1 }));
    }
}
