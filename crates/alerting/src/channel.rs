//! Alert channel escalation state machine

use crate::policy::{EscalationPolicy, PolicyError};
use crate::sound::AlertSystem;
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Escalation tier of a channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelState {
    /// Condition not active
    Inactive,
    /// Condition active but shorter than the trigger duration
    Sustained,
    /// Alarm running: escalating beep cadence plus repeated voice
    Alerting,
    /// Continuous siren engaged
    Critical,
}

/// The monitored condition a channel is bound to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelKind {
    Eyes,
    HeadSway,
    HeadDown,
}

impl ChannelKind {
    /// Telemetry label for this channel
    pub fn label(&self) -> &'static str {
        match self {
            Self::Eyes => "eyes closed",
            Self::HeadSway => "head sway",
            Self::HeadDown => "head down",
        }
    }

    /// Telemetry alert level for the first (non-critical) alert
    pub fn alert_level(&self) -> u8 {
        match self {
            Self::Eyes | Self::HeadSway => 2,
            Self::HeadDown => 1,
        }
    }
}

/// State transition observed during one evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelTransition {
    /// First alert fired (SUSTAINED -> ALERTING)
    Triggered { elapsed: Duration },
    /// Continuous siren engaged (ALERTING -> CRITICAL)
    Escalated { elapsed: Duration },
    /// Alarm cleared (ALERTING/CRITICAL -> INACTIVE)
    Cleared,
}

/// Escalation state machine for one monitored condition.
///
/// Driven once per frame with a boolean condition signal; converts the
/// condition's elapsed duration into beep, voice, and siren commands on the
/// [`AlertSystem`] collaborator. Beep and voice cadences are independent and
/// may both fire in the same frame.
#[derive(Debug)]
pub struct AlertChannel {
    kind: ChannelKind,
    policy: EscalationPolicy,
    state: ChannelState,
    condition_start: Option<Instant>,
    last_beep: Option<Instant>,
    last_voice: Option<Instant>,
    continuous_mode: bool,
}

impl AlertChannel {
    /// Create a channel, rejecting invalid policies
    pub fn new(kind: ChannelKind, policy: EscalationPolicy) -> Result<Self, PolicyError> {
        policy.validate()?;
        Ok(Self {
            kind,
            policy,
            state: ChannelState::Inactive,
            condition_start: None,
            last_beep: None,
            last_voice: None,
            continuous_mode: false,
        })
    }

    /// Current escalation tier
    pub fn state(&self) -> ChannelState {
        self.state
    }

    /// The condition this channel is bound to
    pub fn kind(&self) -> ChannelKind {
        self.kind
    }

    /// True while an alarm is running (ALERTING or CRITICAL)
    pub fn is_alerting(&self) -> bool {
        matches!(self.state, ChannelState::Alerting | ChannelState::Critical)
    }

    /// True while the continuous siren is engaged
    pub fn in_continuous_mode(&self) -> bool {
        self.continuous_mode
    }

    /// How long the condition has been continuously active
    pub fn condition_elapsed(&self, now: Instant) -> Duration {
        self.condition_start
            .map(|start| now.saturating_duration_since(start))
            .unwrap_or(Duration::ZERO)
    }

    /// Drive the state machine with this frame's condition signal.
    ///
    /// Returns the transition observed this frame, if any.
    pub fn evaluate(
        &mut self,
        condition_active: bool,
        now: Instant,
        alerts: &dyn AlertSystem,
    ) -> Option<ChannelTransition> {
        if !condition_active {
            return self.deactivate(alerts);
        }

        if self.state == ChannelState::Inactive {
            self.state = ChannelState::Sustained;
            self.condition_start = Some(now);
        }
        let start = *self.condition_start.get_or_insert(now);
        let elapsed = now.saturating_duration_since(start);

        match self.state {
            ChannelState::Inactive => None,
            ChannelState::Sustained => {
                if elapsed >= self.policy.trigger_duration {
                    self.fire_first_alert(now, alerts);
                    self.state = ChannelState::Alerting;
                    Some(ChannelTransition::Triggered { elapsed })
                } else {
                    None
                }
            }
            ChannelState::Alerting => {
                if let Some(critical) = self.policy.critical_duration {
                    if elapsed >= critical && !self.continuous_mode {
                        self.engage_siren(now, alerts);
                        self.state = ChannelState::Critical;
                        return Some(ChannelTransition::Escalated { elapsed });
                    }
                }
                self.run_beep_cadence(elapsed, now, alerts);
                self.run_voice_cadence(now, alerts);
                None
            }
            ChannelState::Critical => {
                // Siren runs independently; only the voice cadence remains
                self.run_voice_cadence(now, alerts);
                None
            }
        }
    }

    /// Force the channel INACTIVE regardless of its timers (face lost)
    pub fn force_inactive(&mut self, alerts: &dyn AlertSystem) -> Option<ChannelTransition> {
        self.deactivate(alerts)
    }

    fn deactivate(&mut self, alerts: &dyn AlertSystem) -> Option<ChannelTransition> {
        if self.state == ChannelState::Inactive {
            return None;
        }
        let was_alerting = self.is_alerting();
        if self.continuous_mode {
            alerts.stop_continuous_beep();
        }
        self.state = ChannelState::Inactive;
        self.condition_start = None;
        self.last_beep = None;
        self.last_voice = None;
        self.continuous_mode = false;

        if was_alerting {
            info!(channel = self.kind.label(), "alarm cleared");
            Some(ChannelTransition::Cleared)
        } else {
            None
        }
    }

    fn fire_first_alert(&mut self, now: Instant, alerts: &dyn AlertSystem) {
        info!(channel = self.kind.label(), "alarm triggered");
        alerts.say_async(&self.policy.first_message, true);
        alerts.beep(
            self.policy.first_beep.frequency,
            self.policy.first_beep.duration_ms,
        );
        self.last_beep = Some(now);
        self.last_voice = Some(now);
    }

    fn engage_siren(&mut self, now: Instant, alerts: &dyn AlertSystem) {
        warn!(channel = self.kind.label(), "critical tier, siren engaged");
        alerts.start_continuous_beep(self.policy.critical_frequency);
        alerts.say_async(&self.policy.critical_message, true);
        self.continuous_mode = true;
        self.last_voice = Some(now);
    }

    fn run_beep_cadence(&mut self, elapsed: Duration, now: Instant, alerts: &dyn AlertSystem) {
        let bucket = *self.policy.bucket_for(elapsed);
        let due = match self.last_beep {
            Some(last) => now.saturating_duration_since(last) >= bucket.interval,
            None => true,
        };
        if due {
            debug!(
                channel = self.kind.label(),
                frequency = bucket.beep.frequency,
                "cadence beep"
            );
            alerts.beep(bucket.beep.frequency, bucket.beep.duration_ms);
            self.last_beep = Some(now);
        }
    }

    fn run_voice_cadence(&mut self, now: Instant, alerts: &dyn AlertSystem) {
        let due = match self.last_voice {
            Some(last) => now.saturating_duration_since(last) >= self.policy.voice_repeat_interval,
            None => true,
        };
        if due {
            let message = if self.continuous_mode {
                &self.policy.critical_message
            } else {
                &self.policy.repeat_message
            };
            alerts.say_async(message, true);
            self.last_voice = Some(now);
        }
    }
}
