//! Escalation policy definitions

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Policy configuration errors, fatal at channel construction
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PolicyError {
    /// A policy needs at least one beep bucket
    #[error("policy has no beep buckets")]
    NoBuckets,

    /// Bucket upper bounds must strictly increase
    #[error("beep bucket {0} does not increase the previous upper bound")]
    UnorderedBuckets(usize),

    /// The condition must alert before it can escalate
    #[error("trigger duration must be shorter than critical duration")]
    TriggerBeyondCritical,

    /// Voice repetition interval must be positive
    #[error("voice repeat interval must be positive")]
    InvalidVoiceInterval,
}

/// A single discrete beep command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Beep {
    /// Tone frequency in Hz
    pub frequency: u32,
    /// Tone length in milliseconds
    pub duration_ms: u64,
}

/// One cadence tier of the escalating beep pattern.
///
/// Applies while the condition has been active for less than `upper_bound`;
/// buckets are ordered so the cadence tightens as the condition persists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BeepBucket {
    /// Elapsed-time bound (exclusive) up to which this tier applies
    pub upper_bound: Duration,
    /// Minimum spacing between beeps in this tier
    pub interval: Duration,
    /// Beep emitted in this tier
    pub beep: Beep,
}

impl BeepBucket {
    pub fn new(upper_bound: Duration, interval: Duration, frequency: u32, duration_ms: u64) -> Self {
        Self {
            upper_bound,
            interval,
            beep: Beep {
                frequency,
                duration_ms,
            },
        }
    }
}

/// Per-channel escalation parameters
#[derive(Debug, Clone)]
pub struct EscalationPolicy {
    /// Time the condition must hold before the first alert
    pub trigger_duration: Duration,
    /// Time in ALERTING before switching to the continuous siren.
    /// `None` means the channel never escalates past ALERTING.
    pub critical_duration: Option<Duration>,
    /// Beep cadence tiers, strictly increasing upper bounds
    pub buckets: Vec<BeepBucket>,
    /// Spacing between repeated voice messages
    pub voice_repeat_interval: Duration,
    /// Spoken on the first alert
    pub first_message: String,
    /// Spoken on the repeat cadence while ALERTING
    pub repeat_message: String,
    /// Spoken on entering CRITICAL and on the repeat cadence thereafter
    pub critical_message: String,
    /// Beep fired together with the first alert
    pub first_beep: Beep,
    /// Continuous siren frequency in CRITICAL
    pub critical_frequency: u32,
}

impl EscalationPolicy {
    /// Validate the policy invariants
    pub fn validate(&self) -> Result<(), PolicyError> {
        if self.buckets.is_empty() {
            return Err(PolicyError::NoBuckets);
        }
        for (i, pair) in self.buckets.windows(2).enumerate() {
            if pair[1].upper_bound <= pair[0].upper_bound {
                return Err(PolicyError::UnorderedBuckets(i + 1));
            }
        }
        if let Some(critical) = self.critical_duration {
            if self.trigger_duration >= critical {
                return Err(PolicyError::TriggerBeyondCritical);
            }
        }
        if self.voice_repeat_interval.is_zero() {
            return Err(PolicyError::InvalidVoiceInterval);
        }
        Ok(())
    }

    /// Select the cadence tier for an elapsed condition time.
    ///
    /// First bucket whose upper bound is not yet reached; exactly at a
    /// boundary the next (faster) bucket applies. Falls back to the last
    /// bucket when elapsed time runs past every bound.
    pub fn bucket_for(&self, elapsed: Duration) -> &BeepBucket {
        self.buckets
            .iter()
            .find(|b| elapsed < b.upper_bound)
            .unwrap_or_else(|| {
                self.buckets
                    .last()
                    .expect("validated policy has at least one bucket")
            })
    }

    /// Eyes-closed channel: alert after 1.5s, siren after 12s
    pub fn eyes() -> Self {
        Self {
            trigger_duration: Duration::from_secs_f64(1.5),
            critical_duration: Some(Duration::from_secs(12)),
            buckets: vec![
                BeepBucket::new(secs(3.0), secs(1.0), 2500, 200),
                BeepBucket::new(secs(5.0), secs(0.5), 2500, 250),
                BeepBucket::new(secs(8.0), secs(0.2), 2600, 150),
                BeepBucket::new(secs(12.0), secs(0.1), 2700, 90),
            ],
            voice_repeat_interval: secs(5.0),
            first_message: "Warning! Your eyes are closed! Wake up!".into(),
            repeat_message: "Alert! Your eyes are still closed! Pull over immediately!".into(),
            critical_message: "Critical danger! Wake up right now!".into(),
            first_beep: Beep {
                frequency: 2000,
                duration_ms: 300,
            },
            critical_frequency: 2800,
        }
    }

    /// Head-sway channel: the condition is already time-gated upstream by
    /// the sway detector, so it alerts immediately; siren after 16s
    pub fn head_sway() -> Self {
        Self {
            trigger_duration: Duration::ZERO,
            critical_duration: Some(Duration::from_secs(16)),
            buckets: vec![
                BeepBucket::new(secs(5.0), secs(1.0), 1800, 200),
                BeepBucket::new(secs(8.0), secs(0.5), 1900, 250),
                BeepBucket::new(secs(12.0), secs(0.2), 2000, 150),
                BeepBucket::new(secs(16.0), secs(0.1), 2100, 90),
            ],
            voice_repeat_interval: secs(5.0),
            first_message: "Warning! You are drowsy! Your head is swaying! Take a break!".into(),
            repeat_message: "Danger! You are still drowsy! Stop the vehicle now!".into(),
            critical_message: "Critical danger! Wake up right now!".into(),
            first_beep: Beep {
                frequency: 1500,
                duration_ms: 300,
            },
            critical_frequency: 2200,
        }
    }

    /// Head-down channel: alert after 2s, fixed repeat cadence, no siren
    pub fn head_down() -> Self {
        Self {
            trigger_duration: Duration::from_secs(2),
            critical_duration: None,
            buckets: vec![BeepBucket::new(Duration::MAX, secs(1.5), 2200, 200)],
            voice_repeat_interval: secs(5.0),
            first_message: "Warning! Your head is down! Look up!".into(),
            repeat_message: "Raise your head! You are falling asleep!".into(),
            critical_message: "Raise your head! You are falling asleep!".into(),
            first_beep: Beep {
                frequency: 2200,
                duration_ms: 300,
            },
            critical_frequency: 2200,
        }
    }
}

fn secs(s: f64) -> Duration {
    Duration::from_secs_f64(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stock_policies_valid() {
        assert!(EscalationPolicy::eyes().validate().is_ok());
        assert!(EscalationPolicy::head_sway().validate().is_ok());
        assert!(EscalationPolicy::head_down().validate().is_ok());
    }

    #[test]
    fn test_rejects_empty_buckets() {
        let mut policy = EscalationPolicy::eyes();
        policy.buckets.clear();
        assert_eq!(policy.validate(), Err(PolicyError::NoBuckets));
    }

    #[test]
    fn test_rejects_unordered_buckets() {
        let mut policy = EscalationPolicy::eyes();
        policy.buckets.swap(1, 2);
        assert_eq!(policy.validate(), Err(PolicyError::UnorderedBuckets(2)));
    }

    #[test]
    fn test_rejects_trigger_beyond_critical() {
        let mut policy = EscalationPolicy::eyes();
        policy.trigger_duration = Duration::from_secs(12);
        assert_eq!(policy.validate(), Err(PolicyError::TriggerBeyondCritical));
    }

    #[test]
    fn test_bucket_boundary_falls_to_faster_tier() {
        let policy = EscalationPolicy::eyes();

        assert_eq!(policy.bucket_for(secs(2.9)).interval, secs(1.0));
        // Exactly at the 3s boundary the next tier applies
        assert_eq!(policy.bucket_for(secs(3.0)).interval, secs(0.5));
        assert_eq!(policy.bucket_for(secs(7.9)).interval, secs(0.2));
        assert_eq!(policy.bucket_for(secs(11.0)).interval, secs(0.1));
        // Past every bound, the last tier keeps applying
        assert_eq!(policy.bucket_for(secs(40.0)).interval, secs(0.1));
    }
}
