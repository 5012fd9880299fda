//! Alerting System
//!
//! Parameterized escalation state machines that turn per-frame condition
//! signals into graded alarm actions: discrete beeps with a tightening
//! cadence, repeated voice messages, and a continuous siren past the
//! critical threshold.

mod channel;
mod policy;
mod sound;

pub use channel::{AlertChannel, ChannelKind, ChannelState, ChannelTransition};
pub use policy::{Beep, BeepBucket, EscalationPolicy, PolicyError};
pub use sound::{AlertSystem, ConsoleAlertSystem, NullAlertSystem};
