//! Unified monitor status

use serde::Serialize;
use std::fmt;

/// Combined session status, derived by strict priority from the three
/// alert channels and the sub-threshold condition signals.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum MonitorStatus {
    /// Eyes and head-sway alarms both running
    CriticalCombined,
    /// Eyes and head-down alarms both running
    EyesAndHeadDown,
    /// Eyes alarm running
    EyesAlert { closed_secs: f64 },
    /// Head-sway alarm running
    HeadSwayAlert { reversals: u32 },
    /// Head-down alarm running
    HeadDownAlert { down_secs: f64 },
    /// Eyes closed but below the trigger duration
    EyesClosing { closed_secs: f64 },
    /// Head down but below the trigger duration
    HeadLowering { down_secs: f64 },
    /// Head reversals accumulating but not yet drowsy sway
    Swaying { reversals: u32 },
    /// Face tracking lost; all alarms reset
    FaceLost,
    /// Nothing to report
    Nominal,
}

impl MonitorStatus {
    /// True for any state with a running alarm
    pub fn is_alert(&self) -> bool {
        matches!(
            self,
            Self::CriticalCombined
                | Self::EyesAndHeadDown
                | Self::EyesAlert { .. }
                | Self::HeadSwayAlert { .. }
                | Self::HeadDownAlert { .. }
        )
    }
}

impl fmt::Display for MonitorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CriticalCombined => write!(f, "CRITICAL DANGER"),
            Self::EyesAndHeadDown => write!(f, "DANGER - eyes closed + head down"),
            Self::EyesAlert { closed_secs } => write!(f, "EYES ALERT ({closed_secs:.1}s)"),
            Self::HeadSwayAlert { reversals } => write!(f, "HEAD ALERT ({reversals} reversals)"),
            Self::HeadDownAlert { down_secs } => write!(f, "HEAD DOWN ({down_secs:.1}s)"),
            Self::EyesClosing { closed_secs } => write!(f, "eyes closing... {closed_secs:.1}s"),
            Self::HeadLowering { down_secs } => write!(f, "head lowering... {down_secs:.1}s"),
            Self::Swaying { reversals } => write!(f, "head moving... {reversals} reversals"),
            Self::FaceLost => write!(f, "face not detected"),
            Self::Nominal => write!(f, "OK"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alert_classification() {
        assert!(MonitorStatus::CriticalCombined.is_alert());
        assert!(MonitorStatus::EyesAlert { closed_secs: 2.0 }.is_alert());
        assert!(!MonitorStatus::EyesClosing { closed_secs: 0.5 }.is_alert());
        assert!(!MonitorStatus::FaceLost.is_alert());
        assert!(!MonitorStatus::Nominal.is_alert());
    }

    #[test]
    fn test_display_text() {
        let status = MonitorStatus::EyesAlert { closed_secs: 3.25 };
        assert_eq!(status.to_string(), "EYES ALERT (3.2s)");
        assert_eq!(MonitorStatus::Nominal.to_string(), "OK");
    }
}
