//! PERCLOS estimation over a trailing window

use crate::VigilanceError;
use sliding_window::SlidingWindow;
use std::time::{Duration, Instant};

/// PERCLOS (Percentage of Eye Closure) estimator.
///
/// Tracks per-frame closed/open samples over a trailing window and reports
/// the closed fraction. Reporting only; it never gates an alert.
#[derive(Debug, Clone)]
pub struct PerclosEstimator {
    window: SlidingWindow<bool>,
}

impl PerclosEstimator {
    /// Default trailing window (60 seconds)
    pub const DEFAULT_HORIZON: Duration = Duration::from_secs(60);

    /// Create an estimator with the given trailing window
    pub fn new(horizon: Duration) -> Result<Self, VigilanceError> {
        Ok(Self {
            window: SlidingWindow::new(horizon)?,
        })
    }

    /// Record one frame's eye state
    pub fn update(&mut self, now: Instant, eye_closed: bool) {
        self.window.push(now, eye_closed);
    }

    /// Closed fraction over the trailing window, in [0, 1].
    /// Returns 0.0 when no samples have been recorded.
    pub fn value(&self) -> f64 {
        if self.window.is_empty() {
            return 0.0;
        }
        let closed = self.window.count_where(|&c| c);
        closed as f64 / self.window.len() as f64
    }

    /// Number of samples currently in the window
    pub fn sample_count(&self) -> usize {
        self.window.len()
    }
}

impl Default for PerclosEstimator {
    fn default() -> Self {
        Self {
            window: SlidingWindow::new(Self::DEFAULT_HORIZON)
                .expect("default horizon is positive"),
        }
    }
}
