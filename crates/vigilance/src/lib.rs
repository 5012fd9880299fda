//! Vigilance Estimators
//!
//! Sliding-window drowsiness metrics computed from per-frame signals:
//! - PERCLOS (fraction of eye-closure time over a trailing window)
//! - Head-sway oscillation detection (direction-reversal counting)

mod perclos;
mod sway;

pub use perclos::PerclosEstimator;
pub use sway::{HeadDirection, HeadSwayDetector, SwayConfig, SwayStats};

use thiserror::Error;

/// Estimator configuration errors
#[derive(Debug, Clone, Error, PartialEq)]
pub enum VigilanceError {
    /// Invalid window horizon
    #[error(transparent)]
    Window(#[from] sliding_window::WindowError),

    /// Angle threshold must be strictly positive
    #[error("movement threshold {0} degrees is not positive")]
    InvalidThreshold(f64),

    /// Sway qualification needs at least one reversal
    #[error("minimum reversal count must be at least 1")]
    InvalidReversalCount,
}
