//! Sliding Window Buffer
//!
//! Time-bounded FIFO buffer for per-frame signal history. Entries older
//! than the retention horizon are evicted lazily on every push.

mod window;

pub use window::SlidingWindow;

use thiserror::Error;

/// Errors during window construction
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WindowError {
    /// Retention horizon must be strictly positive
    #[error("retention horizon must be positive")]
    InvalidHorizon,
}
