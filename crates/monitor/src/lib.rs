//! Drowsiness Monitor
//!
//! Per-frame evaluation loop tying the vigilance estimators to the three
//! escalating alert channels (eyes-closed, head-sway, head-down) and
//! deriving the unified session status.

mod config;
mod evaluator;
mod status;

pub use config::MonitorConfig;
pub use evaluator::{FrameEvaluator, SignalSample};
pub use status::MonitorStatus;

use thiserror::Error;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Monitor construction errors, fatal at startup
#[derive(Debug, Error)]
pub enum MonitorError {
    /// Threshold or window outside its valid range
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration file or environment could not be read
    #[error("configuration source error: {0}")]
    ConfigSource(#[from] ::config::ConfigError),

    /// Estimator construction failed
    #[error(transparent)]
    Vigilance(#[from] vigilance::VigilanceError),

    /// Alert policy rejected
    #[error(transparent)]
    Policy(#[from] alerting::PolicyError),
}

/// Initialize the global tracing subscriber
pub fn init_logging() {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}
