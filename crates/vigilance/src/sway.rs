//! Head-sway oscillation detection
//!
//! Drowsy head-bobbing is characterized by repeated direction reversals
//! over a short horizon, which distinguishes it from a single deliberate
//! head turn. The detector therefore counts reversals, not displacement.

use crate::VigilanceError;
use serde::Serialize;
use sliding_window::SlidingWindow;
use std::time::{Duration, Instant};
use tracing::debug;

/// Instantaneous head direction classified from pitch/yaw angles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HeadDirection {
    Center,
    Left,
    Right,
    Up,
    Down,
}

impl HeadDirection {
    /// Classify from head angles. Yaw takes priority over pitch when both
    /// exceed the threshold.
    pub fn classify(pitch: f64, yaw: f64, threshold: f64) -> Self {
        if yaw.abs() > threshold {
            if yaw > 0.0 {
                Self::Right
            } else {
                Self::Left
            }
        } else if pitch.abs() > threshold {
            if pitch > 0.0 {
                Self::Down
            } else {
                Self::Up
            }
        } else {
            Self::Center
        }
    }
}

/// Head-sway detector configuration
#[derive(Debug, Clone)]
pub struct SwayConfig {
    /// Rotation (degrees) beyond which a direction counts as a movement
    pub threshold_degrees: f64,
    /// Trailing window over which movements are retained
    pub window: Duration,
    /// Direction reversals required to qualify as drowsy sway
    pub min_reversals: u32,
    /// Minimum unbroken episode length to qualify as drowsy sway
    pub drowsy_duration: Duration,
    /// Centered idle gap after which the episode is considered over
    pub idle_reset: Duration,
}

impl Default for SwayConfig {
    fn default() -> Self {
        Self {
            threshold_degrees: 12.0,
            window: Duration::from_secs(6),
            min_reversals: 4,
            drowsy_duration: Duration::from_secs(3),
            idle_reset: Duration::from_secs(2),
        }
    }
}

/// Reversal statistics for display and export
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwayStats {
    pub direction_changes: u32,
    pub episode_duration: Duration,
}

/// Detects drowsy head sway by counting direction reversals within an
/// unbroken movement episode.
#[derive(Debug)]
pub struct HeadSwayDetector {
    window: SlidingWindow<(f64, f64, HeadDirection)>,
    config: SwayConfig,
    last_direction: Option<HeadDirection>,
    direction_changes: u32,
    episode_start: Option<Instant>,
    last_update: Option<Instant>,
}

impl HeadSwayDetector {
    /// Create a detector, rejecting degenerate configuration
    pub fn new(config: SwayConfig) -> Result<Self, VigilanceError> {
        if config.threshold_degrees <= 0.0 {
            return Err(VigilanceError::InvalidThreshold(config.threshold_degrees));
        }
        if config.min_reversals == 0 {
            return Err(VigilanceError::InvalidReversalCount);
        }
        Ok(Self {
            window: SlidingWindow::new(config.window)?,
            config,
            last_direction: None,
            direction_changes: 0,
            episode_start: None,
            last_update: None,
        })
    }

    /// Feed one frame's head angles and return the classified direction
    pub fn update(&mut self, now: Instant, pitch: f64, yaw: f64) -> HeadDirection {
        let direction = HeadDirection::classify(pitch, yaw, self.config.threshold_degrees);

        // A reversal is a non-center direction differing from the last
        // non-center direction seen.
        if direction != HeadDirection::Center {
            if let Some(last) = self.last_direction {
                if direction != last {
                    self.direction_changes += 1;
                    if self.episode_start.is_none() {
                        self.episode_start = Some(now);
                    }
                }
            }
        }

        self.window.push(now, (pitch, yaw, direction));

        // A long centered gap since the previous frame ends the episode.
        if let Some(last_update) = self.last_update {
            if now.saturating_duration_since(last_update) > self.config.idle_reset
                && direction == HeadDirection::Center
            {
                if self.direction_changes > 0 {
                    debug!("idle gap while centered, sway episode reset");
                }
                self.direction_changes = 0;
                self.episode_start = None;
            }
        }

        if direction != HeadDirection::Center {
            self.last_direction = Some(direction);
        }

        self.last_update = Some(now);
        direction
    }

    /// True when the reversal pattern qualifies as drowsy sway
    pub fn is_drowsy(&self, now: Instant) -> bool {
        let Some(start) = self.episode_start else {
            return false;
        };
        if self.window.is_empty() {
            return false;
        }
        self.direction_changes >= self.config.min_reversals
            && now.saturating_duration_since(start) >= self.config.drowsy_duration
    }

    /// Reversal count and current episode duration
    pub fn stats(&self, now: Instant) -> SwayStats {
        let episode_duration = self
            .episode_start
            .map(|start| now.saturating_duration_since(start))
            .unwrap_or(Duration::ZERO);
        SwayStats {
            direction_changes: self.direction_changes,
            episode_duration,
        }
    }

    /// Reversal count accumulated in the current episode
    pub fn direction_changes(&self) -> u32 {
        self.direction_changes
    }

    /// Clear all counters (called when face tracking is lost)
    pub fn reset(&mut self) {
        self.direction_changes = 0;
        self.episode_start = None;
        self.last_direction = None;
    }
}
