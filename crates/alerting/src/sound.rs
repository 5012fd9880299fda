//! Alarm sound collaborator
//!
//! The core only issues commands; playback runs on independent
//! fire-and-forget tasks that never stall the per-frame evaluation loop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tracing::{debug, info, warn};

/// Alarm sound device commands.
///
/// `start_continuous_beep` is idempotent and `stop_continuous_beep` is safe
/// to call while no siren is running. `say_async` returns whether the
/// utterance was queued; a request while speech is in flight is dropped
/// unless `force` is set.
pub trait AlertSystem: Send + Sync {
    /// Fire one discrete, non-blocking beep
    fn beep(&self, frequency: u32, duration_ms: u64);

    /// Begin an indefinite repeating tone until stopped
    fn start_continuous_beep(&self, frequency: u32);

    /// Stop the continuous tone
    fn stop_continuous_beep(&self);

    /// Request speech playback; returns false when suppressed
    fn say_async(&self, text: &str, force: bool) -> bool;
}

/// Tokio-task-backed implementation that renders every command through
/// `tracing` instead of a real audio device. Device failures cannot occur
/// here; a hardware-backed implementation must swallow its own errors the
/// same way so the evaluation loop never observes them.
pub struct ConsoleAlertSystem {
    siren_active: Arc<AtomicBool>,
    speaking: Arc<AtomicBool>,
    handle: Handle,
}

impl ConsoleAlertSystem {
    /// Create from the current tokio runtime
    pub fn new() -> Self {
        Self::with_handle(Handle::current())
    }

    /// Create with an explicit runtime handle
    pub fn with_handle(handle: Handle) -> Self {
        Self {
            siren_active: Arc::new(AtomicBool::new(false)),
            speaking: Arc::new(AtomicBool::new(false)),
            handle,
        }
    }

    /// True while the continuous siren task is running
    pub fn siren_active(&self) -> bool {
        self.siren_active.load(Ordering::SeqCst)
    }
}

impl AlertSystem for ConsoleAlertSystem {
    fn beep(&self, frequency: u32, duration_ms: u64) {
        self.handle.spawn(async move {
            debug!(frequency, duration_ms, "beep");
            tokio::time::sleep(Duration::from_millis(duration_ms)).await;
        });
    }

    fn start_continuous_beep(&self, frequency: u32) {
        // Already running: no-op
        if self.siren_active.swap(true, Ordering::SeqCst) {
            return;
        }
        let active = Arc::clone(&self.siren_active);
        self.handle.spawn(async move {
            warn!(frequency, "continuous siren engaged");
            while active.load(Ordering::SeqCst) {
                tokio::time::sleep(Duration::from_millis(250)).await;
            }
            info!("continuous siren stopped");
        });
    }

    fn stop_continuous_beep(&self) {
        self.siren_active.store(false, Ordering::SeqCst);
    }

    fn say_async(&self, text: &str, force: bool) -> bool {
        if !force && self.speaking.load(Ordering::SeqCst) {
            debug!(%text, "voice request suppressed, already speaking");
            return false;
        }
        self.speaking.store(true, Ordering::SeqCst);

        let speaking = Arc::clone(&self.speaking);
        let text = text.to_string();
        self.handle.spawn(async move {
            info!(%text, "voice alert");
            // Rough playback time at a normal speech rate
            let playback = Duration::from_millis(60 * text.len() as u64);
            tokio::time::sleep(playback).await;
            speaking.store(false, Ordering::SeqCst);
        });
        true
    }
}

/// No-op implementation for headless runs and tests
#[derive(Debug, Default, Clone, Copy)]
pub struct NullAlertSystem;

impl AlertSystem for NullAlertSystem {
    fn beep(&self, _frequency: u32, _duration_ms: u64) {}

    fn start_continuous_beep(&self, _frequency: u32) {}

    fn stop_continuous_beep(&self) {}

    fn say_async(&self, _text: &str, _force: bool) -> bool {
        true
    }
}
