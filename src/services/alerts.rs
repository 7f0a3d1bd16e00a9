//! Fire-and-forget device feedback (speech and haptics).
//!
//! Implementations must never fail: a device without speech or vibration
//! support behaves like [`NoopAlerts`]. A new utterance replaces whatever is
//! currently being spoken.

use std::sync::Mutex;

pub trait AlertSink: Send + Sync {
    fn speak(&self, text: &str);
    fn vibrate(&self, pattern_ms: &[u64]);
}

/// Device without speech or haptics.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopAlerts;

impl AlertSink for NoopAlerts {
    fn speak(&self, _text: &str) {}
    fn vibrate(&self, _pattern_ms: &[u64]) {}
}

/// Writes alerts to the log. Used by the simulator.
#[derive(Debug, Default)]
pub struct TracingAlerts {
    speaking: Mutex<Option<String>>,
}

impl TracingAlerts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Utterance currently "playing"
    pub fn current_utterance(&self) -> Option<String> {
        self.speaking.lock().ok().and_then(|s| s.clone())
    }
}

impl AlertSink for TracingAlerts {
    fn speak(&self, text: &str) {
        if let Ok(mut speaking) = self.speaking.lock() {
            if let Some(previous) = speaking.replace(text.to_string()) {
                tracing::debug!(cancelled = %previous, "Cancelled previous announcement");
            }
        }
        tracing::info!(text = %text, "Voice announcement");
    }

    fn vibrate(&self, pattern_ms: &[u64]) {
        tracing::info!(pattern = ?pattern_ms, "Vibration");
    }
}
