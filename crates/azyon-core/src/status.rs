//! Transient status-bar messages.

use std::time::{Duration, Instant};

/// How long a message stays on screen.
pub const MESSAGE_TIMEOUT: Duration = Duration::from_secs(2);

/// A message shown in the status bar until it expires.
///
/// Expiry is polled once per render tick; there is no timer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    text: String,
    shown_at: Instant,
}

impl StatusMessage {
    pub fn new(text: impl Into<String>, shown_at: Instant) -> Self {
        Self {
            text: text.into(),
            shown_at,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.shown_at) >= MESSAGE_TIMEOUT
    }
}
