//! Tunables for board sessions and the in-memory authority.

use std::time::Duration;

/// Board session configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoardConfig {
    /// How long a status-change request may take before it counts as failed.
    pub request_timeout: Duration,
    /// Failure notices kept per session; the oldest are dropped first.
    ///
    /// Zero turns notices off: refused moves are still rolled back and
    /// logged, but nothing is queued for [`take_notices`].
    ///
    /// [`take_notices`]: super::BoardSession::take_notices
    pub max_notices: usize,
    /// Push events buffered per subscriber before it is reported as lagging.
    pub event_buffer: usize,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(10),
            max_notices: 32,
            event_buffer: 256,
        }
    }
}

impl BoardConfig {
    /// Creates a configuration that gives up on slow requests quickly.
    ///
    /// Useful for tests and for clients on flaky links that prefer an early
    /// rollback to a long wait.
    #[must_use]
    pub const fn impatient() -> Self {
        Self {
            request_timeout: Duration::from_millis(250),
            max_notices: 8,
            event_buffer: 64,
        }
    }

    /// Sets the status-change request timeout.
    #[must_use]
    pub const fn with_request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }

    /// Sets the number of retained failure notices.
    #[must_use]
    pub const fn with_max_notices(mut self, max_notices: usize) -> Self {
        self.max_notices = max_notices;
        self
    }

    /// Sets the per-subscriber push buffer.
    #[must_use]
    pub const fn with_event_buffer(mut self, event_buffer: usize) -> Self {
        self.event_buffer = event_buffer;
        self
    }
}
