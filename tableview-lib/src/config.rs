//! Controller configuration

use std::time::Duration;

/// Default quiescence window for debounced fetches.
pub const DEFAULT_QUIESCENCE_WINDOW: Duration = Duration::from_millis(300);

/// Configuration for a [`TableController`](crate::controller::TableController).
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use tableview_lib::config::ControllerConfig;
///
/// let config = ControllerConfig::default()
///     .with_quiescence_window(Duration::from_millis(150))
///     .with_abort_superseded(true);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerConfig {
    /// Debounced calls arriving within this window are coalesced.
    ///
    /// Default: 300 ms
    pub quiescence_window: Duration,

    /// Cancel an in-flight fetch as soon as a newer one is dispatched.
    ///
    /// When off, superseded responses still arrive and are discarded if
    /// stale. Default: off
    pub abort_superseded: bool,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            quiescence_window: DEFAULT_QUIESCENCE_WINDOW,
            abort_superseded: false,
        }
    }
}

impl ControllerConfig {
    /// Creates a config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the quiescence window.
    pub fn with_quiescence_window(mut self, window: Duration) -> Self {
        self.quiescence_window = window;
        self
    }

    /// Enables or disables aborting superseded fetches.
    pub fn with_abort_superseded(mut self, enabled: bool) -> Self {
        self.abort_superseded = enabled;
        self
    }
}
