//! Controller configuration parameters.
//!
//! Supplied by the embedding application at construction time.  Nothing
//! here is persisted: only the settled tilt percentage survives a reset.

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Core controller configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShadeConfig {
    // --- Motion ---
    /// Drive time for one percentage point (milliseconds).
    /// `0` means "not calibrated"; tilt commands are refused until set.
    pub ms_per_tilt_percent: u32,

    // --- Timing ---
    /// Drive-loop polling cadence (milliseconds).
    pub tick_interval_ms: u32,
    /// How often a new request polls for the previous move to retire (milliseconds).
    pub cancel_poll_interval_ms: u32,
    /// Upper bound on that wait before the new request is dropped (milliseconds).
    pub cancel_timeout_ms: u32,

    // --- Motion task ---
    /// Stack size of the motion task (KiB).
    pub task_stack_kb: usize,
    /// FreeRTOS priority of the motion task.
    pub task_priority: u8,
}

impl Default for ShadeConfig {
    fn default() -> Self {
        Self {
            // Motion
            ms_per_tilt_percent: 0,

            // Timing
            tick_interval_ms: 10,
            cancel_poll_interval_ms: 10,
            cancel_timeout_ms: 2000,

            // Motion task
            task_stack_kb: 4,
            task_priority: 5,
        }
    }
}

impl ShadeConfig {
    /// Default timing with the given motor time constant.
    pub fn with_ms_per_tilt_percent(ms_per_tilt_percent: u32) -> Self {
        Self {
            ms_per_tilt_percent,
            ..Self::default()
        }
    }

    /// Check the values a move depends on.
    pub fn validate(&self) -> Result<(), Error> {
        if self.ms_per_tilt_percent == 0 {
            return Err(Error::Config("ms_per_tilt_percent must be > 0"));
        }
        if self.tick_interval_ms == 0 {
            return Err(Error::Config("tick_interval_ms must be > 0"));
        }
        // The running task must see the cancel flag at least as often as the
        // requester polls for it to retire.
        if self.cancel_poll_interval_ms < self.tick_interval_ms {
            return Err(Error::Config(
                "cancel_poll_interval_ms must be >= tick_interval_ms",
            ));
        }
        if self.cancel_timeout_ms < self.cancel_poll_interval_ms {
            return Err(Error::Config(
                "cancel_timeout_ms must be >= cancel_poll_interval_ms",
            ));
        }
        Ok(())
    }
}
