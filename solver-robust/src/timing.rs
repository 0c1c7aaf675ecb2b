//! Wall-clock bookkeeping for a robust optimization run.

use std::time::{Duration, Instant};

/// Main timer of the surrounding robust optimization run.
///
/// The engine only reads it: the time budget is measured from `start`,
/// which the master loop sets when the overall run begins.
#[derive(Debug, Clone, Copy)]
pub struct TimingData {
    start: Instant,
}

impl Default for TimingData {
    fn default() -> Self {
        Self::new()
    }
}

impl TimingData {
    /// Start the main timer now.
    pub fn new() -> Self {
        Self { start: Instant::now() }
    }

    /// Timer that started at `start`.
    pub fn started_at(start: Instant) -> Self {
        Self { start }
    }

    /// Main elapsed time.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Main elapsed time in seconds.
    pub fn elapsed_secs(&self) -> f64 {
        self.elapsed().as_secs_f64()
    }

    /// Whether the budget (in milliseconds) is used up. `None` never expires.
    pub fn budget_exceeded(&self, time_limit_ms: Option<u64>) -> bool {
        match time_limit_ms {
            Some(limit) => self.elapsed() >= Duration::from_millis(limit),
            None => false,
        }
    }

    /// Remaining budget in whole seconds, rounded up and at least 1.
    ///
    /// Returns `None` without a budget.
    pub fn remaining_secs(&self, time_limit_ms: Option<u64>) -> Option<f64> {
        let limit = Duration::from_millis(time_limit_ms?);
        let remaining = limit.saturating_sub(self.elapsed());
        let secs = remaining.as_secs();
        let rounded_up = if remaining.subsec_nanos() > 0 {
            secs.saturating_add(1)
        } else {
            secs
        };
        Some(rounded_up.max(1) as f64)
    }
}
