//! Per-call solver time-limit adjustment.

use super::SolverOptions;
use crate::timing::TimingData;

/// Record of a time-limit change, used to undo it after the solve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeLimitAdjustment {
    original: Option<f64>,
}

/// Cap the solver's time limit by the remaining run budget.
///
/// Without a run budget the options are left untouched and `None` is
/// returned. A user-provided limit is kept if it is tighter.
pub fn adjust_time_limit(
    options: &mut SolverOptions,
    timing: &TimingData,
    time_limit_ms: Option<u64>,
) -> Option<TimeLimitAdjustment> {
    let remaining = timing.remaining_secs(time_limit_ms)?;
    let original = options.time_limit_secs;
    options.time_limit_secs = Some(match original {
        Some(custom) => custom.min(remaining),
        None => remaining,
    });
    Some(TimeLimitAdjustment { original })
}

/// Undo [`adjust_time_limit`].
pub fn revert_time_limit(options: &mut SolverOptions, adjustment: Option<TimeLimitAdjustment>) {
    if let Some(adj) = adjustment {
        options.time_limit_secs = adj.original;
    }
}
