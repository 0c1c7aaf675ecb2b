//! Separation result types.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::solvers::{SolverResults, TerminationCondition};

/// Outcome of separating one performance constraint at one realization.
#[derive(Debug, Clone, Default)]
pub struct SeparationResult {
    /// Termination condition of the last solver tried (None if none ran).
    pub termination: Option<TerminationCondition>,

    /// Whether the scaled violation of the separated constraint exceeds
    /// the robust feasibility tolerance.
    pub found_violation: bool,

    /// Surrogate values at the solution, one per uncertain parameter.
    pub violating_param_realization: Vec<f64>,

    /// Scaled violation of every performance constraint at the solution.
    pub list_of_scaled_violations: Vec<f64>,

    /// Raw results of the last solver tried.
    pub results: Option<SolverResults>,

    /// Wall-clock time of all solver attempts, in seconds.
    pub solve_time: f64,
}

/// Why a separation call stopped before finishing its schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SeparationStop {
    /// The run's time budget is used up.
    TimeLimit,

    /// No solver reached an acceptable status on some subproblem.
    SubsolverFailure,
}

impl fmt::Display for SeparationStop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeparationStop::TimeLimit => write!(f, "time limit reached"),
            SeparationStop::SubsolverFailure => write!(f, "subsolver failure"),
        }
    }
}

/// Location of the worst violation in [`SeparationOutcome::results`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorstCase {
    /// Performance constraint with the largest total violation.
    pub constraint: usize,

    /// Row of `results` holding the returned realization.
    pub row: usize,

    /// Entry within that row (scenario position for discrete sets).
    pub entry: usize,
}

/// Everything a separation call reports back to the master loop.
#[derive(Debug, Clone, Default)]
pub struct SeparationOutcome {
    /// One row per scheduled constraint of the last tier: a single result
    /// for continuous sets, one per enumerated scenario for discrete sets.
    pub results: Vec<Vec<SeparationResult>>,

    /// `scheduled[i]` is the performance constraint index of `results[i]`.
    pub scheduled: Vec<usize>,

    /// Worst-case realization (empty if no violation).
    pub violating_realization: Vec<f64>,

    /// Scaled violations at the worst-case realization (empty if none).
    pub violations: Vec<f64>,

    /// Whether the last tier run was the global one.
    pub used_global: bool,

    /// Solver time spent in local separation, in seconds.
    pub local_time: f64,

    /// Solver time spent in global separation, in seconds.
    pub global_time: f64,

    /// Location of the worst-case violation.
    pub worst_case: Option<WorstCase>,

    /// Early stop reason, if any.
    pub stop: Option<SeparationStop>,
}

impl SeparationOutcome {
    /// Whether any result found a violation.
    pub fn found_violation(&self) -> bool {
        self.results.iter().flatten().any(|r| r.found_violation)
    }

    /// The result at the worst-case location.
    pub fn worst_result(&self) -> Option<&SeparationResult> {
        let wc = self.worst_case?;
        self.results.get(wc.row)?.get(wc.entry)
    }
}
