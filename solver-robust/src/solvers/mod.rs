//! Subordinate solver handles and time-limit management.

mod backend;
mod time_limit;

pub use backend::{
    SolveAttempt, SolveFidelity, SolverDescriptor, SolverError, SolverOptions, SolverResults,
    SubSolver, TerminationCondition,
};
pub use time_limit::{adjust_time_limit, revert_time_limit, TimeLimitAdjustment};
