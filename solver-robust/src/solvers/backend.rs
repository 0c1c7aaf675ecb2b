//! Subordinate solver trait and types.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use solver_model::{Model, VarId};
use thiserror::Error;

/// Termination condition reported by a subordinate solver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TerminationCondition {
    /// Optimal (solver does not distinguish local/global).
    Optimal,

    /// Locally optimal.
    LocallyOptimal,

    /// Globally optimal.
    GloballyOptimal,

    /// Feasible point found, optimality not proven.
    Feasible,

    /// Problem is infeasible.
    Infeasible,

    /// Problem is unbounded.
    Unbounded,

    /// Iteration limit reached.
    MaxIterations,

    /// Solver time limit reached.
    MaxTimeLimit,

    /// Solver stopped on an internal error.
    Error,

    /// Anything else.
    Unknown,
}

impl fmt::Display for TerminationCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TerminationCondition::Optimal => write!(f, "optimal"),
            TerminationCondition::LocallyOptimal => write!(f, "locallyOptimal"),
            TerminationCondition::GloballyOptimal => write!(f, "globallyOptimal"),
            TerminationCondition::Feasible => write!(f, "feasible"),
            TerminationCondition::Infeasible => write!(f, "infeasible"),
            TerminationCondition::Unbounded => write!(f, "unbounded"),
            TerminationCondition::MaxIterations => write!(f, "maxIterations"),
            TerminationCondition::MaxTimeLimit => write!(f, "maxTimeLimit"),
            TerminationCondition::Error => write!(f, "error"),
            TerminationCondition::Unknown => write!(f, "unknown"),
        }
    }
}

/// Required solution quality for a separation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SolveFidelity {
    /// Local optimality suffices.
    Local,

    /// Global optimality required.
    Global,
}

impl SolveFidelity {
    /// Whether `condition` is an acceptable outcome at this fidelity.
    pub fn accepts(self, condition: TerminationCondition) -> bool {
        use TerminationCondition::*;
        match self {
            SolveFidelity::Local => matches!(condition, Optimal | LocallyOptimal | GloballyOptimal),
            SolveFidelity::Global => matches!(condition, Optimal | GloballyOptimal),
        }
    }

    /// True for [`SolveFidelity::Global`].
    pub fn is_global(self) -> bool {
        self == SolveFidelity::Global
    }
}

/// Solver errors outside of normal optimization failure.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolverError {
    /// The solver process crashed or could not be run.
    #[error("application error: {0}")]
    Application(String),

    /// The solver does not support the model.
    #[error("unsupported model: {0}")]
    Unsupported(String),
}

/// Adjustable options attached to a solver.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SolverOptions {
    /// Time limit in seconds passed to the solver (None = solver default).
    pub time_limit_secs: Option<f64>,

    /// Free-form solver options.
    pub extra: BTreeMap<String, String>,
}

/// Outcome of one solver invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct SolverResults {
    /// Termination condition.
    pub termination: TerminationCondition,

    /// Variable values (only loaded into the model on acceptable status).
    pub solution: Vec<(VarId, f64)>,

    /// Optional solver message.
    pub message: Option<String>,

    /// Wall-clock time of the call in seconds, filled in by the engine.
    pub wall_time: f64,
}

impl SolverResults {
    /// Results with a termination condition and no solution.
    pub fn new(termination: TerminationCondition) -> Self {
        Self {
            termination,
            solution: Vec::new(),
            message: None,
            wall_time: 0.0,
        }
    }

    /// Attach a solution.
    pub fn with_solution(mut self, solution: Vec<(VarId, f64)>) -> Self {
        self.solution = solution;
        self
    }
}

/// A subordinate optimization solver.
///
/// Implementations wrap external solver processes or libraries. The model
/// handed in has exactly one active objective; fixed variables must be
/// treated as constants and inactive components ignored.
pub trait SubSolver: fmt::Debug + Send + Sync {
    /// Solver name, used in logs and failure reports.
    fn name(&self) -> &str;

    /// Solve `model` without modifying it.
    fn solve(
        &self,
        model: &Model,
        options: &SolverOptions,
        tee: bool,
    ) -> Result<SolverResults, SolverError>;
}

/// A solver handle plus its options.
///
/// Cloning shares the solver handle and deep-copies the options, so the
/// per-call time-limit adjustment never leaks into the configured
/// descriptor.
#[derive(Debug, Clone)]
pub struct SolverDescriptor {
    /// Solver handle.
    pub solver: Arc<dyn SubSolver>,

    /// Options passed on every call.
    pub options: SolverOptions,
}

impl SolverDescriptor {
    /// Descriptor with default options.
    pub fn new(solver: Arc<dyn SubSolver>) -> Self {
        Self {
            solver,
            options: SolverOptions::default(),
        }
    }

    /// Set a solver time limit in seconds.
    pub fn with_time_limit(mut self, seconds: f64) -> Self {
        self.options.time_limit_secs = Some(seconds);
        self
    }

    /// Solver name.
    pub fn name(&self) -> &str {
        self.solver.name()
    }
}

impl fmt::Display for SolverDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.solver.name())
    }
}

/// Classified outcome of one solve attempt.
#[derive(Debug, Clone)]
pub enum SolveAttempt {
    /// Acceptable termination for the requested fidelity.
    Acceptable(SolverResults),

    /// Solver returned, but with an unacceptable status; try the next backup.
    Unacceptable(SolverResults),

    /// Solver crashed; fatal.
    ToolFailure(SolverError),
}

impl SolveAttempt {
    /// Classify a raw solver return.
    pub fn classify(raw: Result<SolverResults, SolverError>, fidelity: SolveFidelity) -> Self {
        match raw {
            Ok(results) if fidelity.accepts(results.termination) => SolveAttempt::Acceptable(results),
            Ok(results) => SolveAttempt::Unacceptable(results),
            Err(err) => SolveAttempt::ToolFailure(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acceptable_sets() {
        use TerminationCondition::*;

        for tc in [Optimal, LocallyOptimal, GloballyOptimal] {
            assert!(SolveFidelity::Local.accepts(tc));
        }
        assert!(SolveFidelity::Global.accepts(Optimal));
        assert!(SolveFidelity::Global.accepts(GloballyOptimal));
        assert!(!SolveFidelity::Global.accepts(LocallyOptimal));

        for tc in [Feasible, Infeasible, MaxTimeLimit, Error, Unknown] {
            assert!(!SolveFidelity::Local.accepts(tc));
            assert!(!SolveFidelity::Global.accepts(tc));
        }
    }

    #[test]
    fn test_classify() {
        let ok = Ok(SolverResults::new(TerminationCondition::LocallyOptimal));
        assert!(matches!(
            SolveAttempt::classify(ok.clone(), SolveFidelity::Local),
            SolveAttempt::Acceptable(_)
        ));
        assert!(matches!(
            SolveAttempt::classify(ok, SolveFidelity::Global),
            SolveAttempt::Unacceptable(_)
        ));

        let crashed = Err(SolverError::Application("segfault".into()));
        assert!(matches!(
            SolveAttempt::classify(crashed, SolveFidelity::Local),
            SolveAttempt::ToolFailure(_)
        ));
    }

    #[derive(Debug)]
    struct Named;

    impl SubSolver for Named {
        fn name(&self) -> &str {
            "named"
        }

        fn solve(&self, _: &Model, _: &SolverOptions, _: bool) -> Result<SolverResults, SolverError> {
            Ok(SolverResults::new(TerminationCondition::Optimal))
        }
    }

    #[test]
    fn test_descriptor_clone_copies_options() {
        let base = SolverDescriptor::new(Arc::new(Named)).with_time_limit(30.0);
        let mut copy = base.clone();
        copy.options.time_limit_secs = Some(1.0);

        assert_eq!(base.options.time_limit_secs, Some(30.0));
        assert!(Arc::ptr_eq(&base.solver, &copy.solver));
        assert_eq!(copy.to_string(), "named");
    }
}
