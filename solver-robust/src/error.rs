//! Error types for the separation engine.

use solver_model::{EvalError, ModelError};
use thiserror::Error;

use crate::solvers::SolverError;

/// Errors that abort a separation call.
///
/// Non-convergence of a subordinate solver and time-budget exhaustion are
/// not errors; they are reported through
/// [`SeparationStop`](crate::separation::SeparationStop).
#[derive(Error, Debug)]
pub enum RoError {
    /// Problem validation failed
    #[error("Invalid problem: {0}")]
    InvalidProblem(String),

    /// Nothing to separate against
    #[error("No performance constraints identified for the postulated robust optimization problem")]
    NoPerformanceConstraints,

    /// Inequality with only a lower bound
    #[error("Constraint {0} is not in standard form; all inequality constraints must be written as body <= upper")]
    NonStandardInequality(String),

    /// Constraint without any bound
    #[error("Unable to classify bounds of constraint {0} while building the separation problem")]
    UnclassifiableConstraint(String),

    /// Performance constraint with no synthesized objective
    #[error("No separation objective mapped to constraint {0}")]
    MissingObjective(String),

    /// Constraint value unavailable in the nominal master block
    #[error("Unable to access nominal scenario value for constraint {name}: {reason}")]
    NominalValueUnavailable {
        /// Constraint name.
        name: String,
        /// Why the lookup failed.
        reason: String,
    },

    /// Uncertain-parameter-only constraints left active
    #[error("All uncertain-parameter-only constraints must be deactivated in separation (active: {0:?})")]
    ActiveParamOnlyConstraints(Vec<String>),

    /// A master point does not belong to the discrete scenario list
    #[error("Point {0:?} added to the master problem is not a scenario of the uncertainty set")]
    UnknownScenario(Vec<f64>),

    /// Separation objective evaluated outside its domain
    #[error("Objective {objective} led to a math domain error ({source}); does its performance constraint contain log(x), 1/x or other functions with restricted domains?")]
    MathDomain {
        /// Objective name.
        objective: String,
        /// Underlying evaluation error.
        #[source]
        source: EvalError,
    },

    /// External solver crashed
    #[error("Solver {solver} failed in separation iteration {iteration}: {source}")]
    Subsolver {
        /// Solver name.
        solver: String,
        /// Master iteration.
        iteration: usize,
        /// Underlying solver error.
        #[source]
        source: SolverError,
    },

    /// Model layer error, including failed diagnostic exports
    #[error("Model error: {0}")]
    Model(#[from] ModelError),
}

/// Result type for separation operations.
pub type RoResult<T> = Result<T, RoError>;
