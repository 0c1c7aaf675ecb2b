//! Error types for the modeling layer.

use thiserror::Error;

use crate::expr::{ParamId, VarId};

/// Errors raised while evaluating an expression.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    /// A referenced variable has no value yet.
    #[error("variable {0:?} has no value")]
    UnvaluedVariable(VarId),

    /// A referenced parameter is not part of the model.
    #[error("parameter {0:?} is not defined")]
    UnknownParameter(ParamId),

    /// A referenced variable is not part of the model.
    #[error("variable {0:?} is not defined")]
    UnknownVariable(VarId),

    /// A function was evaluated outside of its domain.
    #[error("math domain error in {op}({arg})")]
    Domain {
        /// Operation that failed (`log`, `div`, `pow`, ...).
        op: &'static str,
        /// Offending argument.
        arg: f64,
    },

    /// Evaluation produced a non-finite value.
    #[error("evaluation produced a non-finite value in {op}")]
    NonFinite {
        /// Operation that overflowed.
        op: &'static str,
    },
}

/// Errors raised while building or querying a model.
#[derive(Error, Debug)]
pub enum ModelError {
    /// A component with the same name already exists.
    #[error("duplicate component name: {0}")]
    DuplicateName(String),

    /// No variable with this name.
    #[error("no variable named {0}")]
    UnknownVariable(String),

    /// No constraint with this name.
    #[error("no constraint named {0}")]
    UnknownConstraint(String),

    /// Expression evaluation failed.
    #[error("evaluation failed: {0}")]
    Eval(#[from] EvalError),

    /// Writing an export file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for model operations.
pub type ModelResult<T> = Result<T, ModelError>;
