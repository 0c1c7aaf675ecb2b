//! Symbolic modeling layer for the minix robust optimization engine.
//!
//! Provides the pieces the separation engine consumes but does not own:
//!
//! - [`Expr`]: expression trees with evaluation, parameter substitution and
//!   reference analysis
//! - [`Model`]: named variables, parameters, constraints and objectives with
//!   activation and fixing state
//! - [`write_bar`]: BARON-format export used for diagnostics

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod expr;
pub mod model;
pub mod writer;

pub use error::{EvalError, ModelError, ModelResult};
pub use expr::{analyze_all, Expr, ExprAnalysis, ParamId, Valuation, VarId};
pub use model::{ConId, Constraint, Model, ObjId, Objective, ObjectiveSense, Parameter, Variable};
pub use writer::{to_bar_string, write_bar};
