//! Uncertainty sets as seen by the separation engine.
//!
//! The engine only needs a set to describe its geometry, write its
//! membership constraints over the surrogate parameter variables, and,
//! when available, report per-parameter bounds.

mod box_set;
mod discrete;

pub use box_set::BoxSet;
pub use discrete::DiscreteScenarioSet;

use std::fmt;

use serde::{Deserialize, Serialize};
use solver_model::{ConId, Model, ModelResult, VarId};

/// Geometry class of an uncertainty set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Geometry {
    /// Searched by continuous optimization.
    Continuous,

    /// Finite list of scenarios, searched by enumeration.
    DiscreteScenarios,
}

impl Geometry {
    /// True for finite scenario lists.
    pub fn is_discrete(self) -> bool {
        self == Geometry::DiscreteScenarios
    }
}

/// Capabilities an uncertainty set exposes to the separation engine.
pub trait UncertaintySet: fmt::Debug + Send + Sync {
    /// Short type name, used in diagnostic file names (e.g. `box`).
    fn type_name(&self) -> &str;

    /// Geometry class.
    fn geometry(&self) -> Geometry;

    /// Number of uncertain parameters.
    fn dim(&self) -> usize;

    /// Add membership constraints over `param_vars` to `model`.
    ///
    /// Discrete sets must add exactly `dim()` equality constraints per
    /// scenario, scenario after scenario, coordinate `i` of each chunk
    /// constraining `param_vars[i]`.
    fn set_as_constraints(&self, model: &mut Model, param_vars: &[VarId]) -> ModelResult<Vec<ConId>>;

    /// Per-parameter `(lower, upper)` bounds, if the set can compute them.
    fn parameter_bounds(&self) -> Option<Vec<(f64, f64)>>;

    /// Scenario list of a discrete set.
    fn scenarios(&self) -> Option<&[Vec<f64>]> {
        None
    }
}

/// Name of the `index`-th membership constraint.
pub(crate) fn membership_constraint_name(index: usize) -> String {
    format!("util.uncertainty_set_constraint[{}]", index)
}
