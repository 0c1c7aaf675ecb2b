//! Box (interval) uncertainty set.

use solver_model::{ConId, Constraint, Expr, Model, ModelResult, VarId};

use super::{membership_constraint_name, Geometry, UncertaintySet};
use crate::error::{RoError, RoResult};

/// Hyper-rectangle `lower_i <= q_i <= upper_i`.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxSet {
    bounds: Vec<(f64, f64)>,
}

impl BoxSet {
    /// Create a box from per-parameter bounds.
    pub fn new(bounds: Vec<(f64, f64)>) -> RoResult<Self> {
        if bounds.is_empty() {
            return Err(RoError::InvalidProblem("box set needs at least one dimension".into()));
        }
        for (i, &(lb, ub)) in bounds.iter().enumerate() {
            if !(lb.is_finite() && ub.is_finite()) || lb > ub {
                return Err(RoError::InvalidProblem(format!(
                    "box set bounds for parameter {} are invalid: [{}, {}]",
                    i, lb, ub
                )));
            }
        }
        Ok(Self { bounds })
    }
}

impl UncertaintySet for BoxSet {
    fn type_name(&self) -> &str {
        "box"
    }

    fn geometry(&self) -> Geometry {
        Geometry::Continuous
    }

    fn dim(&self) -> usize {
        self.bounds.len()
    }

    fn set_as_constraints(&self, model: &mut Model, param_vars: &[VarId]) -> ModelResult<Vec<ConId>> {
        let mut ids = Vec::with_capacity(self.bounds.len());
        for (i, (&(lb, ub), &var)) in self.bounds.iter().zip(param_vars).enumerate() {
            let con = Constraint::new(
                membership_constraint_name(i),
                Some(Expr::Const(lb)),
                var,
                Some(Expr::Const(ub)),
            );
            ids.push(model.add_constraint(con)?);
        }
        Ok(ids)
    }

    fn parameter_bounds(&self) -> Option<Vec<(f64, f64)>> {
        Some(self.bounds.clone())
    }
}
