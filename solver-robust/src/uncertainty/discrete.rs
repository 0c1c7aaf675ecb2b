//! Discrete scenario uncertainty set.

use solver_model::{ConId, Constraint, Model, ModelResult, VarId};

use super::{membership_constraint_name, Geometry, UncertaintySet};
use crate::error::{RoError, RoResult};

/// Finite list of parameter realizations.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscreteScenarioSet {
    scenarios: Vec<Vec<f64>>,
}

impl DiscreteScenarioSet {
    /// Create a set from scenarios of equal dimension.
    pub fn new(scenarios: Vec<Vec<f64>>) -> RoResult<Self> {
        let dim = match scenarios.first() {
            Some(s) if !s.is_empty() => s.len(),
            _ => {
                return Err(RoError::InvalidProblem(
                    "discrete scenario set needs at least one non-empty scenario".into(),
                ))
            }
        };
        if let Some(bad) = scenarios.iter().position(|s| s.len() != dim) {
            return Err(RoError::InvalidProblem(format!(
                "scenario {} has dimension {}, expected {}",
                bad,
                scenarios[bad].len(),
                dim
            )));
        }
        Ok(Self { scenarios })
    }
}

impl UncertaintySet for DiscreteScenarioSet {
    fn type_name(&self) -> &str {
        "discrete"
    }

    fn geometry(&self) -> Geometry {
        Geometry::DiscreteScenarios
    }

    fn dim(&self) -> usize {
        self.scenarios[0].len()
    }

    fn set_as_constraints(&self, model: &mut Model, param_vars: &[VarId]) -> ModelResult<Vec<ConId>> {
        let dim = self.dim();
        let mut ids = Vec::with_capacity(self.scenarios.len() * dim);
        for (s, scenario) in self.scenarios.iter().enumerate() {
            for (i, (&value, &var)) in scenario.iter().zip(param_vars).enumerate() {
                let con = Constraint::eq(membership_constraint_name(s * dim + i), var, value);
                ids.push(model.add_constraint(con)?);
            }
        }
        Ok(ids)
    }

    fn parameter_bounds(&self) -> Option<Vec<(f64, f64)>> {
        let dim = self.dim();
        let bounds = (0..dim)
            .map(|i| {
                self.scenarios.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), s| {
                    (lo.min(s[i]), hi.max(s[i]))
                })
            })
            .collect();
        Some(bounds)
    }

    fn scenarios(&self) -> Option<&[Vec<f64>]> {
        Some(&self.scenarios)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use solver_model::Expr;

    #[test]
    fn test_ragged_scenarios_rejected() {
        assert!(DiscreteScenarioSet::new(vec![]).is_err());
        assert!(DiscreteScenarioSet::new(vec![vec![1.0, 2.0], vec![1.0]]).is_err());
    }

    #[test]
    fn test_chunked_constraints() {
        let set = DiscreteScenarioSet::new(vec![vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]]).unwrap();
        let mut m = Model::new("m");
        let q0 = m.add_var("q0").unwrap();
        let q1 = m.add_var("q1").unwrap();

        let ids = set.set_as_constraints(&mut m, &[q0, q1]).unwrap();

        assert_eq!(ids.len(), 6);
        // Chunk 1, coordinate 1
        let c = m.constraint(ids[3]);
        assert!(c.equality);
        assert_eq!(c.body, Expr::Var(q1));
        assert_eq!(c.lower, Some(Expr::Const(4.0)));
    }

    #[test]
    fn test_bounds() {
        let set = DiscreteScenarioSet::new(vec![vec![1.0, 7.0], vec![3.0, 7.0]]).unwrap();
        assert_eq!(set.parameter_bounds(), Some(vec![(1.0, 3.0), (7.0, 7.0)]));
        assert_eq!(set.geometry(), Geometry::DiscreteScenarios);
    }
}
