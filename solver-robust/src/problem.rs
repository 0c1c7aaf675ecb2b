//! Robust problem classification.

use solver_model::{ConId, Expr, Model, ParamId, VarId};

use crate::error::{RoError, RoResult};

/// Deterministic model plus the robust classification of its components.
///
/// All ids refer to `model`. The separation model is a clone of `model`,
/// so the same ids stay valid there.
#[derive(Debug, Clone)]
pub struct RobustProblem {
    /// Deterministic model with uncertain coefficients as parameters.
    pub model: Model,

    /// Here-and-now variables, fixed during separation.
    pub first_stage_variables: Vec<VarId>,

    /// Wait-and-see variables.
    pub second_stage_variables: Vec<VarId>,

    /// Variables determined by the equality system.
    pub state_variables: Vec<VarId>,

    /// Parameters the adversary controls, in surrogate order.
    pub uncertain_params: Vec<ParamId>,

    /// Decision rule coefficients (first-stage in nature).
    pub decision_rule_variables: Vec<VarId>,

    /// Equations linking second-stage variables to the decision rule.
    pub decision_rule_equations: Vec<ConId>,

    /// Coefficient-matching equalities, dropped from separation.
    pub coefficient_matching_constraints: Vec<ConId>,

    /// Equalities involving only uncertain parameters and first-stage
    /// variables (`h(x, q) = 0`), inactive in separation.
    pub param_only_constraints: Vec<ConId>,

    /// First-stage part of the objective.
    pub first_stage_objective: Expr,

    /// Second-stage part of the objective.
    pub second_stage_objective: Expr,
}

impl RobustProblem {
    /// Problem with uncertain parameters and empty classification.
    pub fn new(model: Model, uncertain_params: Vec<ParamId>) -> Self {
        Self {
            model,
            first_stage_variables: Vec::new(),
            second_stage_variables: Vec::new(),
            state_variables: Vec::new(),
            uncertain_params,
            decision_rule_variables: Vec::new(),
            decision_rule_equations: Vec::new(),
            coefficient_matching_constraints: Vec::new(),
            param_only_constraints: Vec::new(),
            first_stage_objective: Expr::Const(0.0),
            second_stage_objective: Expr::Const(0.0),
        }
    }

    /// Set first-stage variables.
    pub fn with_first_stage(mut self, vars: Vec<VarId>) -> Self {
        self.first_stage_variables = vars;
        self
    }

    /// Set second-stage variables.
    pub fn with_second_stage(mut self, vars: Vec<VarId>) -> Self {
        self.second_stage_variables = vars;
        self
    }

    /// Set state variables.
    pub fn with_state(mut self, vars: Vec<VarId>) -> Self {
        self.state_variables = vars;
        self
    }

    /// Set decision rule variables and equations.
    pub fn with_decision_rule(mut self, vars: Vec<VarId>, equations: Vec<ConId>) -> Self {
        self.decision_rule_variables = vars;
        self.decision_rule_equations = equations;
        self
    }

    /// Set coefficient-matching constraints.
    pub fn with_coefficient_matching(mut self, cons: Vec<ConId>) -> Self {
        self.coefficient_matching_constraints = cons;
        self
    }

    /// Set uncertain-parameter-only constraints.
    pub fn with_param_only(mut self, cons: Vec<ConId>) -> Self {
        self.param_only_constraints = cons;
        self
    }

    /// Set the first- and second-stage objective parts.
    pub fn with_objectives(mut self, first_stage: Expr, second_stage: Expr) -> Self {
        self.first_stage_objective = first_stage;
        self.second_stage_objective = second_stage;
        self
    }

    /// Check that the classification is consistent with the model.
    pub fn validate(&self) -> RoResult<()> {
        if self.uncertain_params.is_empty() {
            return Err(RoError::InvalidProblem("no uncertain parameters".into()));
        }

        let n_params = self.model.num_params();
        if let Some(p) = self.uncertain_params.iter().find(|p| p.0 >= n_params) {
            return Err(RoError::InvalidProblem(format!(
                "Uncertain parameter {} but only {} parameters",
                p.0, n_params
            )));
        }

        let n_vars = self.model.num_vars();
        let var_lists = [
            ("first-stage", &self.first_stage_variables),
            ("second-stage", &self.second_stage_variables),
            ("state", &self.state_variables),
            ("decision rule", &self.decision_rule_variables),
        ];
        for (kind, vars) in var_lists {
            if let Some(v) = vars.iter().find(|v| v.0 >= n_vars) {
                return Err(RoError::InvalidProblem(format!(
                    "{} variable {} but only {} variables",
                    kind, v.0, n_vars
                )));
            }
        }

        let con_lists = [
            ("decision rule", &self.decision_rule_equations),
            ("coefficient matching", &self.coefficient_matching_constraints),
            ("uncertain-parameter-only", &self.param_only_constraints),
        ];
        for (kind, cons) in con_lists {
            if let Some(c) = cons.iter().find(|c| !self.model.has_constraint(**c)) {
                return Err(RoError::InvalidProblem(format!(
                    "{} constraint {} is not part of the model",
                    kind, c.0
                )));
            }
        }

        for expr in [&self.first_stage_objective, &self.second_stage_objective] {
            let refs = expr.analyze();
            let outside = refs.variables.iter().any(|v| v.0 >= n_vars)
                || refs.parameters.iter().any(|p| p.0 >= n_params);
            if outside {
                return Err(RoError::InvalidProblem(
                    "objective references components outside the model".into(),
                ));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> (Model, VarId, ParamId) {
        let mut m = Model::new("m");
        let x = m.add_var("x").unwrap();
        let q = m.add_param("q", 1.0).unwrap();
        (m, x, q)
    }

    #[test]
    fn test_validate_ok() {
        let (m, x, q) = base();
        let p = RobustProblem::new(m, vec![q])
            .with_first_stage(vec![x])
            .with_objectives(Expr::from(x), Expr::Const(0.0));
        assert!(p.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_missing_params() {
        let (m, _, _) = base();
        assert!(matches!(
            RobustProblem::new(m, vec![]).validate(),
            Err(RoError::InvalidProblem(_))
        ));
    }

    #[test]
    fn test_validate_rejects_out_of_range_ids() {
        let (m, _, q) = base();
        let p = RobustProblem::new(m.clone(), vec![q]).with_second_stage(vec![VarId(7)]);
        assert!(p.validate().is_err());

        let p = RobustProblem::new(m, vec![ParamId(3)]);
        assert!(p.validate().is_err());
    }
}
