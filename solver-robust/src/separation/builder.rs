//! Construction of the separation model.

use std::collections::HashMap;

use solver_model::{ConId, Constraint, Expr, Model, ParamId, Variable, VarId};

use super::model::SeparationModel;
use super::objectives::synthesize_objectives;
use crate::error::{RoError, RoResult};
use crate::problem::RobustProblem;
use crate::settings::{ObjectiveFocus, SeparationSettings};

/// Name of the epigraph constraint.
pub const EPIGRAPH_NAME: &str = "epigraph_constr";

impl SeparationModel {
    /// Build the separation model of `problem`.
    ///
    /// Uncertain parameters become surrogate variables, constraints that
    /// reference them are rewritten over the surrogates, one maximize
    /// objective is synthesized per performance constraint, and the
    /// uncertainty set is attached. All objectives are left inactive.
    pub fn build(problem: &RobustProblem, settings: &SeparationSettings) -> RoResult<Self> {
        problem.validate()?;
        let set = &settings.uncertainty_set;
        if set.dim() != problem.uncertain_params.len() {
            return Err(RoError::InvalidProblem(format!(
                "Uncertainty set has dimension {} but the problem has {} uncertain parameters",
                set.dim(),
                problem.uncertain_params.len()
            )));
        }

        let mut model = problem.model.clone();
        for &con in &problem.coefficient_matching_constraints {
            model.remove_constraint(con);
        }
        let existing: Vec<_> = model.objectives().map(|(id, _)| id).collect();
        for obj in existing {
            model.set_objective_active(obj, false);
        }

        // === Surrogates ===
        let mut uncertain_param_vars = Vec::with_capacity(problem.uncertain_params.len());
        let mut nominal_param_values = Vec::with_capacity(problem.uncertain_params.len());
        let mut substitution = HashMap::new();
        for (i, &param) in problem.uncertain_params.iter().enumerate() {
            let nominal = model.param(param).value;
            let var = model.add_variable(
                Variable::new(format!("util.uncertain_param_vars[{}]", i)).with_value(nominal),
            )?;
            substitution.insert(param, var);
            uncertain_param_vars.push(var);
            nominal_param_values.push(nominal);
        }

        // === Epigraph ===
        let (zeta, epigraph) = match settings.objective_focus {
            ObjectiveFocus::WorstCase => {
                let zeta = model.add_param("util.zeta", 0.0)?;
                let body = problem.first_stage_objective.clone()
                    + problem.second_stage_objective.clone()
                    - zeta;
                let epi = model.add_constraint(Constraint::le(EPIGRAPH_NAME, body, 0.0))?;
                (Some(zeta), Some(epi))
            }
            ObjectiveFocus::Nominal => (None, None),
        };

        // === Rewrite uncertain constraints ===
        let (new_constraints, original_of, rewritten_of) =
            rewrite_uncertain_constraints(&mut model, &problem.uncertain_params, &substitution)?;

        let mut sep = SeparationModel {
            model,
            uncertain_param_vars,
            nominal_param_values,
            new_constraints,
            original_of,
            rewritten_of,
            epigraph,
            zeta,
            uncertainty_set_constraints: Vec::new(),
            performance_constraints: Vec::new(),
            separation_objectives: Vec::new(),
            objective_of: HashMap::new(),
            deterministic_constraints: Vec::new(),
            first_stage_variables: problem.first_stage_variables.clone(),
            second_stage_variables: problem.second_stage_variables.clone(),
            state_variables: problem.state_variables.clone(),
            decision_rule_variables: problem.decision_rule_variables.clone(),
            decision_rule_equations: Vec::new(),
            param_only_constraints: Vec::new(),
        };
        sep.decision_rule_equations = sep.with_counterparts(&problem.decision_rule_equations);
        sep.param_only_constraints = sep.with_counterparts(&problem.param_only_constraints);

        // Objectives before the set constraints, so membership constraints
        // are never picked up as performance constraints
        synthesize_objectives(&mut sep)?;
        sep.attach_uncertainty_set(settings)?;

        for con in sep.param_only_constraints.clone() {
            sep.model.set_constraint_active(con, false);
        }

        log::debug!(
            "Built separation model '{}': {} surrogates, {} rewritten constraints, {} performance constraints",
            sep.model.name(),
            sep.uncertain_param_vars.len(),
            sep.new_constraints.len(),
            sep.performance_constraints.len()
        );

        Ok(sep)
    }

    /// `cons` followed by the rewritten copy of each, where one exists.
    fn with_counterparts(&self, cons: &[ConId]) -> Vec<ConId> {
        let mut out = cons.to_vec();
        out.extend(cons.iter().filter_map(|c| self.rewritten_of.get(c).copied()));
        out
    }

    /// Add membership constraints and surrogate bounds; pin parameters
    /// whose bounds leave no room.
    fn attach_uncertainty_set(&mut self, settings: &SeparationSettings) -> RoResult<()> {
        let set = &settings.uncertainty_set;
        self.uncertainty_set_constraints = set.set_as_constraints(&mut self.model, &self.uncertain_param_vars)?;

        let Some(bounds) = set.parameter_bounds() else {
            return Ok(());
        };
        for (i, (&var, &(lb, ub))) in self.uncertain_param_vars.iter().zip(&bounds).enumerate() {
            let v = self.model.var_mut(var);
            v.lower = Some(lb);
            v.upper = Some(ub);
            if is_certain(lb, ub, settings.robust_feasibility_tolerance) {
                let nominal = self.nominal_param_values[i];
                log::debug!("Uncertain parameter {} is effectively certain, fixed at {}", i, nominal);
                self.model.fix_at(var, nominal);
            }
        }
        Ok(())
    }
}

/// Whether a parameter's bound width is within the tolerance, relative to
/// `max(1, |ub|)`.
pub fn is_certain(lb: f64, ub: f64, tol: f64) -> bool {
    (ub - lb) / ub.abs().max(1.0) <= tol
}

type RewriteMaps = (Vec<ConId>, HashMap<ConId, ConId>, HashMap<ConId, ConId>);

fn rewrite_uncertain_constraints(
    model: &mut Model,
    uncertain_params: &[ParamId],
    substitution: &HashMap<ParamId, VarId>,
) -> RoResult<RewriteMaps> {
    let mut new_constraints = Vec::new();
    let mut original_of = HashMap::new();
    let mut rewritten_of = HashMap::new();

    let uncertain: Vec<ConId> = model
        .constraints()
        .filter(|(_, c)| c.analyze().references_any_param(uncertain_params))
        .map(|(id, _)| id)
        .collect();

    for id in uncertain {
        let con = model.constraint(id);
        let sub = |e: &Expr| e.substitute_params(substitution);
        let body = sub(&con.body);
        let name = format!("util.new_constraints[{}]", new_constraints.len() + 1);

        let mut rewritten = if con.equality {
            match con.lower.as_ref().or(con.upper.as_ref()) {
                Some(rhs) => Constraint::eq(name, body, sub(rhs)),
                None => return Err(RoError::UnclassifiableConstraint(con.name.clone())),
            }
        } else {
            match (&con.lower, &con.upper) {
                (Some(l), Some(u)) => Constraint::new(name, Some(sub(l)), body, Some(sub(u))),
                (Some(l), None) => Constraint::ge(name, body, sub(l)),
                (None, Some(u)) => Constraint::le(name, body, sub(u)),
                (None, None) => return Err(RoError::UnclassifiableConstraint(con.name.clone())),
            }
        };
        rewritten.active = con.active;

        let new_id = model.add_constraint(rewritten)?;
        model.set_constraint_active(id, false);
        new_constraints.push(new_id);
        original_of.insert(new_id, id);
        rewritten_of.insert(id, new_id);
    }

    Ok((new_constraints, original_of, rewritten_of))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solvers::{SolverDescriptor, SolverError, SolverOptions, SolverResults, SubSolver};
    use crate::uncertainty::{BoxSet, DiscreteScenarioSet, UncertaintySet};
    use std::sync::Arc;

    #[derive(Debug)]
    struct Idle;

    impl SubSolver for Idle {
        fn name(&self) -> &str {
            "idle"
        }

        fn solve(&self, _: &Model, _: &SolverOptions, _: bool) -> Result<SolverResults, SolverError> {
            Err(SolverError::Unsupported("idle".into()))
        }
    }

    fn settings(set: Arc<dyn UncertaintySet>) -> SeparationSettings {
        let solver = SolverDescriptor::new(Arc::new(Idle));
        SeparationSettings::new(set, solver.clone(), solver)
    }

    /// x first-stage, z second-stage, q uncertain:
    ///   perf:  q * x + z <= 10
    ///   det:   x <= 4
    ///   link:  z - q == 0   (equality, rewritten)
    ///   cm:    q - 1 == 0   (coefficient matching)
    fn problem() -> RobustProblem {
        let mut m = Model::new("toy");
        let x = m.add_variable(Variable::new("x").with_value(2.0)).unwrap();
        let z = m.add_variable(Variable::new("z").with_value(1.0)).unwrap();
        let q = m.add_param("q", 1.5).unwrap();
        m.add_constraint(Constraint::le("perf", q * x + z, 10.0)).unwrap();
        m.add_constraint(Constraint::le("det", x, 4.0)).unwrap();
        m.add_constraint(Constraint::eq("link", z - q, 0.0)).unwrap();
        let cm = m.add_constraint(Constraint::eq("cm", q - 1.0, 0.0)).unwrap();
        RobustProblem::new(m, vec![q])
            .with_first_stage(vec![x])
            .with_second_stage(vec![z])
            .with_coefficient_matching(vec![cm])
            .with_objectives(Expr::from(x), Expr::from(z))
    }

    fn box_settings() -> SeparationSettings {
        settings(Arc::new(BoxSet::new(vec![(1.0, 2.0)]).unwrap()))
    }

    #[test]
    fn test_surrogates_and_rewrites() {
        let sep = SeparationModel::build(&problem(), &box_settings()).unwrap();

        assert_eq!(sep.uncertain_param_vars.len(), 1);
        let q = sep.model.var(sep.uncertain_param_vars[0]);
        assert_eq!(q.value, Some(1.5));
        assert_eq!((q.lower, q.upper), (Some(1.0), Some(2.0)));

        // perf and link rewritten, cm removed
        assert_eq!(sep.new_constraints.len(), 2);
        assert!(sep.model.find_constraint("cm").is_none());
        let perf = sep.model.find_constraint("perf").unwrap();
        assert!(!sep.model.constraint(perf).active);
        let new_perf = sep.rewritten_of[&perf];
        assert!(sep.model.constraint(new_perf).analyze().parameters.is_empty());
        assert_eq!(sep.master_name(new_perf), "perf");
    }

    #[test]
    fn test_performance_and_deterministic_split() {
        let sep = SeparationModel::build(&problem(), &box_settings()).unwrap();

        assert_eq!(sep.num_performance_constraints(), 1);
        assert_eq!(sep.separation_objectives.len(), 1);
        let det = sep.model.find_constraint("det").unwrap();
        assert_eq!(sep.deterministic_constraints, vec![det]);
        assert!(!sep.model.constraint(det).active);
        assert!(sep.active_objective().is_none());
    }

    #[test]
    fn test_worst_case_adds_epigraph() {
        let s = box_settings().with_objective_focus(ObjectiveFocus::WorstCase);
        let sep = SeparationModel::build(&problem(), &s).unwrap();

        let epi = sep.epigraph.unwrap();
        assert_eq!(sep.model.constraint(epi).name, EPIGRAPH_NAME);
        assert_eq!(sep.model.param(sep.zeta.unwrap()).value, 0.0);
        // Epigraph references the second-stage variable
        assert_eq!(sep.num_performance_constraints(), 2);
        assert!(sep.performance_constraints.iter().any(|&c| sep.is_epigraph(c)));
    }

    #[test]
    fn test_build_twice_is_stable() {
        let p = problem();
        let s = box_settings();
        let a = SeparationModel::build(&p, &s).unwrap();
        let b = SeparationModel::build(&p, &s).unwrap();

        assert_eq!(a.separation_objectives.len(), b.separation_objectives.len());
        assert_eq!(a.uncertain_param_vars.len(), b.uncertain_param_vars.len());
        assert_eq!(a.model.num_constraints(), b.model.num_constraints());
    }

    #[test]
    fn test_param_only_constraints_deactivated() {
        let mut p = problem();
        let link = p.model.find_constraint("link").unwrap();
        p.param_only_constraints = vec![link];

        let sep = SeparationModel::build(&p, &box_settings()).unwrap();

        assert_eq!(sep.param_only_constraints.len(), 2);
        for &c in &sep.param_only_constraints {
            assert!(!sep.model.constraint(c).active);
        }
    }

    #[test]
    fn test_certain_parameter_pinned() {
        let s = settings(Arc::new(DiscreteScenarioSet::new(vec![vec![1.5], vec![1.5]]).unwrap()));
        let sep = SeparationModel::build(&problem(), &s).unwrap();

        let q = sep.model.var(sep.uncertain_param_vars[0]);
        assert!(q.fixed);
        assert_eq!(q.value, Some(1.5));
        assert_eq!(sep.uncertainty_set_constraints.len(), 2);
    }

    #[test]
    fn test_is_certain() {
        assert!(is_certain(3.0, 3.0, 1e-4));
        assert!(is_certain(99.995, 100.0, 1e-4));
        assert!(!is_certain(0.0, 0.5, 1e-4));
    }

    #[test]
    fn test_dimension_mismatch() {
        let s = settings(Arc::new(BoxSet::new(vec![(0.0, 1.0), (0.0, 1.0)]).unwrap()));
        assert!(matches!(
            SeparationModel::build(&problem(), &s),
            Err(RoError::InvalidProblem(_))
        ));
    }

    #[test]
    fn test_unbounded_uncertain_constraint_rejected() {
        let mut p = problem();
        let q = p.uncertain_params[0];
        p.model
            .add_constraint(Constraint::new("free", None, q * 2.0, None))
            .unwrap();
        assert!(matches!(
            SeparationModel::build(&p, &box_settings()),
            Err(RoError::UnclassifiableConstraint(name)) if name == "free"
        ));
    }
}
