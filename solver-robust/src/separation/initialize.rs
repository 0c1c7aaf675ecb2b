//! Warm start of the separation model from the master problem.

use std::collections::HashSet;

use solver_model::{Model, VarId};

use crate::context::RunContext;
use crate::error::{RoError, RoResult};
use crate::settings::{ObjectiveFocus, SeparationSettings};

/// Absolute tolerance of the initial-point feasibility check.
pub const ABS_CON_CHECK_FEAS_TOL: f64 = 1e-5;

/// Initialize the separation model from the latest master iterate.
///
/// Values are copied by name from the source block (nominal block for a
/// nominal focus, the current iteration's block otherwise). First-stage
/// and decision rule variables are fixed. For continuous sets the
/// surrogates start at the point added to the master for that block;
/// discrete sets leave them to the scenario enumerator.
///
/// With a static decision rule the second-stage and decision rule
/// variables are fixed and the decision rule equations deactivated.
pub fn initialize_separation(ctx: &mut RunContext, settings: &SeparationSettings) -> RoResult<()> {
    let block_num = match settings.objective_focus {
        ObjectiveFocus::Nominal => 0,
        ObjectiveFocus::WorstCase => ctx.iteration,
    };
    let block = ctx.master.block(block_num)?;
    let sep = &mut ctx.separation;

    let fixed: HashSet<VarId> = sep
        .first_stage_variables
        .iter()
        .chain(&sep.decision_rule_variables)
        .copied()
        .collect();
    for (_, master_var) in block.variables() {
        let Some(id) = sep.model.find_var(&master_var.name) else {
            continue;
        };
        sep.model.set_value(id, master_var.value);
        if fixed.contains(&id) {
            sep.model.fix(id);
        }
    }

    if !settings.uncertainty_set.geometry().is_discrete() {
        if let Some(point) = ctx.points_added_to_master.get(block_num) {
            for (&var, &val) in sep.uncertain_param_vars.iter().zip(point) {
                // Pinned parameters keep their nominal value
                if !sep.model.var(var).fixed {
                    sep.model.set_value(var, Some(val));
                }
            }
        }
    }

    let static_rule = settings.decision_rule_order == 0;
    for &var in &sep.second_stage_variables {
        if static_rule {
            sep.model.fix(var);
        } else {
            sep.model.unfix(var);
        }
    }
    if static_rule {
        for &con in &sep.decision_rule_equations {
            sep.model.set_constraint_active(con, false);
        }
        for &var in &sep.decision_rule_variables {
            sep.model.fix(var);
        }
    }

    let active: Vec<String> = sep
        .param_only_constraints
        .iter()
        .map(|&c| sep.model.constraint(c))
        .filter(|c| c.active)
        .map(|c| c.name.clone())
        .collect();
    if !active.is_empty() {
        return Err(RoError::ActiveParamOnlyConstraints(active));
    }

    log_initial_infeasibilities(&sep.model);
    Ok(())
}

/// Log active constraints the initial point violates. Never fatal.
fn log_initial_infeasibilities(model: &Model) {
    if !log::log_enabled!(log::Level::Debug) {
        return;
    }
    for (_, con) in model.active_constraints() {
        let lb = con.lower.as_ref().map(|e| model.value(e));
        let ub = con.upper.as_ref().map(|e| model.value(e));
        let body = model.value(&con.body);
        match (lb.transpose(), body, ub.transpose()) {
            (Ok(lb), Ok(val), Ok(ub)) => {
                let lb_viol = lb.map_or(false, |lb| val < lb - ABS_CON_CHECK_FEAS_TOL);
                let ub_viol = ub.map_or(false, |ub| val > ub + ABS_CON_CHECK_FEAS_TOL);
                if lb_viol || ub_viol {
                    log::debug!("{} {:?} {} {:?}", con.name, lb, val, ub);
                }
            }
            _ => log::debug!("{}: not evaluable at the initial point", con.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::MasterModel;
    use crate::problem::RobustProblem;
    use crate::separation::SeparationModel;
    use crate::solvers::{SolverDescriptor, SolverError, SolverOptions, SolverResults, SubSolver};
    use crate::uncertainty::{BoxSet, DiscreteScenarioSet, UncertaintySet};
    use solver_model::{Constraint, Expr, Variable};
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

    /// x first-stage, z second-stage, d decision rule, q uncertain:
    ///   perf: q * x + z <= 10
    ///   dr:   z - d * q == 0
    fn problem() -> RobustProblem {
        let mut m = Model::new("toy");
        let x = m.add_variable(Variable::new("x").with_value(0.0)).unwrap();
        let z = m.add_variable(Variable::new("z").with_value(0.0)).unwrap();
        let d = m.add_variable(Variable::new("d").with_value(0.0)).unwrap();
        let q = m.add_param("q", 1.0).unwrap();
        m.add_constraint(Constraint::le("perf", q * x + z, 10.0)).unwrap();
        let dr = m.add_constraint(Constraint::eq("dr", z - d * q, 0.0)).unwrap();
        RobustProblem::new(m, vec![q])
            .with_first_stage(vec![x])
            .with_second_stage(vec![z])
            .with_decision_rule(vec![d], vec![dr])
            .with_objectives(Expr::from(x), Expr::from(z))
    }

    fn master_block(x: f64, z: f64, d: f64) -> Model {
        let mut m = Model::new("block");
        m.add_variable(Variable::new("x").with_value(x)).unwrap();
        m.add_variable(Variable::new("z").with_value(z)).unwrap();
        m.add_variable(Variable::new("d").with_value(d)).unwrap();
        m
    }

    fn context(set: Arc<dyn UncertaintySet>) -> (RunContext, SeparationSettings) {
        let s = settings(set);
        let sep = SeparationModel::build(&problem(), &s).unwrap();
        let mut ctx = RunContext::new(MasterModel::new(master_block(3.0, 4.0, 0.5)), sep);
        ctx.points_added_to_master = vec![vec![1.7]];
        (ctx, s)
    }

    #[test]
    fn test_copies_values_and_fixes_first_stage() {
        let (mut ctx, s) = context(Arc::new(BoxSet::new(vec![(1.0, 2.0)]).unwrap()));
        initialize_separation(&mut ctx, &s).unwrap();

        let m = &ctx.separation.model;
        let x = m.find_var("x").unwrap();
        let z = m.find_var("z").unwrap();
        assert_eq!(m.var(x).value, Some(3.0));
        assert!(m.var(x).fixed);
        assert_eq!(m.var(z).value, Some(4.0));

        // Continuous set: surrogate at the last master point
        let q = ctx.separation.uncertain_param_vars[0];
        assert_eq!(m.var(q).value, Some(1.7));
    }

    #[test]
    fn test_static_rule_fixes_second_stage() {
        let (mut ctx, s) = context(Arc::new(BoxSet::new(vec![(1.0, 2.0)]).unwrap()));
        initialize_separation(&mut ctx, &s).unwrap();

        let sep = &ctx.separation;
        let z = sep.model.find_var("z").unwrap();
        let d = sep.model.find_var("d").unwrap();
        assert!(sep.model.var(z).fixed);
        assert!(sep.model.var(d).fixed);
        for &c in &sep.decision_rule_equations {
            assert!(!sep.model.constraint(c).active);
        }
    }

    #[test]
    fn test_affine_rule_unfixes_second_stage() {
        let (mut ctx, s) = context(Arc::new(BoxSet::new(vec![(1.0, 2.0)]).unwrap()));
        let s = s.with_decision_rule_order(1);
        let z = ctx.separation.model.find_var("z").unwrap();
        ctx.separation.model.fix(z);

        initialize_separation(&mut ctx, &s).unwrap();

        assert!(!ctx.separation.model.var(z).fixed);
        let rewritten_dr = ctx.separation.decision_rule_equations[1];
        assert!(ctx.separation.model.constraint(rewritten_dr).active);
    }

    #[test]
    fn test_discrete_leaves_surrogates() {
        let set = Arc::new(DiscreteScenarioSet::new(vec![vec![1.0], vec![2.0]]).unwrap());
        let (mut ctx, s) = context(set);
        initialize_separation(&mut ctx, &s).unwrap();

        let q = ctx.separation.uncertain_param_vars[0];
        assert_eq!(ctx.separation.model.var(q).value, Some(1.0));
    }

    #[test]
    fn test_active_param_only_constraint_is_fatal() {
        let (mut ctx, s) = context(Arc::new(BoxSet::new(vec![(1.0, 2.0)]).unwrap()));
        // An affine rule leaves the decision rule equations alone
        let s = s.with_decision_rule_order(1);
        let dr = ctx.separation.model.find_constraint("dr").unwrap();
        ctx.separation.param_only_constraints = vec![dr];
        ctx.separation.model.set_constraint_active(dr, true);

        assert!(matches!(
            initialize_separation(&mut ctx, &s),
            Err(RoError::ActiveParamOnlyConstraints(names)) if names == vec!["dr".to_string()]
        ));
    }
}
