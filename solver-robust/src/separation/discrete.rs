//! Scenario enumeration for discrete uncertainty sets.

use std::collections::HashSet;

use solver_model::ModelError;

use super::results::{SeparationResult, SeparationStop};
use super::subproblem::solve_subproblem;
use crate::context::RunContext;
use crate::error::{RoError, RoResult};
use crate::settings::SeparationSettings;
use crate::solvers::SolveFidelity;

/// Solve one square subproblem per scenario not yet in the master.
///
/// Membership constraints come in one chunk of `dim` equalities per
/// scenario; each chunk's right-hand sides are used to fix the surrogates.
/// Enumeration stops on the time limit. A subsolver failure on one
/// scenario is reported after the remaining scenarios are tried.
pub(crate) fn discrete_solve(
    ctx: &mut RunContext,
    settings: &SeparationSettings,
    fidelity: SolveFidelity,
    nominal: f64,
) -> RoResult<(Vec<SeparationResult>, Option<SeparationStop>)> {
    let scenarios = settings
        .uncertainty_set
        .scenarios()
        .ok_or_else(|| RoError::InvalidProblem("discrete uncertainty set without scenarios".into()))?;

    let mut skip = HashSet::new();
    for point in &ctx.points_added_to_master {
        let index = scenarios
            .iter()
            .position(|s| s.as_slice() == point.as_slice())
            .ok_or_else(|| RoError::UnknownScenario(point.clone()))?;
        skip.insert(index);
    }

    let dim = ctx.separation.uncertain_param_vars.len();
    let membership = ctx.separation.uncertainty_set_constraints.clone();
    for &con in &membership {
        ctx.separation.model.set_constraint_active(con, false);
    }

    let mut results = Vec::new();
    let mut stop = None;
    for (scenario, chunk) in membership.chunks(dim).enumerate() {
        if skip.contains(&scenario) {
            continue;
        }
        for (i, &con) in chunk.iter().enumerate() {
            let model = &mut ctx.separation.model;
            model.set_constraint_active(con, true);
            let bound = match &model.constraint(con).lower {
                Some(expr) => model.value(expr).map_err(ModelError::from)?,
                None => {
                    return Err(RoError::InvalidProblem(format!(
                        "membership constraint {} has no right-hand side",
                        model.constraint(con).name
                    )))
                }
            };
            model.fix_at(ctx.separation.uncertain_param_vars[i], bound);
            model.set_constraint_active(con, false);
        }

        let (result, scenario_stop) = solve_subproblem(ctx, settings, fidelity, nominal)?;
        results.push(result);
        match scenario_stop {
            Some(SeparationStop::TimeLimit) => {
                stop = Some(SeparationStop::TimeLimit);
                break;
            }
            Some(SeparationStop::SubsolverFailure) => stop = Some(SeparationStop::SubsolverFailure),
            None => {}
        }
    }

    Ok((results, stop))
}
