//! Priority-ordered separation across solver tiers.

use solver_model::ConId;

use super::aggregate::worst_case;
use super::discrete::discrete_solve;
use super::results::{SeparationOutcome, SeparationResult, SeparationStop};
use super::subproblem::solve_subproblem;
use crate::context::RunContext;
use crate::error::{RoError, RoResult};
use crate::settings::SeparationSettings;
use crate::solvers::SolveFidelity;

/// Run one separation round against the current master solution.
///
/// Performance constraints are separated in bins of equal priority,
/// highest first. Each tier (local, then global unless bypassed) walks the
/// bins and returns as soon as the results gathered so far contain a
/// worst-case violation; the global tier only runs when the local tier
/// found none. A time-limit hit or a subproblem no solver could handle
/// ends the round immediately, reported through
/// [`SeparationOutcome::stop`].
pub fn solve_separation(ctx: &mut RunContext, settings: &SeparationSettings) -> RoResult<SeparationOutcome> {
    let bins = priority_bins(ctx, settings);
    let discrete = settings.uncertainty_set.geometry().is_discrete();

    let mut outcome = SeparationOutcome::default();
    for fidelity in separation_tiers(settings) {
        outcome.used_global = fidelity.is_global();
        outcome.results.clear();
        outcome.scheduled.clear();

        for (priority, members) in &bins {
            if settings.tee {
                log::info!(
                    "Separating {} constraint(s) of priority {} ({:?})",
                    members.len(),
                    priority,
                    fidelity
                );
            }
            for &k in members {
                let (row, stop) = separate_constraint(ctx, settings, fidelity, k, discrete)?;
                let time: f64 = row.iter().map(|r| r.solve_time).sum();
                if fidelity.is_global() {
                    outcome.global_time += time;
                } else {
                    outcome.local_time += time;
                }
                outcome.results.push(row);
                outcome.scheduled.push(k);

                if let Some(stop) = stop {
                    log::info!("Separation stopped early: {}", stop);
                    outcome.stop = Some(stop);
                    return Ok(outcome);
                }
            }

            if let Some(wc) = worst_case(&outcome.results, &outcome.scheduled) {
                let worst = &outcome.results[wc.row][wc.entry];
                outcome.violating_realization = worst.violating_param_realization.clone();
                outcome.violations = worst.list_of_scaled_violations.clone();
                outcome.worst_case = Some(wc);
                if settings.tee {
                    log::info!(
                        "Violation found in constraint {} with realization {:?}",
                        ctx.separation.master_name(ctx.separation.performance_constraints[wc.constraint]),
                        outcome.violating_realization
                    );
                }
                return Ok(outcome);
            }
        }
    }

    Ok(outcome)
}

/// Solver tiers in the order they are tried.
pub fn separation_tiers(settings: &SeparationSettings) -> Vec<SolveFidelity> {
    if settings.bypass_global_separation {
        vec![SolveFidelity::Local]
    } else if settings.bypass_local_separation {
        vec![SolveFidelity::Global]
    } else {
        vec![SolveFidelity::Local, SolveFidelity::Global]
    }
}

/// Performance constraint indices grouped by priority, highest first.
///
/// Priorities are looked up by the name the constraint has in the master
/// model; the epigraph constraint always gets 0.
pub(crate) fn priority_bins(ctx: &RunContext, settings: &SeparationSettings) -> Vec<(i64, Vec<usize>)> {
    let sep = &ctx.separation;
    let priorities: Vec<i64> = sep
        .performance_constraints
        .iter()
        .map(|&c| {
            if sep.is_epigraph(c) {
                0
            } else {
                settings.priority_of(sep.master_name(c))
            }
        })
        .collect();
    group_by_priority(&priorities)
}

/// Group indices by priority value, highest first, keeping index order
/// within a group.
pub fn group_by_priority(priorities: &[i64]) -> Vec<(i64, Vec<usize>)> {
    let mut levels: Vec<i64> = priorities.to_vec();
    levels.sort_unstable_by(|a, b| b.cmp(a));
    levels.dedup();
    levels
        .into_iter()
        .map(|p| {
            let members: Vec<usize> = priorities
                .iter()
                .enumerate()
                .filter(|(_, q)| **q == p)
                .map(|(i, _)| i)
                .collect();
            (p, members)
        })
        .collect()
}

/// Separate performance constraint `k` with its objective active.
fn separate_constraint(
    ctx: &mut RunContext,
    settings: &SeparationSettings,
    fidelity: SolveFidelity,
    k: usize,
    discrete: bool,
) -> RoResult<(Vec<SeparationResult>, Option<SeparationStop>)> {
    let perf = ctx.separation.performance_constraints[k];
    let obj = ctx.separation.objective_for(perf)?;

    ctx.separation.model.set_objective_active(obj, true);
    let outcome = run_subproblems(ctx, settings, fidelity, perf, discrete);
    ctx.separation.model.set_objective_active(obj, false);
    outcome
}

fn run_subproblems(
    ctx: &mut RunContext,
    settings: &SeparationSettings,
    fidelity: SolveFidelity,
    perf: ConId,
    discrete: bool,
) -> RoResult<(Vec<SeparationResult>, Option<SeparationStop>)> {
    let nominal = nominal_value(ctx, perf)?;
    if settings.tee {
        log::info!("Separating constraint {}", ctx.separation.master_name(perf));
    }
    if discrete {
        discrete_solve(ctx, settings, fidelity, nominal)
    } else {
        let (result, stop) = solve_subproblem(ctx, settings, fidelity, nominal)?;
        Ok((vec![result], stop))
    }
}

/// Value of a performance constraint's body in the master's nominal block.
fn nominal_value(ctx: &RunContext, perf: ConId) -> RoResult<f64> {
    let name = ctx.separation.master_name(perf);
    let unavailable = |reason: String| RoError::NominalValueUnavailable {
        name: name.to_string(),
        reason,
    };
    let nominal = ctx.master.nominal().map_err(|e| unavailable(e.to_string()))?;
    let id = nominal
        .find_constraint(name)
        .ok_or_else(|| unavailable("no such constraint in the nominal block".into()))?;
    nominal.body_value(id).map_err(|e| unavailable(e.to_string()))
}
