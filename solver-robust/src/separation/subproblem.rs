//! Subproblem solve with backup-solver fallback.

use std::collections::BTreeMap;
use std::time::Instant;

use super::initialize::initialize_separation;
use super::results::{SeparationResult, SeparationStop};
use super::violation::update_violations;
use crate::context::RunContext;
use crate::diagnostics::report_subsolver_failure;
use crate::error::{RoError, RoResult};
use crate::settings::SeparationSettings;
use crate::solvers::{adjust_time_limit, revert_time_limit, SolveAttempt, SolveFidelity, SolverDescriptor};

/// Solve the separation model with the active objective.
///
/// Solvers are tried in order (primary, then backups) until one reaches
/// an acceptable status for `fidelity`. A solver crash is fatal. The run
/// budget is checked after every attempt; when it is used up the result
/// reports no violation and [`SeparationStop::TimeLimit`].
pub(crate) fn solve_subproblem(
    ctx: &mut RunContext,
    settings: &SeparationSettings,
    fidelity: SolveFidelity,
    nominal: f64,
) -> RoResult<(SeparationResult, Option<SeparationStop>)> {
    let solvers = solver_sequence(settings, fidelity);

    initialize_separation(ctx, settings)?;

    let mut result = SeparationResult::default();
    let mut status = BTreeMap::new();
    for mut opt in solvers {
        let adjustment = adjust_time_limit(&mut opt.options, &ctx.timing, settings.time_limit_ms);
        let started = Instant::now();
        let raw = opt.solver.solve(&ctx.separation.model, &opt.options, settings.tee);
        let elapsed = started.elapsed().as_secs_f64();
        revert_time_limit(&mut opt.options, adjustment);
        result.solve_time += elapsed;

        let (acceptable, mut results) = match SolveAttempt::classify(raw, fidelity) {
            SolveAttempt::Acceptable(results) => (true, results),
            SolveAttempt::Unacceptable(results) => (false, results),
            SolveAttempt::ToolFailure(source) => {
                log::error!(
                    "Solver {} encountered exception attempting to optimize separation problem in iteration {}",
                    opt,
                    ctx.iteration
                );
                return Err(RoError::Subsolver {
                    solver: opt.name().to_string(),
                    iteration: ctx.iteration,
                    source,
                });
            }
        };
        results.wall_time = elapsed;
        status.insert(opt.name().to_string(), results.termination);
        result.termination = Some(results.termination);

        if ctx.timing.budget_exceeded(settings.time_limit_ms) {
            result.found_violation = false;
            result.results = Some(results);
            return Ok((result, Some(SeparationStop::TimeLimit)));
        }

        if acceptable {
            ctx.separation.model.load_solution(&results.solution);
            result.results = Some(results);
            result.found_violation = update_violations(
                &ctx.separation,
                nominal,
                settings.robust_feasibility_tolerance,
                &mut result,
            )?;
            return Ok((result, None));
        }
        result.results = Some(results);
    }

    result.found_violation = false;
    report_subsolver_failure(&ctx.separation, settings, ctx.iteration, status)?;
    Ok((result, Some(SeparationStop::SubsolverFailure)))
}

/// Primary solver followed by the backups of the tier, cloned for this call.
fn solver_sequence(settings: &SeparationSettings, fidelity: SolveFidelity) -> Vec<SolverDescriptor> {
    let (primary, backups) = match fidelity {
        SolveFidelity::Local => (&settings.local_solver, &settings.backup_local_solvers),
        SolveFidelity::Global => (&settings.global_solver, &settings.backup_global_solvers),
    };
    std::iter::once(primary).chain(backups).cloned().collect()
}
