//! Violation evaluation at a separation solution.

use super::model::SeparationModel;
use super::results::SeparationResult;
use crate::error::{RoError, RoResult};

/// Scale a raw violation by `max(1, |nominal|)`.
pub fn scale_violation(raw: f64, nominal: f64) -> f64 {
    raw / nominal.abs().max(1.0)
}

/// Whether a scaled violation exceeds the tolerance.
pub fn is_violation(scaled: f64, tol: f64) -> bool {
    scaled > tol
}

/// Record the realization and all scaled violations of the current
/// solution in `result`.
///
/// Returns whether the constraint of the active objective is violated
/// beyond `tol`, relative to its nominal value.
pub(crate) fn update_violations(
    sep: &SeparationModel,
    nominal: f64,
    tol: f64,
    result: &mut SeparationResult,
) -> RoResult<bool> {
    let model = &sep.model;
    result.violating_param_realization = sep
        .uncertain_param_vars
        .iter()
        .map(|&v| model.var(v).value.unwrap_or(f64::NAN))
        .collect();

    let mut raw = Vec::with_capacity(sep.separation_objectives.len());
    for &obj in &sep.separation_objectives {
        let objective = model.objective(obj);
        match model.value(&objective.expr) {
            Ok(v) => raw.push(v),
            Err(source) => {
                log_stage_values(sep);
                return Err(RoError::MathDomain {
                    objective: objective.name.clone(),
                    source,
                });
            }
        }
    }
    result.list_of_scaled_violations = raw.iter().map(|&v| scale_violation(v, nominal)).collect();

    let active = sep
        .active_objective()
        .and_then(|obj| sep.separation_objectives.iter().position(|&o| o == obj))
        .ok_or_else(|| RoError::InvalidProblem("no active separation objective".into()))?;
    Ok(is_violation(result.list_of_scaled_violations[active], tol))
}

fn log_stage_values(sep: &SeparationModel) {
    for &v in sep.first_stage_variables.iter().chain(&sep.second_stage_variables) {
        let var = sep.model.var(v);
        log::error!("{} {:?}", var.name, var.value);
    }
}
