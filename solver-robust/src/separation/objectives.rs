//! Separation objective synthesis.

use solver_model::{ConId, Objective, ObjectiveSense};

use super::model::SeparationModel;
use crate::error::{RoError, RoResult};

/// Turn every eligible inequality into a maximize-violation objective.
///
/// Active inequalities that reference a surrogate, state or second-stage
/// variable become performance constraints: they are deactivated and get
/// an inactive objective `body - upper`. The remaining active inequalities
/// only involve fixed first-stage quantities and are deactivated.
pub(crate) fn synthesize_objectives(sep: &mut SeparationModel) -> RoResult<()> {
    let adversarial: Vec<_> = sep
        .uncertain_param_vars
        .iter()
        .chain(&sep.state_variables)
        .chain(&sep.second_stage_variables)
        .copied()
        .collect();

    let mut performance: Vec<ConId> = Vec::new();
    let mut deterministic: Vec<ConId> = Vec::new();
    for (id, con) in sep.model.active_constraints() {
        if con.equality {
            continue;
        }
        if con.analyze().references_any(&adversarial) {
            performance.push(id);
        } else {
            deterministic.push(id);
        }
    }

    for &id in &deterministic {
        sep.model.set_constraint_active(id, false);
    }
    sep.deterministic_constraints = deterministic;

    if performance.is_empty() {
        return Err(RoError::NoPerformanceConstraints);
    }

    for (idx, &id) in performance.iter().enumerate() {
        sep.model.set_constraint_active(id, false);
        let con = sep.model.constraint(id);
        let upper = match &con.upper {
            Some(upper) => upper.clone(),
            None => return Err(RoError::NonStandardInequality(con.name.clone())),
        };
        let expr = con.body.clone() - upper;
        let obj = sep.model.add_objective(Objective::new(
            format!("separation_obj_{}", idx),
            expr,
            ObjectiveSense::Maximize,
        ))?;
        sep.model.set_objective_active(obj, false);
        sep.separation_objectives.push(obj);
        sep.objective_of.insert(id, obj);
    }
    sep.performance_constraints = performance;

    Ok(())
}
