//! Diagnostics for subproblems no solver could handle.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::RoResult;
use crate::separation::SeparationModel;
use crate::settings::SeparationSettings;
use crate::solvers::TerminationCondition;

/// Structured record of a separation subproblem every solver failed on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubsolverFailureReport {
    /// Master iteration.
    pub iteration: usize,

    /// Name of the active separation objective.
    pub objective: String,

    /// Exported model file, if any.
    pub filename: Option<PathBuf>,

    /// Solver name -> termination condition of its attempt.
    pub status: BTreeMap<String, TerminationCondition>,
}

impl SubsolverFailureReport {
    /// Serialize as a single JSON line.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| format!("{:?}", self))
    }
}

/// File name of an exported separation subproblem.
pub fn subproblem_file_name(set_type: &str, model_name: &str, iteration: usize, objective: &str) -> String {
    format!("{}_{}_separation_{}_obj_{}.bar", set_type, model_name, iteration, objective)
}

/// Export the failed subproblem (when configured) and log the report.
pub(crate) fn report_subsolver_failure(
    sep: &SeparationModel,
    settings: &SeparationSettings,
    iteration: usize,
    status: BTreeMap<String, TerminationCondition>,
) -> RoResult<SubsolverFailureReport> {
    let objective = sep
        .active_objective()
        .map(|obj| sep.model.objective(obj).name.clone())
        .unwrap_or_default();

    let filename = match (&settings.subproblem_file_directory, settings.keepfiles) {
        (Some(dir), true) => {
            let path = dir.join(subproblem_file_name(
                settings.uncertainty_set.type_name(),
                sep.model.name(),
                iteration,
                &objective,
            ));
            solver_model::write_bar(&sep.model, &path)?;
            Some(path)
        }
        _ => None,
    };

    let report = SubsolverFailureReport {
        iteration,
        objective,
        filename,
        status,
    };
    log::warn!(
        "Separation subproblem could not be solved to an acceptable status by any subordinate solver: {}",
        report.to_json()
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_name() {
        assert_eq!(
            subproblem_file_name("box", "plant", 3, "separation_obj_1"),
            "box_plant_separation_3_obj_separation_obj_1.bar"
        );
    }

    #[test]
    fn test_report_json() {
        let mut status = BTreeMap::new();
        status.insert("ipopt".to_string(), TerminationCondition::Infeasible);
        let report = SubsolverFailureReport {
            iteration: 2,
            objective: "separation_obj_0".into(),
            filename: None,
            status,
        };

        let json = report.to_json();
        let back: SubsolverFailureReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back, report);
        assert!(json.contains("\"ipopt\":\"Infeasible\""));
    }
}
