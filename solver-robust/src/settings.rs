//! Configuration settings for the separation engine.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::solvers::SolverDescriptor;
use crate::uncertainty::UncertaintySet;

/// Which objective the robust run optimizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ObjectiveFocus {
    /// Optimize the objective at the nominal realization.
    #[default]
    Nominal,

    /// Optimize the worst-case objective (adds an epigraph constraint).
    WorstCase,
}

/// Separation engine settings.
#[derive(Debug, Clone)]
pub struct SeparationSettings {
    // === Problem ===
    /// Objective focus of the robust run.
    pub objective_focus: ObjectiveFocus,

    /// Uncertainty set the adversary searches.
    pub uncertainty_set: Arc<dyn UncertaintySet>,

    /// Constraint name -> priority. Higher priorities are separated first;
    /// unlisted constraints get 0.
    pub separation_priority_order: HashMap<String, i64>,

    /// Decision rule order (0 = static).
    pub decision_rule_order: u32,

    // === Termination ===
    /// Time limit in milliseconds for the whole robust run (None = unlimited).
    pub time_limit_ms: Option<u64>,

    /// Relative tolerance on scaled constraint violations.
    pub robust_feasibility_tolerance: f64,

    // === Solvers ===
    /// Skip the local tier.
    pub bypass_local_separation: bool,

    /// Skip the global tier.
    pub bypass_global_separation: bool,

    /// Primary local solver.
    pub local_solver: SolverDescriptor,

    /// Primary global solver.
    pub global_solver: SolverDescriptor,

    /// Local solvers tried after the primary, in order.
    pub backup_local_solvers: Vec<SolverDescriptor>,

    /// Global solvers tried after the primary, in order.
    pub backup_global_solvers: Vec<SolverDescriptor>,

    // === Output ===
    /// Directory for subproblems that no solver could handle.
    pub subproblem_file_directory: Option<PathBuf>,

    /// Export failed subproblems to `subproblem_file_directory`.
    pub keepfiles: bool,

    /// Stream solver output and log per-constraint progress.
    pub tee: bool,
}

impl SeparationSettings {
    /// Settings with defaults for everything but the set and primary solvers.
    pub fn new(
        uncertainty_set: Arc<dyn UncertaintySet>,
        local_solver: SolverDescriptor,
        global_solver: SolverDescriptor,
    ) -> Self {
        Self {
            objective_focus: ObjectiveFocus::Nominal,
            uncertainty_set,
            separation_priority_order: HashMap::new(),
            decision_rule_order: 0,
            time_limit_ms: None,
            robust_feasibility_tolerance: 1e-4,
            bypass_local_separation: false,
            bypass_global_separation: false,
            local_solver,
            global_solver,
            backup_local_solvers: Vec::new(),
            backup_global_solvers: Vec::new(),
            subproblem_file_directory: None,
            keepfiles: false,
            tee: false,
        }
    }

    /// Set time limit in seconds. Zero means unlimited.
    pub fn with_time_limit(mut self, seconds: f64) -> Self {
        self.time_limit_ms = if seconds > 0.0 {
            Some((seconds * 1000.0) as u64)
        } else {
            None
        };
        self
    }

    /// Set the objective focus.
    pub fn with_objective_focus(mut self, focus: ObjectiveFocus) -> Self {
        self.objective_focus = focus;
        self
    }

    /// Assign a separation priority to a constraint.
    pub fn with_priority(mut self, constraint: impl Into<String>, priority: i64) -> Self {
        self.separation_priority_order.insert(constraint.into(), priority);
        self
    }

    /// Set the robust feasibility tolerance.
    pub fn with_tolerance(mut self, tol: f64) -> Self {
        self.robust_feasibility_tolerance = tol;
        self
    }

    /// Set the decision rule order.
    pub fn with_decision_rule_order(mut self, order: u32) -> Self {
        self.decision_rule_order = order;
        self
    }

    /// Append a backup local solver.
    pub fn with_backup_local(mut self, solver: SolverDescriptor) -> Self {
        self.backup_local_solvers.push(solver);
        self
    }

    /// Append a backup global solver.
    pub fn with_backup_global(mut self, solver: SolverDescriptor) -> Self {
        self.backup_global_solvers.push(solver);
        self
    }

    /// Skip local separation.
    pub fn bypass_local(mut self) -> Self {
        self.bypass_local_separation = true;
        self
    }

    /// Skip global separation.
    pub fn bypass_global(mut self) -> Self {
        self.bypass_global_separation = true;
        self
    }

    /// Export failed subproblems into `dir`.
    pub fn with_subproblem_files(mut self, dir: impl Into<PathBuf>) -> Self {
        self.subproblem_file_directory = Some(dir.into());
        self.keepfiles = true;
        self
    }

    /// Enable solver output and progress logging.
    pub fn with_tee(mut self, tee: bool) -> Self {
        self.tee = tee;
        self
    }

    /// Priority of a constraint by name (0 when unlisted).
    pub fn priority_of(&self, name: &str) -> i64 {
        self.separation_priority_order.get(name).copied().unwrap_or(0)
    }
}
