//! The separation working model.

use std::collections::HashMap;

use solver_model::{ConId, Model, ObjId, ParamId, VarId};

use crate::error::{RoError, RoResult};

/// Working model of the separation problem.
///
/// Built once per robust run by [`SeparationModel::build`] and mutated in
/// place by every separation call (activation of objectives and
/// membership constraints, fixing, loaded solutions).
#[derive(Debug, Clone)]
pub struct SeparationModel {
    /// The reformulated model.
    pub model: Model,

    /// Surrogate variable per uncertain parameter, in parameter order.
    pub uncertain_param_vars: Vec<VarId>,

    /// Nominal value per uncertain parameter.
    pub nominal_param_values: Vec<f64>,

    /// Rewritten copies of every constraint that referenced an uncertain
    /// parameter, in creation order.
    pub new_constraints: Vec<ConId>,

    /// Rewritten constraint -> the original it replaces.
    pub original_of: HashMap<ConId, ConId>,

    /// Original constraint -> its rewritten copy.
    pub rewritten_of: HashMap<ConId, ConId>,

    /// `first_stage_obj + second_stage_obj - zeta <= 0` (worst-case focus only).
    pub epigraph: Option<ConId>,

    /// Epigraph level parameter, fixed at 0.
    pub zeta: Option<ParamId>,

    /// Membership constraints of the uncertainty set.
    pub uncertainty_set_constraints: Vec<ConId>,

    /// Inequalities separated against, in discovery order.
    pub performance_constraints: Vec<ConId>,

    /// `separation_objectives[k]` maximizes the violation of
    /// `performance_constraints[k]`.
    pub separation_objectives: Vec<ObjId>,

    /// Performance constraint -> its objective.
    pub objective_of: HashMap<ConId, ObjId>,

    /// Inequalities that depend on first-stage variables only; inactive.
    pub deterministic_constraints: Vec<ConId>,

    /// First-stage variables.
    pub first_stage_variables: Vec<VarId>,

    /// Second-stage variables.
    pub second_stage_variables: Vec<VarId>,

    /// State variables.
    pub state_variables: Vec<VarId>,

    /// Decision rule variables.
    pub decision_rule_variables: Vec<VarId>,

    /// Decision rule equations, originals and rewritten copies.
    pub decision_rule_equations: Vec<ConId>,

    /// Uncertain-parameter-only constraints, originals and rewritten copies.
    pub param_only_constraints: Vec<ConId>,
}

impl SeparationModel {
    /// Number of performance constraints.
    pub fn num_performance_constraints(&self) -> usize {
        self.performance_constraints.len()
    }

    /// Objective maximizing the violation of `constraint`.
    pub fn objective_for(&self, constraint: ConId) -> RoResult<ObjId> {
        self.objective_of
            .get(&constraint)
            .copied()
            .ok_or_else(|| RoError::MissingObjective(self.model.constraint(constraint).name.clone()))
    }

    /// Name under which a performance constraint appears in the master
    /// blocks: the original constraint for rewritten copies, the
    /// constraint itself otherwise.
    pub fn master_name(&self, constraint: ConId) -> &str {
        let id = self.original_of.get(&constraint).copied().unwrap_or(constraint);
        &self.model.constraint(id).name
    }

    /// Index of `constraint` in [`performance_constraints`](Self::performance_constraints).
    pub fn performance_index(&self, constraint: ConId) -> Option<usize> {
        self.performance_constraints.iter().position(|&c| c == constraint)
    }

    /// The single active objective, if any.
    pub fn active_objective(&self) -> Option<ObjId> {
        self.model.active_objectives().map(|(id, _)| id).next()
    }

    /// Whether `constraint` is the epigraph constraint.
    pub fn is_epigraph(&self, constraint: ConId) -> bool {
        match self.epigraph {
            Some(epi) => epi == constraint || self.original_of.get(&constraint) == Some(&epi),
            None => false,
        }
    }
}
