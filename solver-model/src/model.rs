//! Model container: variables, parameters, constraints and objectives.
//!
//! Components are addressed by typed indices that stay valid across
//! [`Clone`], so a cloned model corresponds structurally to its source.
//! Every component also carries a unique, fully qualified name.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{EvalError, ModelError, ModelResult};
use crate::expr::{analyze_all, Expr, ExprAnalysis, ParamId, Valuation, VarId};

/// Index of a constraint inside its owning model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConId(pub usize);

/// Index of an objective inside its owning model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjId(pub usize);

/// A decision variable.
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    /// Fully qualified name.
    pub name: String,

    /// Current value (None = uninitialized).
    pub value: Option<f64>,

    /// Lower bound (None = -inf).
    pub lower: Option<f64>,

    /// Upper bound (None = +inf).
    pub upper: Option<f64>,

    /// Fixed variables are treated as constants by solvers.
    pub fixed: bool,
}

impl Variable {
    /// Free, uninitialized variable.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: None,
            lower: None,
            upper: None,
            fixed: false,
        }
    }

    /// Set bounds.
    pub fn with_bounds(mut self, lower: Option<f64>, upper: Option<f64>) -> Self {
        self.lower = lower;
        self.upper = upper;
        self
    }

    /// Set the initial value.
    pub fn with_value(mut self, value: f64) -> Self {
        self.value = Some(value);
        self
    }
}

/// A named mutable parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    /// Fully qualified name.
    pub name: String,

    /// Current value.
    pub value: f64,
}

/// A constraint `lower <= body <= upper`.
///
/// Equalities carry the same expression in both bounds and set `equality`.
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    /// Fully qualified name.
    pub name: String,

    /// Lower bound expression, if any.
    pub lower: Option<Expr>,

    /// Constraint body.
    pub body: Expr,

    /// Upper bound expression, if any.
    pub upper: Option<Expr>,

    /// True for `body == rhs`.
    pub equality: bool,

    /// Inactive constraints are ignored by solvers.
    pub active: bool,
}

impl Constraint {
    /// General constraint with optional bounds.
    pub fn new(
        name: impl Into<String>,
        lower: Option<Expr>,
        body: impl Into<Expr>,
        upper: Option<Expr>,
    ) -> Self {
        Self {
            name: name.into(),
            lower,
            body: body.into(),
            upper,
            equality: false,
            active: true,
        }
    }

    /// `body == rhs`.
    pub fn eq(name: impl Into<String>, body: impl Into<Expr>, rhs: impl Into<Expr>) -> Self {
        let rhs = rhs.into();
        Self {
            name: name.into(),
            lower: Some(rhs.clone()),
            body: body.into(),
            upper: Some(rhs),
            equality: true,
            active: true,
        }
    }

    /// `body <= upper`.
    pub fn le(name: impl Into<String>, body: impl Into<Expr>, upper: impl Into<Expr>) -> Self {
        Self::new(name, None, body, Some(upper.into()))
    }

    /// `body >= lower`.
    pub fn ge(name: impl Into<String>, body: impl Into<Expr>, lower: impl Into<Expr>) -> Self {
        Self::new(name, Some(lower.into()), body, None)
    }

    /// Components referenced by the body and both bounds.
    pub fn analyze(&self) -> ExprAnalysis {
        analyze_all(
            std::iter::once(&self.body)
                .chain(self.lower.iter())
                .chain(self.upper.iter()),
        )
    }
}

/// Optimization direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObjectiveSense {
    /// Minimize the expression.
    Minimize,

    /// Maximize the expression.
    Maximize,
}

/// A named objective.
#[derive(Debug, Clone, PartialEq)]
pub struct Objective {
    /// Fully qualified name.
    pub name: String,

    /// Objective expression.
    pub expr: Expr,

    /// Direction.
    pub sense: ObjectiveSense,

    /// Only active objectives are handed to solvers.
    pub active: bool,
}

impl Objective {
    /// Active objective.
    pub fn new(name: impl Into<String>, expr: impl Into<Expr>, sense: ObjectiveSense) -> Self {
        Self {
            name: name.into(),
            expr: expr.into(),
            sense,
            active: true,
        }
    }
}

/// Symbolic optimization model.
#[derive(Debug, Clone, Default)]
pub struct Model {
    name: String,
    variables: Vec<Variable>,
    parameters: Vec<Parameter>,
    constraints: Vec<Constraint>,
    removed: Vec<bool>,
    objectives: Vec<Objective>,
    var_names: HashMap<String, VarId>,
    param_names: HashMap<String, ParamId>,
    con_names: HashMap<String, ConId>,
    obj_names: HashMap<String, ObjId>,
}

impl Model {
    /// Empty model.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Model name.
    pub fn name(&self) -> &str {
        &self.name
    }

    // === Construction ===

    /// Add a free, uninitialized variable.
    pub fn add_var(&mut self, name: impl Into<String>) -> ModelResult<VarId> {
        self.add_variable(Variable::new(name))
    }

    /// Add a fully specified variable.
    pub fn add_variable(&mut self, var: Variable) -> ModelResult<VarId> {
        if self.var_names.contains_key(&var.name) {
            return Err(ModelError::DuplicateName(var.name));
        }
        let id = VarId(self.variables.len());
        self.var_names.insert(var.name.clone(), id);
        self.variables.push(var);
        Ok(id)
    }

    /// Add a mutable parameter.
    pub fn add_param(&mut self, name: impl Into<String>, value: f64) -> ModelResult<ParamId> {
        let name = name.into();
        if self.param_names.contains_key(&name) {
            return Err(ModelError::DuplicateName(name));
        }
        let id = ParamId(self.parameters.len());
        self.param_names.insert(name.clone(), id);
        self.parameters.push(Parameter { name, value });
        Ok(id)
    }

    /// Add a constraint.
    pub fn add_constraint(&mut self, con: Constraint) -> ModelResult<ConId> {
        if self.con_names.contains_key(&con.name) {
            return Err(ModelError::DuplicateName(con.name));
        }
        let id = ConId(self.constraints.len());
        self.con_names.insert(con.name.clone(), id);
        self.constraints.push(con);
        self.removed.push(false);
        Ok(id)
    }

    /// Add an objective.
    pub fn add_objective(&mut self, obj: Objective) -> ModelResult<ObjId> {
        if self.obj_names.contains_key(&obj.name) {
            return Err(ModelError::DuplicateName(obj.name));
        }
        let id = ObjId(self.objectives.len());
        self.obj_names.insert(obj.name.clone(), id);
        self.objectives.push(obj);
        Ok(id)
    }

    /// Permanently remove a constraint.
    ///
    /// The index is never reused; the name becomes available again.
    pub fn remove_constraint(&mut self, id: ConId) {
        if self.removed[id.0] {
            return;
        }
        self.removed[id.0] = true;
        self.constraints[id.0].active = false;
        self.con_names.remove(&self.constraints[id.0].name);
    }

    // === Lookup ===

    /// Variable by index.
    pub fn var(&self, id: VarId) -> &Variable {
        &self.variables[id.0]
    }

    /// Mutable variable by index.
    pub fn var_mut(&mut self, id: VarId) -> &mut Variable {
        &mut self.variables[id.0]
    }

    /// Parameter by index.
    pub fn param(&self, id: ParamId) -> &Parameter {
        &self.parameters[id.0]
    }

    /// Mutable parameter by index.
    pub fn param_mut(&mut self, id: ParamId) -> &mut Parameter {
        &mut self.parameters[id.0]
    }

    /// Constraint by index.
    pub fn constraint(&self, id: ConId) -> &Constraint {
        &self.constraints[id.0]
    }

    /// Mutable constraint by index.
    pub fn constraint_mut(&mut self, id: ConId) -> &mut Constraint {
        &mut self.constraints[id.0]
    }

    /// Objective by index.
    pub fn objective(&self, id: ObjId) -> &Objective {
        &self.objectives[id.0]
    }

    /// Mutable objective by index.
    pub fn objective_mut(&mut self, id: ObjId) -> &mut Objective {
        &mut self.objectives[id.0]
    }

    /// Find a variable by its fully qualified name.
    pub fn find_var(&self, name: &str) -> Option<VarId> {
        self.var_names.get(name).copied()
    }

    /// Find a parameter by its fully qualified name.
    pub fn find_param(&self, name: &str) -> Option<ParamId> {
        self.param_names.get(name).copied()
    }

    /// Find a (non-removed) constraint by its fully qualified name.
    pub fn find_constraint(&self, name: &str) -> Option<ConId> {
        self.con_names.get(name).copied()
    }

    /// Find an objective by its fully qualified name.
    pub fn find_objective(&self, name: &str) -> Option<ObjId> {
        self.obj_names.get(name).copied()
    }

    /// Whether a constraint has been removed.
    pub fn is_removed(&self, id: ConId) -> bool {
        self.removed[id.0]
    }

    /// Whether `id` names a non-removed constraint of this model.
    pub fn has_constraint(&self, id: ConId) -> bool {
        self.removed.get(id.0).map_or(false, |removed| !removed)
    }

    // === Iteration ===

    /// Number of variables.
    pub fn num_vars(&self) -> usize {
        self.variables.len()
    }

    /// Number of parameters.
    pub fn num_params(&self) -> usize {
        self.parameters.len()
    }

    /// Number of non-removed constraints.
    pub fn num_constraints(&self) -> usize {
        self.removed.iter().filter(|r| !**r).count()
    }

    /// Number of objectives.
    pub fn num_objectives(&self) -> usize {
        self.objectives.len()
    }

    /// All variables.
    pub fn variables(&self) -> impl Iterator<Item = (VarId, &Variable)> {
        self.variables.iter().enumerate().map(|(i, v)| (VarId(i), v))
    }

    /// All parameters.
    pub fn parameters(&self) -> impl Iterator<Item = (ParamId, &Parameter)> {
        self.parameters.iter().enumerate().map(|(i, p)| (ParamId(i), p))
    }

    /// All non-removed constraints, in insertion order.
    pub fn constraints(&self) -> impl Iterator<Item = (ConId, &Constraint)> {
        self.constraints
            .iter()
            .enumerate()
            .filter(move |(i, _)| !self.removed[*i])
            .map(|(i, c)| (ConId(i), c))
    }

    /// Active constraints, in insertion order.
    pub fn active_constraints(&self) -> impl Iterator<Item = (ConId, &Constraint)> {
        self.constraints().filter(|(_, c)| c.active)
    }

    /// All objectives.
    pub fn objectives(&self) -> impl Iterator<Item = (ObjId, &Objective)> {
        self.objectives.iter().enumerate().map(|(i, o)| (ObjId(i), o))
    }

    /// Active objectives.
    pub fn active_objectives(&self) -> impl Iterator<Item = (ObjId, &Objective)> {
        self.objectives().filter(|(_, o)| o.active)
    }

    // === State changes ===

    /// Activate or deactivate a constraint. Removed constraints stay inactive.
    pub fn set_constraint_active(&mut self, id: ConId, active: bool) {
        if !self.removed[id.0] {
            self.constraints[id.0].active = active;
        }
    }

    /// Activate or deactivate an objective.
    pub fn set_objective_active(&mut self, id: ObjId, active: bool) {
        self.objectives[id.0].active = active;
    }

    /// Set a variable's value without touching its fixed flag.
    pub fn set_value(&mut self, id: VarId, value: Option<f64>) {
        self.variables[id.0].value = value;
    }

    /// Fix a variable at its current value.
    pub fn fix(&mut self, id: VarId) {
        self.variables[id.0].fixed = true;
    }

    /// Fix a variable at the given value.
    pub fn fix_at(&mut self, id: VarId, value: f64) {
        let var = &mut self.variables[id.0];
        var.value = Some(value);
        var.fixed = true;
    }

    /// Release a fixed variable.
    pub fn unfix(&mut self, id: VarId) {
        self.variables[id.0].fixed = false;
    }

    /// Load solver values. Fixed variables keep their values.
    pub fn load_solution(&mut self, values: &[(VarId, f64)]) {
        for &(id, value) in values {
            if let Some(var) = self.variables.get_mut(id.0) {
                if !var.fixed {
                    var.value = Some(value);
                }
            }
        }
    }

    // === Evaluation ===

    /// Evaluate an expression at the current values.
    pub fn value(&self, expr: &Expr) -> Result<f64, EvalError> {
        expr.eval(self)
    }

    /// Current value of a constraint's body.
    pub fn body_value(&self, id: ConId) -> Result<f64, EvalError> {
        self.constraints[id.0].body.eval(self)
    }
}

impl Valuation for Model {
    fn var_value(&self, var: VarId) -> Result<f64, EvalError> {
        self.variables
            .get(var.0)
            .ok_or(EvalError::UnknownVariable(var))?
            .value
            .ok_or(EvalError::UnvaluedVariable(var))
    }

    fn param_value(&self, param: ParamId) -> Result<f64, EvalError> {
        self.parameters
            .get(param.0)
            .map(|p| p.value)
            .ok_or(EvalError::UnknownParameter(param))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_model() -> (Model, VarId, ParamId, ConId) {
        let mut m = Model::new("small");
        let x = m
            .add_variable(Variable::new("x").with_bounds(Some(0.0), Some(10.0)).with_value(2.0))
            .unwrap();
        let q = m.add_param("q", 3.0).unwrap();
        let c = m.add_constraint(Constraint::le("c1", x * q, 12.0)).unwrap();
        (m, x, q, c)
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let (mut m, _, _, _) = small_model();
        assert!(matches!(m.add_var("x"), Err(ModelError::DuplicateName(_))));
        assert!(matches!(
            m.add_constraint(Constraint::le("c1", 0.0, 1.0)),
            Err(ModelError::DuplicateName(_))
        ));
    }

    #[test]
    fn test_body_value_and_lookup() {
        let (m, x, _, c) = small_model();
        assert_eq!(m.find_var("x"), Some(x));
        assert_eq!(m.find_constraint("c1"), Some(c));
        assert_eq!(m.body_value(c), Ok(6.0));
    }

    #[test]
    fn test_clone_preserves_indices() {
        let (m, x, q, c) = small_model();
        let mut copy = m.clone();
        copy.set_value(x, Some(4.0));

        assert_eq!(copy.var(x).name, "x");
        assert_eq!(copy.param(q).name, "q");
        assert_eq!(copy.body_value(c), Ok(12.0));
        // Source untouched
        assert_eq!(m.body_value(c), Ok(6.0));
    }

    #[test]
    fn test_remove_constraint() {
        let (mut m, _, _, c) = small_model();
        m.remove_constraint(c);

        assert!(m.is_removed(c));
        assert_eq!(m.find_constraint("c1"), None);
        assert_eq!(m.num_constraints(), 0);
        assert_eq!(m.active_constraints().count(), 0);

        // Removed constraints cannot be reactivated
        m.set_constraint_active(c, true);
        assert!(!m.constraint(c).active);
    }

    #[test]
    fn test_load_solution_skips_fixed() {
        let (mut m, x, _, _) = small_model();
        let y = m.add_var("y").unwrap();
        m.fix(x);

        m.load_solution(&[(x, 9.0), (y, 1.5)]);

        assert_eq!(m.var(x).value, Some(2.0));
        assert_eq!(m.var(y).value, Some(1.5));
    }
}
