#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use solver_model::{Constraint, Expr, Model, VarId, Variable};
use solver_robust::{
    MasterModel, RobustProblem, RunContext, SeparationModel, SeparationSettings, SolverDescriptor,
    SolverError, SolverOptions, SolverResults, SubSolver, TerminationCondition, UncertaintySet,
};

/// Maximizes the active objective over the vertices of the free
/// variables' bounds, skipping vertices that violate an active constraint.
#[derive(Debug)]
pub struct VertexMaximizer {
    name: String,
    termination: TerminationCondition,
    pub calls: AtomicUsize,
    pub objectives: Mutex<Vec<String>>,
    pub time_limits: Mutex<Vec<Option<f64>>>,
}

impl VertexMaximizer {
    pub fn new(name: &str, termination: TerminationCondition) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            termination,
            calls: AtomicUsize::new(0),
            objectives: Mutex::new(Vec::new()),
            time_limits: Mutex::new(Vec::new()),
        })
    }

    pub fn local() -> Arc<Self> {
        Self::new("vertex-local", TerminationCondition::LocallyOptimal)
    }

    pub fn global() -> Arc<Self> {
        Self::new("vertex-global", TerminationCondition::GloballyOptimal)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn objectives(&self) -> Vec<String> {
        self.objectives.lock().unwrap().clone()
    }
}

fn feasible(model: &Model) -> bool {
    const TOL: f64 = 1e-9;
    model.active_constraints().all(|(_, c)| {
        let Ok(body) = model.value(&c.body) else {
            return false;
        };
        let lower_ok = match &c.lower {
            Some(e) => model.value(e).map_or(false, |lb| body >= lb - TOL),
            None => true,
        };
        let upper_ok = match &c.upper {
            Some(e) => model.value(e).map_or(false, |ub| body <= ub + TOL),
            None => true,
        };
        lower_ok && upper_ok
    })
}

impl SubSolver for VertexMaximizer {
    fn name(&self) -> &str {
        &self.name
    }

    fn solve(&self, model: &Model, options: &SolverOptions, _tee: bool) -> Result<SolverResults, SolverError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.time_limits.lock().unwrap().push(options.time_limit_secs);

        let Some((_, objective)) = model.active_objectives().next() else {
            return Err(SolverError::Unsupported("no active objective".into()));
        };
        self.objectives.lock().unwrap().push(objective.name.clone());

        let free: Vec<VarId> = model
            .variables()
            .filter(|(_, v)| !v.fixed)
            .map(|(id, _)| id)
            .collect();
        let mut bounds = Vec::new();
        for &id in &free {
            match (model.var(id).lower, model.var(id).upper) {
                (Some(lb), Some(ub)) => bounds.push((lb, ub)),
                _ => return Ok(SolverResults::new(TerminationCondition::Error)),
            }
        }

        let mut trial = model.clone();
        let mut best: Option<(f64, Vec<(VarId, f64)>)> = None;
        for mask in 0..(1u32 << free.len()) {
            let point: Vec<(VarId, f64)> = free
                .iter()
                .zip(&bounds)
                .enumerate()
                .map(|(i, (&id, &(lb, ub)))| (id, if (mask >> i) & 1 == 1 { ub } else { lb }))
                .collect();
            trial.load_solution(&point);
            if !feasible(&trial) {
                continue;
            }
            let Ok(value) = trial.value(&objective.expr) else {
                continue;
            };
            if best.as_ref().map_or(true, |(b, _)| value > *b) {
                best = Some((value, point));
            }
        }

        Ok(match best {
            Some((_, point)) => SolverResults::new(self.termination).with_solution(point),
            None => SolverResults::new(TerminationCondition::Infeasible),
        })
    }
}

/// Returns a fixed termination condition and no solution.
#[derive(Debug)]
pub struct StatusOnly {
    name: String,
    termination: TerminationCondition,
    pub calls: AtomicUsize,
}

impl StatusOnly {
    pub fn new(name: &str, termination: TerminationCondition) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            termination,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl SubSolver for StatusOnly {
    fn name(&self) -> &str {
        &self.name
    }

    fn solve(&self, _: &Model, _: &SolverOptions, _: bool) -> Result<SolverResults, SolverError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(SolverResults::new(self.termination))
    }
}

/// Reports local optimality at a fixed point, given by variable name.
#[derive(Debug)]
pub struct FixedPoint {
    point: Vec<(String, f64)>,
}

impl FixedPoint {
    pub fn new(point: &[(&str, f64)]) -> Arc<Self> {
        Arc::new(Self {
            point: point.iter().map(|&(n, v)| (n.to_string(), v)).collect(),
        })
    }
}

impl SubSolver for FixedPoint {
    fn name(&self) -> &str {
        "fixed-point"
    }

    fn solve(&self, model: &Model, _: &SolverOptions, _: bool) -> Result<SolverResults, SolverError> {
        let solution = self
            .point
            .iter()
            .filter_map(|(name, value)| model.find_var(name).map(|id| (id, *value)))
            .collect();
        Ok(SolverResults::new(TerminationCondition::LocallyOptimal).with_solution(solution))
    }
}

/// Fails like a crashed solver process.
#[derive(Debug)]
pub struct Crashing;

impl SubSolver for Crashing {
    fn name(&self) -> &str {
        "crash"
    }

    fn solve(&self, _: &Model, _: &SolverOptions, _: bool) -> Result<SolverResults, SolverError> {
        Err(SolverError::Application("segmentation fault".into()))
    }
}

pub fn descriptor(solver: Arc<dyn SubSolver>) -> SolverDescriptor {
    SolverDescriptor::new(solver)
}

pub fn settings(
    set: Arc<dyn UncertaintySet>,
    local: Arc<dyn SubSolver>,
    global: Arc<dyn SubSolver>,
) -> SeparationSettings {
    SeparationSettings::new(set, descriptor(local), descriptor(global))
}

/// One first-stage variable `x` and two uncertain parameters (nominal 1):
///   c1: q1 * x <= 1.5
///   c2: q2 * x <= 1.2
pub fn two_constraint_model() -> (Model, RobustProblem) {
    let mut m = Model::new("plant");
    let x = m.add_variable(Variable::new("x").with_value(1.0)).unwrap();
    let q1 = m.add_param("q1", 1.0).unwrap();
    let q2 = m.add_param("q2", 1.0).unwrap();
    m.add_constraint(Constraint::le("c1", q1 * x, 1.5)).unwrap();
    m.add_constraint(Constraint::le("c2", q2 * x, 1.2)).unwrap();

    let problem = RobustProblem::new(m.clone(), vec![q1, q2])
        .with_first_stage(vec![x])
        .with_objectives(Expr::from(x), Expr::Const(0.0));
    (m, problem)
}

/// Nominal master block: the deterministic model at `x`.
pub fn master_at(model: &Model, x: f64) -> Model {
    let mut block = model.clone();
    let id = block.find_var("x").unwrap();
    block.set_value(id, Some(x));
    block
}

pub fn context(problem: &RobustProblem, nominal_block: Model, settings: &SeparationSettings) -> RunContext {
    let sep = SeparationModel::build(problem, settings).unwrap();
    RunContext::new(MasterModel::new(nominal_block), sep)
}

pub fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}
