//! Separation engine for cutting-set robust optimization.
//!
//! Given a first-stage decision from the master problem, the engine
//! searches the uncertainty set for the parameter realization that most
//! violates the problem's performance constraints:
//!
//! - [`SeparationModel`]: the deterministic model with uncertain parameters
//!   turned into surrogate variables and one maximize-violation objective
//!   per performance constraint
//! - [`solve_separation`]: priority-ordered search over local and global
//!   solver tiers with backup solvers and a shared time budget
//! - [`UncertaintySet`]: continuous sets ([`BoxSet`]) are searched by
//!   optimization, finite sets ([`DiscreteScenarioSet`]) by enumeration
//!
//! # Example
//!
//! ```ignore
//! use solver_robust::{MasterModel, RunContext, SeparationModel, solve_separation};
//!
//! let sep = SeparationModel::build(&problem, &settings)?;
//! let mut ctx = RunContext::new(MasterModel::new(nominal_block), sep);
//! let outcome = solve_separation(&mut ctx, &settings)?;
//! if outcome.worst_case.is_some() {
//!     println!("add scenario {:?}", outcome.violating_realization);
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod context;
pub mod diagnostics;
pub mod error;
pub mod problem;
pub mod separation;
pub mod settings;
pub mod solvers;
pub mod timing;
pub mod uncertainty;

pub use context::{MasterModel, RunContext};
pub use diagnostics::{subproblem_file_name, SubsolverFailureReport};
pub use error::{RoError, RoResult};
pub use problem::RobustProblem;
pub use separation::{
    solve_separation, SeparationModel, SeparationOutcome, SeparationResult, SeparationStop, WorstCase,
};
pub use settings::{ObjectiveFocus, SeparationSettings};
pub use solvers::{
    SolveFidelity, SolverDescriptor, SolverError, SolverOptions, SolverResults, SubSolver,
    TerminationCondition,
};
pub use timing::TimingData;
pub use uncertainty::{BoxSet, DiscreteScenarioSet, Geometry, UncertaintySet};
