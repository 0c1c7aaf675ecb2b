//! The separation engine.
//!
//! [`SeparationModel::build`] reformulates the deterministic model once per
//! run; [`solve_separation`] then searches the uncertainty set for the
//! worst violation of the current master solution.

mod aggregate;
mod builder;
mod discrete;
mod initialize;
mod model;
mod objectives;
mod results;
mod schedule;
mod subproblem;
mod violation;

pub use aggregate::worst_case;
pub use builder::{is_certain, EPIGRAPH_NAME};
pub use initialize::{initialize_separation, ABS_CON_CHECK_FEAS_TOL};
pub use model::SeparationModel;
pub use results::{SeparationOutcome, SeparationResult, SeparationStop, WorstCase};
pub use schedule::{group_by_priority, separation_tiers, solve_separation};
pub use violation::{is_violation, scale_violation};
