//! State shared between the master loop and the separation engine.

use solver_model::Model;

use crate::error::{RoError, RoResult};
use crate::separation::SeparationModel;
use crate::timing::TimingData;

/// Scenario blocks of the master problem.
///
/// Block 0 is the nominal scenario; block `k` was added in master
/// iteration `k`. Variable and constraint names inside a block match the
/// names in the separation model.
#[derive(Debug, Clone, Default)]
pub struct MasterModel {
    /// Scenario blocks, nominal first.
    pub blocks: Vec<Model>,
}

impl MasterModel {
    /// Master with a nominal block only.
    pub fn new(nominal: Model) -> Self {
        Self { blocks: vec![nominal] }
    }

    /// Append a scenario block.
    pub fn push_block(&mut self, block: Model) {
        self.blocks.push(block);
    }

    /// Nominal scenario block.
    pub fn nominal(&self) -> RoResult<&Model> {
        self.block(0)
    }

    /// Scenario block `index`.
    pub fn block(&self, index: usize) -> RoResult<&Model> {
        self.blocks.get(index).ok_or_else(|| {
            RoError::InvalidProblem(format!(
                "Master has {} scenario blocks, block {} requested",
                self.blocks.len(),
                index
            ))
        })
    }
}

/// Run context handed to every separation call.
#[derive(Debug)]
pub struct RunContext {
    /// Master problem blocks from the latest master solve.
    pub master: MasterModel,

    /// Working separation model, mutated in place by each call.
    pub separation: SeparationModel,

    /// Current master iteration.
    pub iteration: usize,

    /// Main timer of the run.
    pub timing: TimingData,

    /// Parameter realizations already added to the master, one per block.
    pub points_added_to_master: Vec<Vec<f64>>,
}

impl RunContext {
    /// Context for iteration 0, timer started now.
    ///
    /// The nominal parameter values are recorded as the first point added
    /// to the master.
    pub fn new(master: MasterModel, separation: SeparationModel) -> Self {
        let nominal = separation.nominal_param_values.clone();
        Self {
            master,
            separation,
            iteration: 0,
            timing: TimingData::new(),
            points_added_to_master: vec![nominal],
        }
    }

    /// Use an existing run timer.
    pub fn with_timing(mut self, timing: TimingData) -> Self {
        self.timing = timing;
        self
    }

    /// Record a master block added for `point` and advance the iteration.
    pub fn add_master_scenario(&mut self, block: Model, point: Vec<f64>) {
        self.master.push_block(block);
        self.points_added_to_master.push(point);
        self.iteration += 1;
    }
}
