pub mod model;
pub mod sets_and_parameters;
pub mod solution;

#[cfg(test)]
pub(crate) mod fixtures;

pub use model::{AmbulanceRoutingModel, ModelStats, SolveOutcome};
pub use sets_and_parameters::{OptimizationData, Parameters};
