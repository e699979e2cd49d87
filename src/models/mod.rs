pub mod routing;
pub mod utils;

pub use routing::{AmbulanceRoutingModel, OptimizationData, SolveOutcome};
