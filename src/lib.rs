//! Routes several ambulances at once from a shared origin through a capacitated road network.
//!
//! The road network is turned into the sets of a multi-commodity flow model
//! ([`OptimizationData`]), which [`AmbulanceRoutingModel`] formulates as a MILP, solves with
//! Gurobi and turns back into routes and cost/time/distance summaries.

pub mod config;
pub mod error;
pub mod instance;
pub mod models;
pub mod network;
pub mod problem;

pub use config::{CapacityMode, RoutingConfig, DEFAULT_TIME_LIMIT};
pub use error::{Error, ExtractionInconsistency, Result, ValidationError};
pub use instance::{route, Instance, RoutingAttempt};
pub use models::routing::solution::{Route, SolutionReport, SolutionSummary};
pub use models::{AmbulanceRoutingModel, OptimizationData, SolveOutcome};
pub use network::{Edge, Node, NodeId, RoadNetwork};
pub use problem::{Commodity, Severity};
