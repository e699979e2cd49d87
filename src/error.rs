use derive_more::{Display, From};

use crate::network::{EdgeKey, NetworkError, NodeId};
use crate::problem::{Commodity, Severity};

/// Malformed input, rejected before any solver work is done.
#[derive(Debug, Display, PartialEq)]
pub enum ValidationError {
    #[display(fmt = "origin node {} does not exist in the network", _0)]
    UnknownOrigin(NodeId),
    #[display(fmt = "destination node {} does not exist in the network", _0)]
    UnknownDestination(NodeId),
    #[display(fmt = "unknown severity label {:?}, expected Leve, Media or Critica", _0)]
    UnknownSeverity(String),
    #[display(fmt = "origin node {} is also listed as a destination", _0)]
    OriginIsDestination(NodeId),
    #[display(fmt = "no emergencies to route")]
    NoEmergencies,
    #[display(fmt = "emergency {} is listed more than once", _0)]
    DuplicateEmergency(Commodity),
    #[display(fmt = "edge ({}, {}, {}) is invalid: {}", from, to, key, reason)]
    InvalidEdge {
        from: NodeId,
        to: NodeId,
        key: EdgeKey,
        reason: &'static str,
    },
    #[display(fmt = "parameter {} is invalid: {}", name, reason)]
    InvalidParameter { name: &'static str, reason: String },
    #[display(fmt = "no cost configured for severity {}", _0)]
    MissingCost(Severity),
}

impl std::error::Error for ValidationError {}

/// Why the selected arcs of a commodity do not form a single origin-destination chain.
#[derive(Debug, Display, Clone, PartialEq)]
pub enum InconsistencyKind {
    #[display(fmt = "no selected arc leaves node {}", _0)]
    DeadEnd(NodeId),
    #[display(fmt = "{} selected arcs leave node {}", count, node)]
    Branch { node: NodeId, count: usize },
    #[display(fmt = "node {} is reached twice", _0)]
    Cycle(NodeId),
    #[display(fmt = "{} selected arcs are not on the path from the origin", _0)]
    StrayArcs(usize),
}

/// The arc selection of a solved model cannot be turned into a path.
///
/// Points at a defect in the formulation or in the solver adapter, never at bad user input.
#[derive(Debug, Display, Clone, PartialEq)]
#[display(fmt = "route of {} is inconsistent: {}", commodity, kind)]
pub struct ExtractionInconsistency {
    pub commodity: Commodity,
    pub kind: InconsistencyKind,
}

impl std::error::Error for ExtractionInconsistency {}

#[derive(Debug, Display, From)]
pub enum Error {
    #[display(fmt = "invalid input: {}", _0)]
    Validation(ValidationError),
    #[display(fmt = "invalid road network: {}", _0)]
    Network(NetworkError),
    #[display(fmt = "solver error: {}", _0)]
    Solver(grb::Error),
    #[display(fmt = "{}", _0)]
    Extraction(ExtractionInconsistency),
    #[display(fmt = "no solution available, the model has not been solved successfully")]
    #[from(ignore)]
    NoSolution,
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Validation(err) => Some(err),
            Error::Network(err) => Some(err),
            Error::Solver(err) => Some(err),
            Error::Extraction(err) => Some(err),
            Error::NoSolution => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
