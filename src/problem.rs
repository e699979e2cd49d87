use std::str::FromStr;

use derive_more::Display;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::network::NodeId;

/// Severity of an emergency, ordered by increasing urgency.
#[derive(
    Debug, Display, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Severity {
    Leve,
    Media,
    Critica,
}

impl Severity {
    /// Every severity, least urgent first. The position in this list is the rank.
    pub const ALL: [Severity; 3] = [Severity::Leve, Severity::Media, Severity::Critica];

    /// Ordinal rank of the severity, 0 for the least urgent
    pub fn rank(self) -> usize {
        Severity::ALL
            .iter()
            .position(|s| *s == self)
            .unwrap_or_default()
    }

    /// The rank scaled to `[0, 1]`, 0 for the least and 1 for the most urgent severity
    pub fn urgency(self) -> f64 {
        self.rank() as f64 / (Severity::ALL.len() - 1) as f64
    }

    pub fn label(self) -> &'static str {
        match self {
            Severity::Leve => "Leve",
            Severity::Media => "Media",
            Severity::Critica => "Critica",
        }
    }
}

impl FromStr for Severity {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Severity::ALL
            .into_iter()
            .find(|severity| severity.label() == s)
            .ok_or_else(|| ValidationError::UnknownSeverity(s.to_string()))
    }
}

/// One emergency to be served: a destination and how urgent it is.
///
/// A commodity keys exactly one flow from the shared origin.
#[derive(
    Debug, Display, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[display(fmt = "{}@{}", severity, destination)]
pub struct Commodity {
    pub destination: NodeId,
    pub severity: Severity,
}

impl Commodity {
    pub fn new(destination: NodeId, severity: Severity) -> Commodity {
        Commodity {
            destination,
            severity,
        }
    }
}
