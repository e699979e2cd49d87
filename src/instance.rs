use serde::{Deserialize, Serialize};

use crate::config::RoutingConfig;
use crate::error::Result;
use crate::models::routing::solution::SolutionReport;
use crate::models::routing::{AmbulanceRoutingModel, ModelStats, OptimizationData, SolveOutcome};
use crate::network::{NodeId, RoadNetwork};

/// One emergency as it arrives from the outside: a node and a severity label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Emergency {
    pub destination: NodeId,
    pub severity: String,
}

/// A complete routing request: the road network, where the ambulances leave from, where they
/// are needed and the parameters to route them with.
#[derive(Debug, Clone, Deserialize)]
pub struct Instance {
    pub network: RoadNetwork,
    pub origin: NodeId,
    pub emergencies: Vec<Emergency>,
    #[serde(default)]
    pub config: RoutingConfig,
}

impl Instance {
    pub fn emergencies(&self) -> Vec<(NodeId, &str)> {
        self.emergencies
            .iter()
            .map(|e| (e.destination, e.severity.as_str()))
            .collect()
    }

    pub fn solve(&self) -> Result<RoutingAttempt> {
        route(&self.network, self.origin, &self.emergencies(), &self.config)
    }
}

/// The result of one build-solve-extract cycle.
#[derive(Debug, Clone)]
pub struct RoutingAttempt {
    pub outcome: SolveOutcome,
    pub stats: ModelStats,
    /// Present only if the solve found a feasible routing
    pub report: Option<SolutionReport>,
}

/// Runs the whole pipeline for one batch of emergencies with a fresh model.
pub fn route<S: AsRef<str>>(
    network: &RoadNetwork,
    origin: NodeId,
    emergencies: &[(NodeId, S)],
    config: &RoutingConfig,
) -> Result<RoutingAttempt> {
    let data = OptimizationData::from_network(network, origin, emergencies)?;
    let mut model = AmbulanceRoutingModel::build(&data, config)?;
    let outcome = model.solve(config.time_limit()?)?;
    let report = if outcome.is_success() {
        Some(model.report()?)
    } else {
        None
    };

    Ok(RoutingAttempt {
        outcome,
        stats: model.stats(),
        report,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CapacityMode;
    use crate::error::{Error, ValidationError};

    const INSTANCE: &str = r#"{
        "network": { "edges": [
            { "from": 1, "to": 2, "length": 400.0, "capacity": 60.0 },
            { "from": 2, "to": 3, "length": 300.0, "capacity": 60.0 },
            { "from": 1, "to": 3, "key": 0, "length": 900.0, "capacity": 45.0 }
        ] },
        "origin": 1,
        "emergencies": [
            { "destination": 3, "severity": "Critica" },
            { "destination": 2, "severity": "Leve" }
        ],
        "config": { "r_min": 15, "r_max": 35, "time_limit_secs": 10, "capacity_mode": "aggregate" }
    }"#;

    #[test]
    fn reads_instances() {
        let instance: Instance = serde_json::from_str(INSTANCE).unwrap();
        assert_eq!(instance.origin, 1);
        assert_eq!(instance.emergencies(), vec![(3, "Critica"), (2, "Leve")]);
        assert_eq!(instance.config.r_max, 35.0);
        assert_eq!(instance.config.capacity_mode, CapacityMode::Aggregate);
        assert_eq!(instance.network.edges().len(), 3);
    }

    #[test]
    fn rejects_bad_labels_before_solving() {
        let mut instance: Instance = serde_json::from_str(INSTANCE).unwrap();
        instance.emergencies[1].severity = "Moderada".to_string();
        assert!(matches!(
            instance.solve(),
            Err(Error::Validation(ValidationError::UnknownSeverity(_)))
        ));
    }

    #[test]
    fn solves_instances_end_to_end() {
        let instance: Instance = serde_json::from_str(INSTANCE).unwrap();
        let attempt = instance.solve().unwrap();
        assert!(attempt.outcome.is_success());

        // both share 1 -> 2 with 35 + 15 = 50 <= 60
        let report = attempt.report.unwrap();
        assert_eq!(report.routes[0].path, vec![1, 2, 3]);
        assert_eq!(report.routes[1].path, vec![1, 2]);
        assert!((report.total_distance_km - 1.1).abs() < 1e-6);
        assert_eq!(attempt.stats.variables, 6);
    }
}
