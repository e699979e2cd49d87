use std::collections::BTreeMap;
use std::str::FromStr;
use std::time::Duration;

use derive_more::Display;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::network::Speed;
use crate::problem::Severity;

/// Wall-clock budget of a solve when the caller does not pick one
pub const DEFAULT_TIME_LIMIT: Duration = Duration::from_secs(60);

/// How the capacity of a road is shared between the ambulances using it.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CapacityMode {
    /// The required speeds of all ambulances on a road add up and must stay within its capacity.
    #[default]
    #[display(fmt = "aggregate")]
    Aggregate,
    /// Each ambulance's required speed must individually stay within the capacity.
    #[display(fmt = "per-commodity")]
    PerCommodity,
}

impl FromStr for CapacityMode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "aggregate" => Ok(CapacityMode::Aggregate),
            "per-commodity" => Ok(CapacityMode::PerCommodity),
            _ => Err(ValidationError::InvalidParameter {
                name: "capacity_mode",
                reason: format!("{:?} is neither aggregate nor per-commodity", s),
            }),
        }
    }
}

/// Parameters of a routing attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// Cost per kilometre travelled, by severity
    pub costs: BTreeMap<Severity, f64>,
    /// Required speed of the least urgent severity, km/h
    pub r_min: Speed,
    /// Required speed of the most urgent severity, km/h
    pub r_max: Speed,
    /// Wall-clock budget of the solver, seconds
    pub time_limit_secs: f64,
    pub capacity_mode: CapacityMode,
    /// Forward the solver's own console log
    pub solver_output: bool,
    /// Number of solver threads, `None` leaves the choice to the solver
    pub threads: Option<i32>,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        RoutingConfig {
            costs: BTreeMap::from([
                (Severity::Leve, 100.0),
                (Severity::Media, 250.0),
                (Severity::Critica, 500.0),
            ]),
            r_min: 20.0,
            r_max: 50.0,
            time_limit_secs: DEFAULT_TIME_LIMIT.as_secs_f64(),
            capacity_mode: CapacityMode::Aggregate,
            solver_output: false,
            threads: None,
        }
    }
}

impl RoutingConfig {
    pub fn with_speeds(mut self, r_min: Speed, r_max: Speed) -> Self {
        self.r_min = r_min;
        self.r_max = r_max;
        self
    }

    pub fn with_costs(mut self, costs: impl IntoIterator<Item = (Severity, f64)>) -> Self {
        self.costs = costs.into_iter().collect();
        self
    }

    pub fn with_capacity_mode(mut self, mode: CapacityMode) -> Self {
        self.capacity_mode = mode;
        self
    }

    /// Checks that the parameters describe a usable speed range, costs and time limit.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let invalid = |name, reason: String| -> Result<(), ValidationError> {
            Err(ValidationError::InvalidParameter { name, reason })
        };

        if !self.r_min.is_finite() || self.r_min <= 0.0 {
            return invalid("r_min", format!("must be positive, got {}", self.r_min));
        }
        if !self.r_max.is_finite() || self.r_max < self.r_min {
            return invalid(
                "r_max",
                format!("must be at least r_min = {}, got {}", self.r_min, self.r_max),
            );
        }
        let representable = Duration::try_from_secs_f64(self.time_limit_secs).is_ok();
        if !representable || self.time_limit_secs <= 0.0 {
            return invalid(
                "time_limit_secs",
                format!(
                    "must be a positive, representable duration, got {}",
                    self.time_limit_secs
                ),
            );
        }
        if let Some(threads) = self.threads {
            if threads < 0 {
                return invalid("threads", format!("must not be negative, got {}", threads));
            }
        }
        for (severity, cost) in &self.costs {
            // a free commodity lets the solver attach zero-cost cycles to its route
            if !cost.is_finite() || *cost <= 0.0 {
                return invalid(
                    "costs",
                    format!("cost of {} must be positive, got {}", severity, cost),
                );
            }
        }

        Ok(())
    }

    /// Cost per kilometre for an emergency of the given severity
    pub fn cost(&self, severity: Severity) -> Result<f64, ValidationError> {
        self.costs
            .get(&severity)
            .copied()
            .ok_or(ValidationError::MissingCost(severity))
    }

    /// Minimum speed a road must support for an ambulance of the given severity.
    ///
    /// Interpolates linearly over `[r_min, r_max]` by the severity's rank.
    pub fn required_speed(&self, severity: Severity) -> Speed {
        self.r_min + (self.r_max - self.r_min) * severity.urgency()
    }

    pub fn time_limit(&self) -> Result<Duration, ValidationError> {
        Duration::try_from_secs_f64(self.time_limit_secs).map_err(|err| {
            ValidationError::InvalidParameter {
                name: "time_limit_secs",
                reason: err.to_string(),
            }
        })
    }
}
