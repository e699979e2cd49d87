use std::collections::{BTreeMap, HashMap, HashSet};

use log::trace;
use serde::Serialize;
use typed_index_collections::TiVec;

use super::sets_and_parameters::{
    CommodityIndex, EdgeIndex, NodeIndex, OptimizationData, Parameters,
};
use crate::error::{ExtractionInconsistency, InconsistencyKind};
use crate::network::{EdgeKey, NodeId, Speed};
use crate::problem::{Commodity, Severity};

/// Values above this are read as "arc selected"
pub const SELECTION_THRESHOLD: f64 = 0.5;

/// The arc selection of a successfully solved routing model.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutingResult {
    /// Objective value of the incumbent
    pub objective: f64,
    /// The edges selected for commodity k, in edge order
    pub arcs: TiVec<CommodityIndex, Vec<EdgeIndex>>,
}

/// Distance, travel time and cost of one route.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RouteSummary {
    pub cost: f64,
    pub time_minutes: f64,
    pub distance_km: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommoditySummary {
    pub commodity: Commodity,
    pub required_speed: Speed,
    #[serde(flatten)]
    pub route: RouteSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SolutionSummary {
    /// One entry per commodity, in the order the emergencies were given
    pub commodities: Vec<CommoditySummary>,
    pub total_cost: f64,
    pub total_time_minutes: f64,
    pub total_distance_km: f64,
}

impl SolutionSummary {
    pub fn get(&self, commodity: &Commodity) -> Option<&RouteSummary> {
        self.commodities
            .iter()
            .find(|s| s.commodity == *commodity)
            .map(|s| &s.route)
    }
}

/// The ordered nodes a commodity visits, from the origin to its destination.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Route {
    pub commodity: Commodity,
    pub path: Vec<NodeId>,
}

/// How much of an edge's capacity the selected routes consume.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EdgeUsage {
    pub from: NodeId,
    pub to: NodeId,
    pub key: EdgeKey,
    pub capacity: Speed,
    /// Sum of the required speeds of the commodities on the edge
    pub load: Speed,
    pub commodities: Vec<Commodity>,
}

impl EdgeUsage {
    pub fn is_shared(&self) -> bool {
        self.commodities.len() > 1
    }

    /// Whether the load stays within capacity, up to `tolerance`
    pub fn within_capacity(&self, tolerance: f64) -> bool {
        self.load <= self.capacity + tolerance
    }
}

/// Everything a consumer needs to display or store a solved routing attempt.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SolutionReport {
    pub origin: NodeId,
    pub objective: f64,
    pub total_cost: f64,
    pub total_time_minutes: f64,
    pub total_distance_km: f64,
    pub routes: Vec<ReportEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportEntry {
    pub destination: NodeId,
    pub severity: Severity,
    pub required_speed: Speed,
    pub path: Vec<NodeId>,
    pub metrics: RouteSummary,
}

impl RoutingResult {
    /// Reads the selected arcs out of the arc-selection values, indexed `(e, k)`.
    pub fn from_values(
        data: &OptimizationData,
        objective: f64,
        values: &HashMap<(EdgeIndex, CommodityIndex), f64>,
    ) -> RoutingResult {
        let mut arcs: TiVec<CommodityIndex, Vec<EdgeIndex>> =
            vec![Vec::new(); data.commodities.len()].into();
        for (&(e, k), &value) in values {
            if value > SELECTION_THRESHOLD {
                arcs[k].push(e);
            }
        }
        arcs.iter_mut().for_each(|a| a.sort_unstable());

        RoutingResult { objective, arcs }
    }

    /// Length of the route of commodity k, in kilometres
    pub fn distance_km(&self, parameters: &Parameters, k: CommodityIndex) -> f64 {
        self.arcs[k].iter().map(|e| parameters.length_km[*e]).sum()
    }

    pub fn summary(&self, data: &OptimizationData, parameters: &Parameters) -> SolutionSummary {
        let commodities: Vec<CommoditySummary> = data
            .commodities
            .iter_enumerated()
            .map(|(k, commodity)| {
                let distance_km = self.distance_km(parameters, k);
                let speed = parameters.required_speed[k];
                CommoditySummary {
                    commodity: *commodity,
                    required_speed: speed,
                    route: RouteSummary {
                        cost: parameters.cost[k] * distance_km,
                        time_minutes: distance_km / speed * 60.0,
                        distance_km,
                    },
                }
            })
            .collect();

        SolutionSummary {
            total_cost: commodities.iter().map(|s| s.route.cost).sum(),
            total_time_minutes: commodities.iter().map(|s| s.route.time_minutes).sum(),
            total_distance_km: commodities.iter().map(|s| s.route.distance_km).sum(),
            commodities,
        }
    }

    pub fn routes(&self, data: &OptimizationData) -> Result<Vec<Route>, ExtractionInconsistency> {
        data.commodities
            .iter_enumerated()
            .map(|(k, commodity)| {
                let path = trace_route(data, k, &self.arcs[k])?;
                Ok(Route {
                    commodity: *commodity,
                    path: path.into_iter().map(|n| data.nodes[n]).collect(),
                })
            })
            .collect()
    }

    /// Selected `(from, to, key)` arcs of every commodity
    pub fn selected_arcs(
        &self,
        data: &OptimizationData,
    ) -> Vec<(Commodity, Vec<(NodeId, NodeId, EdgeKey)>)> {
        data.commodities
            .iter_enumerated()
            .map(|(k, commodity)| {
                let arcs = self.arcs[k].iter().map(|e| data.edges[*e].id()).collect();
                (*commodity, arcs)
            })
            .collect()
    }

    /// Capacity consumption of every edge used by at least one commodity, in edge order
    pub fn edge_usage(&self, data: &OptimizationData, parameters: &Parameters) -> Vec<EdgeUsage> {
        let mut users: BTreeMap<EdgeIndex, Vec<CommodityIndex>> = BTreeMap::new();
        for (k, arcs) in self.arcs.iter_enumerated() {
            for e in arcs {
                users.entry(*e).or_default().push(k);
            }
        }

        users
            .into_iter()
            .map(|(e, ks)| {
                let edge = &data.edges[e];
                EdgeUsage {
                    from: edge.from,
                    to: edge.to,
                    key: edge.key,
                    capacity: parameters.capacity[e],
                    load: ks.iter().map(|k| parameters.required_speed[*k]).sum(),
                    commodities: ks.iter().map(|k| data.commodities[*k]).collect(),
                }
            })
            .collect()
    }

    pub fn report(
        &self,
        data: &OptimizationData,
        parameters: &Parameters,
    ) -> Result<SolutionReport, ExtractionInconsistency> {
        let summary = self.summary(data, parameters);
        let routes = self.routes(data)?;

        let entries = summary
            .commodities
            .iter()
            .zip(routes)
            .map(|(s, route)| ReportEntry {
                destination: s.commodity.destination,
                severity: s.commodity.severity,
                required_speed: s.required_speed,
                path: route.path,
                metrics: s.route,
            })
            .collect();

        Ok(SolutionReport {
            origin: data.origin_id(),
            objective: self.objective,
            total_cost: summary.total_cost,
            total_time_minutes: summary.total_time_minutes,
            total_distance_km: summary.total_distance_km,
            routes: entries,
        })
    }
}

/// Walks the selected arcs of commodity `k` from the origin to its destination.
///
/// Every node on the way must have exactly one selected outgoing arc, no node may be reached
/// twice, and every selected arc must lie on the walk.
pub fn trace_route(
    data: &OptimizationData,
    k: CommodityIndex,
    arcs: &[EdgeIndex],
) -> Result<Vec<NodeIndex>, ExtractionInconsistency> {
    let inconsistent = |kind| ExtractionInconsistency {
        commodity: data.commodities[k],
        kind,
    };

    let mut successors: HashMap<NodeIndex, Vec<EdgeIndex>> = HashMap::with_capacity(arcs.len());
    for e in arcs {
        successors.entry(data.endpoints[*e].0).or_default().push(*e);
    }

    let destination = data.destinations[k];
    let mut node = data.origin;
    let mut path = vec![node];
    let mut visited = HashSet::from([node]);

    while node != destination {
        let head = match successors.get(&node).map(Vec::as_slice).unwrap_or_default() {
            [] => return Err(inconsistent(InconsistencyKind::DeadEnd(data.nodes[node]))),
            [e] => data.endpoints[*e].1,
            out => {
                return Err(inconsistent(InconsistencyKind::Branch {
                    node: data.nodes[node],
                    count: out.len(),
                }))
            }
        };
        if !visited.insert(head) {
            return Err(inconsistent(InconsistencyKind::Cycle(data.nodes[head])));
        }
        path.push(head);
        node = head;
    }

    let used = path.len() - 1;
    if used != arcs.len() {
        return Err(inconsistent(InconsistencyKind::StrayArcs(arcs.len() - used)));
    }

    trace!("Route of {}: {:?}", data.commodities[k], path);
    Ok(path)
}
