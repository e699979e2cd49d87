use std::collections::{HashMap, HashSet};

use derive_more::{Deref, Display, From, Into};
use log::{debug, trace};
use typed_index_collections::TiVec;

use crate::config::{CapacityMode, RoutingConfig};
use crate::error::ValidationError;
use crate::models::utils::VarIndex;
use crate::network::{Edge, NodeId, RoadNetwork, Speed};
use crate::problem::{Commodity, Severity};

/// Metres per kilometre; edge lengths come in metres, costs and speeds are per kilometre.
pub const METRES_PER_KM: f64 = 1000.0;

#[derive(Deref, Debug, Display, PartialEq, Eq, PartialOrd, Ord, From, Into, Clone, Copy, Hash)]
pub struct NodeIndex(usize);

#[derive(Deref, Debug, Display, PartialEq, Eq, PartialOrd, Ord, From, Into, Clone, Copy, Hash)]
pub struct EdgeIndex(usize);

#[derive(Deref, Debug, Display, PartialEq, Eq, PartialOrd, Ord, From, Into, Clone, Copy, Hash)]
pub struct CommodityIndex(usize);

macro_rules! var_index {
    ($($t:ident),*) => {
        $(impl VarIndex for $t {
            fn suffix(&self) -> String {
                self.0.to_string()
            }
        })*
    };
}

var_index!(NodeIndex, EdgeIndex, CommodityIndex);

/// The sets of the routing model: nodes, edges, commodities and the incidence structure.
///
/// Built once per routing attempt from the road network, the shared origin and the list of
/// emergencies. Holds no solver state.
#[derive(Debug, Clone)]
pub struct OptimizationData {
    /// The shared origin of every route
    pub origin: NodeIndex,
    /// Set of nodes
    pub nodes: TiVec<NodeIndex, NodeId>,
    /// Set of edges, with their attributes
    pub edges: TiVec<EdgeIndex, Edge>,
    /// Tail and head of every edge
    pub endpoints: TiVec<EdgeIndex, (NodeIndex, NodeIndex)>,
    /// Set of commodities, in the order the emergencies were given
    pub commodities: TiVec<CommodityIndex, Commodity>,
    /// Destination node of every commodity
    pub destinations: TiVec<CommodityIndex, NodeIndex>,
    /// Set of all outgoing edges of a node
    pub forward_star: TiVec<NodeIndex, Vec<EdgeIndex>>,
    /// Set of all incoming edges of a node
    pub reverse_star: TiVec<NodeIndex, Vec<EdgeIndex>>,
    node_index: HashMap<NodeId, NodeIndex>,
}

impl OptimizationData {
    /// Translates a road network, an origin and a list of `(destination, severity label)` pairs
    /// into the sets of the routing model.
    pub fn from_network<S: AsRef<str>>(
        network: &RoadNetwork,
        origin: NodeId,
        emergencies: &[(NodeId, S)],
    ) -> Result<OptimizationData, ValidationError> {
        if !network.contains_node(origin) {
            return Err(ValidationError::UnknownOrigin(origin));
        }
        if emergencies.is_empty() {
            return Err(ValidationError::NoEmergencies);
        }

        let mut commodities: TiVec<CommodityIndex, Commodity> = TiVec::new();
        let mut seen = HashSet::with_capacity(emergencies.len());
        for (destination, label) in emergencies {
            let severity: Severity = label.as_ref().parse()?;
            if !network.contains_node(*destination) {
                return Err(ValidationError::UnknownDestination(*destination));
            }
            if *destination == origin {
                return Err(ValidationError::OriginIsDestination(origin));
            }
            let commodity = Commodity::new(*destination, severity);
            if !seen.insert(commodity) {
                return Err(ValidationError::DuplicateEmergency(commodity));
            }
            commodities.push(commodity);
        }

        for edge in network.edges() {
            let invalid = |reason| ValidationError::InvalidEdge {
                from: edge.from,
                to: edge.to,
                key: edge.key,
                reason,
            };
            if !edge.length.is_finite() || edge.length < 0.0 {
                return Err(invalid("length must be finite and non-negative"));
            }
            if !edge.capacity.is_finite() || edge.capacity <= 0.0 {
                return Err(invalid("capacity must be finite and positive"));
            }
        }

        let mut nodes: TiVec<NodeIndex, NodeId> = TiVec::new();
        let mut node_index = HashMap::with_capacity(network.nodes().len());
        for node in network.nodes() {
            node_index.insert(node.id, NodeIndex(nodes.len()));
            nodes.push(node.id);
        }

        let edges: TiVec<EdgeIndex, Edge> = network.edges().to_vec().into();
        let mut forward_star: TiVec<NodeIndex, Vec<EdgeIndex>> =
            vec![Vec::new(); nodes.len()].into();
        let mut reverse_star: TiVec<NodeIndex, Vec<EdgeIndex>> =
            vec![Vec::new(); nodes.len()].into();
        let mut endpoints = TiVec::with_capacity(edges.len());
        for (e, edge) in edges.iter_enumerated() {
            // the network guarantees that both endpoints are known nodes
            let (u, v) = (node_index[&edge.from], node_index[&edge.to]);
            forward_star[u].push(e);
            reverse_star[v].push(e);
            endpoints.push((u, v));
        }

        let destinations = commodities
            .iter()
            .map(|c| node_index[&c.destination])
            .collect();

        debug!(
            "Instance with {} nodes, {} edges and {} commodities",
            nodes.len(),
            edges.len(),
            commodities.len()
        );
        trace!("Commodities: {:?}", commodities);

        Ok(OptimizationData {
            origin: node_index[&origin],
            nodes,
            edges,
            endpoints,
            commodities,
            destinations,
            forward_star,
            reverse_star,
            node_index,
        })
    }

    /// The identifier of the shared origin
    pub fn origin_id(&self) -> NodeId {
        self.nodes[self.origin]
    }

    pub fn node_index(&self, id: NodeId) -> Option<NodeIndex> {
        self.node_index.get(&id).copied()
    }

    /// Net outflow node `n` must have for commodity `k`: 1 at the origin, -1 at the destination.
    pub fn supply(&self, n: NodeIndex, k: CommodityIndex) -> f64 {
        if n == self.origin {
            1.0
        } else if n == self.destinations[k] {
            -1.0
        } else {
            0.0
        }
    }

    /// Edges that can carry a route. Self-loops never shorten a path, so they are left out.
    pub fn routable_edges(&self) -> impl Iterator<Item = EdgeIndex> + '_ {
        self.edges
            .iter_enumerated()
            .filter(|(_, edge)| !edge.is_loop())
            .map(|(e, _)| e)
    }
}

/// The numeric parameters of the routing model, derived from the sets and the configuration.
#[derive(Debug, Clone)]
pub struct Parameters {
    /// Minimum road speed demanded by commodity k, km/h
    pub required_speed: TiVec<CommodityIndex, Speed>,
    /// Cost per kilometre of commodity k
    pub cost: TiVec<CommodityIndex, f64>,
    /// Length of edge e in kilometres
    pub length_km: TiVec<EdgeIndex, f64>,
    /// Speed budget of edge e, km/h
    pub capacity: TiVec<EdgeIndex, Speed>,
    /// How the capacity is shared between commodities
    pub capacity_mode: CapacityMode,
}

impl Parameters {
    pub fn new(
        data: &OptimizationData,
        config: &RoutingConfig,
    ) -> Result<Parameters, ValidationError> {
        config.validate()?;

        let required_speed = data
            .commodities
            .iter()
            .map(|c| config.required_speed(c.severity))
            .collect();
        let cost = data
            .commodities
            .iter()
            .map(|c| config.cost(c.severity))
            .collect::<Result<_, _>>()?;

        Ok(Parameters {
            required_speed,
            cost,
            length_km: data.edges.iter().map(|e| e.length / METRES_PER_KM).collect(),
            capacity: data.edges.iter().map(|e| e.capacity).collect(),
            capacity_mode: config.capacity_mode,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::Edge;

    fn network() -> RoadNetwork {
        RoadNetwork::from_edges(vec![
            Edge::new(1, 2, 0, 500.0, 60.0),
            Edge::new(1, 2, 1, 700.0, 40.0),
            Edge::new(2, 3, 0, 250.0, 50.0),
            Edge::new(3, 3, 0, 10.0, 50.0),
            Edge::new(3, 1, 0, 900.0, 30.0),
        ])
        .unwrap()
    }

    #[test]
    fn builds_sets_in_input_order() {
        let data =
            OptimizationData::from_network(&network(), 1, &[(3, "Critica"), (2, "Leve")]).unwrap();

        assert_eq!(data.origin_id(), 1);
        assert_eq!(
            data.commodities.iter().copied().collect::<Vec<_>>(),
            vec![
                Commodity::new(3, Severity::Critica),
                Commodity::new(2, Severity::Leve)
            ]
        );
        assert_eq!(data.edges.len(), 5);

        let n1 = data.node_index(1).unwrap();
        let n2 = data.node_index(2).unwrap();
        let n3 = data.node_index(3).unwrap();
        assert_eq!(data.forward_star[n1], vec![EdgeIndex(0), EdgeIndex(1)]);
        assert_eq!(data.reverse_star[n2], vec![EdgeIndex(0), EdgeIndex(1)]);
        assert_eq!(data.forward_star[n3], vec![EdgeIndex(3), EdgeIndex(4)]);
        assert_eq!(data.reverse_star[n3], vec![EdgeIndex(2), EdgeIndex(3)]);
        assert_eq!(data.endpoints[EdgeIndex(2)], (n2, n3));
        assert_eq!(data.destinations[CommodityIndex(0)], n3);
    }

    #[test]
    fn supply_marks_origin_and_destination() {
        let data = OptimizationData::from_network(&network(), 1, &[(3, "Media")]).unwrap();
        let k = CommodityIndex(0);
        assert_eq!(data.supply(data.node_index(1).unwrap(), k), 1.0);
        assert_eq!(data.supply(data.node_index(2).unwrap(), k), 0.0);
        assert_eq!(data.supply(data.node_index(3).unwrap(), k), -1.0);
    }

    #[test]
    fn self_loops_are_not_routable() {
        let data = OptimizationData::from_network(&network(), 1, &[(3, "Media")]).unwrap();
        let routable: Vec<EdgeIndex> = data.routable_edges().collect();
        assert_eq!(
            routable,
            vec![EdgeIndex(0), EdgeIndex(1), EdgeIndex(2), EdgeIndex(4)]
        );
    }

    #[test]
    fn rejects_unknown_nodes_and_labels() {
        let network = network();
        assert_eq!(
            OptimizationData::from_network(&network, 9, &[(3, "Leve")]).unwrap_err(),
            ValidationError::UnknownOrigin(9)
        );
        assert_eq!(
            OptimizationData::from_network(&network, 1, &[(3, "Leve"), (8, "Leve")]).unwrap_err(),
            ValidationError::UnknownDestination(8)
        );
        assert_eq!(
            OptimizationData::from_network(&network, 1, &[(3, "Urgente")]).unwrap_err(),
            ValidationError::UnknownSeverity("Urgente".to_string())
        );
    }

    #[test]
    fn rejects_malformed_emergency_lists() {
        let network = network();
        let none: [(NodeId, &str); 0] = [];
        assert_eq!(
            OptimizationData::from_network(&network, 1, &none).unwrap_err(),
            ValidationError::NoEmergencies
        );
        assert_eq!(
            OptimizationData::from_network(&network, 1, &[(1, "Leve")]).unwrap_err(),
            ValidationError::OriginIsDestination(1)
        );
        assert_eq!(
            OptimizationData::from_network(&network, 1, &[(3, "Leve"), (3, "Leve")]).unwrap_err(),
            ValidationError::DuplicateEmergency(Commodity::new(3, Severity::Leve))
        );
        // the same place may have emergencies of different severities
        assert!(OptimizationData::from_network(&network, 1, &[(3, "Leve"), (3, "Media")]).is_ok());
    }

    #[test]
    fn rejects_invalid_edge_attributes() {
        let network = RoadNetwork::from_edges(vec![
            Edge::new(1, 2, 0, 500.0, 60.0),
            Edge::new(2, 3, 0, 250.0, 0.0),
        ])
        .unwrap();
        assert!(matches!(
            OptimizationData::from_network(&network, 1, &[(3, "Leve")]),
            Err(ValidationError::InvalidEdge { from: 2, to: 3, .. })
        ));

        let network = RoadNetwork::from_edges(vec![Edge::new(1, 2, 0, -1.0, 60.0)]).unwrap();
        assert!(matches!(
            OptimizationData::from_network(&network, 1, &[(2, "Leve")]),
            Err(ValidationError::InvalidEdge { from: 1, to: 2, .. })
        ));
    }

    #[test]
    fn parameters_follow_configuration() {
        let data =
            OptimizationData::from_network(&network(), 1, &[(3, "Critica"), (2, "Leve")]).unwrap();
        let config = RoutingConfig::default().with_speeds(10.0, 30.0);
        let parameters = Parameters::new(&data, &config).unwrap();

        assert_eq!(parameters.required_speed[CommodityIndex(0)], 30.0);
        assert_eq!(parameters.required_speed[CommodityIndex(1)], 10.0);
        assert_eq!(parameters.cost[CommodityIndex(0)], 500.0);
        assert_eq!(parameters.cost[CommodityIndex(1)], 100.0);
        assert_eq!(parameters.length_km[EdgeIndex(0)], 0.5);
        assert_eq!(parameters.capacity[EdgeIndex(4)], 30.0);
        assert_eq!(parameters.capacity_mode, CapacityMode::Aggregate);

        let config = RoutingConfig::default().with_costs([(Severity::Leve, 1.0)]);
        assert_eq!(
            Parameters::new(&data, &config).unwrap_err(),
            ValidationError::MissingCost(Severity::Critica)
        );
    }
}
