use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Opaque identifier of an intersection, as handed out by the network provider.
pub type NodeId = u64;
/// Distinguishes parallel edges between the same pair of nodes.
pub type EdgeKey = u32;
/// The type used for road lengths, in metres.
pub type Length = f64;
/// The type used for speeds and capacities, in km/h.
pub type Speed = f64;

/// A point in 2d-space (longitude/latitude or projected coordinates).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point(pub f64, pub f64);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// The identifier of the node
    pub id: NodeId,
    /// Where the node is located, if known
    #[serde(default)]
    pub position: Option<Point>,
}

impl Node {
    pub fn new(id: NodeId) -> Node {
        Node { id, position: None }
    }
}

/// A directed road segment `(from, to, key)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub from: NodeId,
    pub to: NodeId,
    #[serde(default)]
    pub key: EdgeKey,
    /// Length of the road segment in metres
    pub length: Length,
    /// Speed budget of the road segment in km/h, shared by everyone using it
    pub capacity: Speed,
}

impl Edge {
    pub fn new(from: NodeId, to: NodeId, key: EdgeKey, length: Length, capacity: Speed) -> Edge {
        Edge {
            from,
            to,
            key,
            length,
            capacity,
        }
    }

    /// The `(from, to, key)` triple identifying the edge
    pub fn id(&self) -> (NodeId, NodeId, EdgeKey) {
        (self.from, self.to, self.key)
    }

    pub fn is_loop(&self) -> bool {
        self.from == self.to
    }
}

#[derive(Debug, Display, PartialEq)]
pub enum NetworkError {
    #[display(fmt = "node {} appears more than once", _0)]
    DuplicateNode(NodeId),
    #[display(fmt = "edge ({}, {}, {}) references unknown node {}", from, to, key, node)]
    UnknownEndpoint {
        from: NodeId,
        to: NodeId,
        key: EdgeKey,
        node: NodeId,
    },
    #[display(fmt = "edge ({}, {}, {}) appears more than once", _0, _1, _2)]
    DuplicateEdge(NodeId, NodeId, EdgeKey),
}

impl std::error::Error for NetworkError {}

/// A directed road multigraph with length and capacity on every edge.
///
/// This is the boundary to whatever supplies the road data (a map download, a cache, a JSON file).
/// The network only guarantees structural consistency: every node appears once, every edge
/// connects known nodes, and no `(from, to, key)` triple is repeated.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "RawRoadNetwork")]
pub struct RoadNetwork {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    #[serde(skip)]
    index: HashMap<NodeId, usize>,
}

#[derive(Deserialize)]
struct RawRoadNetwork {
    #[serde(default)]
    nodes: Vec<Node>,
    edges: Vec<Edge>,
}

impl TryFrom<RawRoadNetwork> for RoadNetwork {
    type Error = NetworkError;

    fn try_from(raw: RawRoadNetwork) -> Result<Self, Self::Error> {
        // networks given as a plain edge list get their nodes from the edge endpoints
        if raw.nodes.is_empty() {
            RoadNetwork::from_edges(raw.edges)
        } else {
            RoadNetwork::new(raw.nodes, raw.edges)
        }
    }
}

impl RoadNetwork {
    pub fn new(nodes: Vec<Node>, edges: Vec<Edge>) -> Result<RoadNetwork, NetworkError> {
        let mut index = HashMap::with_capacity(nodes.len());
        for (i, node) in nodes.iter().enumerate() {
            if index.insert(node.id, i).is_some() {
                return Err(NetworkError::DuplicateNode(node.id));
            }
        }

        let mut seen = HashSet::with_capacity(edges.len());
        for edge in &edges {
            for node in [edge.from, edge.to] {
                if !index.contains_key(&node) {
                    return Err(NetworkError::UnknownEndpoint {
                        from: edge.from,
                        to: edge.to,
                        key: edge.key,
                        node,
                    });
                }
            }
            if !seen.insert(edge.id()) {
                let (from, to, key) = edge.id();
                return Err(NetworkError::DuplicateEdge(from, to, key));
            }
        }

        Ok(RoadNetwork {
            nodes,
            edges,
            index,
        })
    }

    /// Creates a network whose nodes are the endpoints of `edges`, in order of first appearance.
    pub fn from_edges(edges: Vec<Edge>) -> Result<RoadNetwork, NetworkError> {
        let mut seen = HashSet::new();
        let nodes = edges
            .iter()
            .flat_map(|e| [e.from, e.to])
            .filter(|id| seen.insert(*id))
            .map(Node::new)
            .collect();

        RoadNetwork::new(nodes, edges)
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.index.get(&id).map(|i| &self.nodes[*i])
    }

    pub fn contains_node(&self, id: NodeId) -> bool {
        self.index.contains_key(&id)
    }

    pub fn edge(&self, from: NodeId, to: NodeId, key: EdgeKey) -> Option<&Edge> {
        self.edges.iter().find(|e| e.id() == (from, to, key))
    }

    /// All edges leaving `node`
    pub fn out_edges(&self, node: NodeId) -> impl Iterator<Item = &Edge> + '_ {
        self.edges.iter().filter(move |e| e.from == node)
    }

    /// Overwrites the capacity of every edge with the value returned by `capacity`.
    ///
    /// This is how a provider attaches capacities after loading the geometry, e.g. by drawing
    /// them uniformly from a configured range.
    pub fn assign_capacities<F>(&mut self, mut capacity: F)
    where
        F: FnMut(&Edge) -> Speed,
    {
        for edge in &mut self.edges {
            edge.capacity = capacity(edge);
        }
    }
}
