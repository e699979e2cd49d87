//! Small road networks for tests.

use crate::network::{Edge, Length, NodeId, RoadNetwork, Speed};

/// `0 -> 1 -> ... -> n` with the given segment lengths and a uniform capacity
pub fn line(lengths: &[Length], capacity: Speed) -> RoadNetwork {
    let edges = lengths
        .iter()
        .enumerate()
        .map(|(i, length)| Edge::new(i as NodeId, i as NodeId + 1, 0, *length, capacity))
        .collect();
    RoadNetwork::from_edges(edges).unwrap()
}

/// Two ways from 0 to 3: a short one through 1 and a long one through 2
pub fn diamond(short: Length, long: Length, capacity: Speed) -> RoadNetwork {
    RoadNetwork::from_edges(vec![
        Edge::new(0, 1, 0, short / 2.0, capacity),
        Edge::new(1, 3, 0, short / 2.0, capacity),
        Edge::new(0, 2, 0, long / 2.0, capacity),
        Edge::new(2, 3, 0, long / 2.0, capacity),
    ])
    .unwrap()
}

/// A `rows x cols` grid of two-way streets. Node `r * cols + c` sits in row r, column c.
pub fn grid<F>(rows: u64, cols: u64, length: Length, mut capacity: F) -> RoadNetwork
where
    F: FnMut(&Edge) -> Speed,
{
    let mut edges = Vec::new();
    for (r, c) in itertools::iproduct!(0..rows, 0..cols) {
        let n = r * cols + c;
        if c + 1 < cols {
            edges.push(Edge::new(n, n + 1, 0, length, 0.0));
            edges.push(Edge::new(n + 1, n, 0, length, 0.0));
        }
        if r + 1 < rows {
            edges.push(Edge::new(n, n + cols, 0, length, 0.0));
            edges.push(Edge::new(n + cols, n, 0, length, 0.0));
        }
    }

    let mut network = RoadNetwork::from_edges(edges).unwrap();
    network.assign_capacities(|e| capacity(e));
    network
}
