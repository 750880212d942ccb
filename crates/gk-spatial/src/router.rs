//! Point-to-point distance.
//!
//! The lifecycle and routing engine ask a [`Router`] for the distance a
//! delivery has to cover.  Without a road graph that is the great-circle
//! distance; with one it is the shortest road path between the snapped
//! endpoints plus the straight legs onto and off the graph.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use gk_core::GeoPoint;

use crate::network::{EdgeId, NodeId, RoadNetwork};
use crate::{SpatialError, SpatialResult};

#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    pub distance_m: f64,
    /// Road edges in travel order; empty for great-circle routes.
    pub edges:      Vec<EdgeId>,
}

/// Must be `Send + Sync`: ETAs for a tick's dispatches may be computed on
/// several threads at once.
pub trait Router: Send + Sync {
    fn route(&self, from: GeoPoint, to: GeoPoint) -> SpatialResult<Route>;

    fn name(&self) -> &'static str;
}

// ── GreatCircleRouter ─────────────────────────────────────────────────────────

pub struct GreatCircleRouter;

impl Router for GreatCircleRouter {
    fn route(&self, from: GeoPoint, to: GeoPoint) -> SpatialResult<Route> {
        for p in [from, to] {
            if !p.is_valid() {
                return Err(SpatialError::InvalidCoordinate { lat: p.lat, lon: p.lon });
            }
        }
        Ok(Route { distance_m: from.distance_m(to), edges: Vec::new() })
    }

    fn name(&self) -> &'static str {
        "great-circle"
    }
}

// ── RoadRouter ────────────────────────────────────────────────────────────────

/// Dijkstra over edge length.  Costs are integer millimetres so that equal
/// paths compare equal on every platform; the heap's secondary key is the
/// node id, which fixes the tie-break.
pub struct RoadRouter {
    network: RoadNetwork,
}

impl RoadRouter {
    pub fn new(network: RoadNetwork) -> Self {
        Self { network }
    }

    pub fn network(&self) -> &RoadNetwork {
        &self.network
    }

    fn shortest_path(&self, from: NodeId, to: NodeId) -> SpatialResult<(u64, Vec<EdgeId>)> {
        if from == to {
            return Ok((0, Vec::new()));
        }
        let net = &self.network;
        let mut dist = vec![u64::MAX; net.node_count()];
        let mut prev = vec![EdgeId::NONE; net.node_count()];
        let mut heap: BinaryHeap<Reverse<(u64, NodeId)>> = BinaryHeap::new();
        dist[from.index()] = 0;
        heap.push(Reverse((0, from)));

        while let Some(Reverse((cost, node))) = heap.pop() {
            if node == to {
                let mut edges = Vec::new();
                let mut cur = to;
                while prev[cur.index()] != EdgeId::NONE {
                    let e = prev[cur.index()];
                    edges.push(e);
                    cur = net.edge_from[e.index()];
                }
                edges.reverse();
                return Ok((cost, edges));
            }
            if cost > dist[node.index()] {
                continue;
            }
            for edge in net.out_edges(node) {
                let next = net.edge_to[edge.index()];
                let step = (net.edge_length_m[edge.index()].max(0.0) * 1_000.0).round() as u64;
                let candidate = cost.saturating_add(step);
                if candidate < dist[next.index()] {
                    dist[next.index()] = candidate;
                    prev[next.index()] = edge;
                    heap.push(Reverse((candidate, next)));
                }
            }
        }
        Err(SpatialError::NoRoute { from, to })
    }
}

impl Router for RoadRouter {
    fn route(&self, from: GeoPoint, to: GeoPoint) -> SpatialResult<Route> {
        for p in [from, to] {
            if !p.is_valid() {
                return Err(SpatialError::InvalidCoordinate { lat: p.lat, lon: p.lon });
            }
        }
        let a = self.network.snap_to_node(from).ok_or(SpatialError::EmptyNetwork)?;
        let b = self.network.snap_to_node(to).ok_or(SpatialError::EmptyNetwork)?;
        if a == b {
            return Ok(Route { distance_m: from.distance_m(to), edges: Vec::new() });
        }
        let (mm, edges) = self.shortest_path(a, b)?;
        let access = from.distance_m(self.network.node_pos[a.index()])
            + to.distance_m(self.network.node_pos[b.index()]);
        Ok(Route { distance_m: mm as f64 / 1_000.0 + access, edges })
    }

    fn name(&self) -> &'static str {
        "road"
    }
}
