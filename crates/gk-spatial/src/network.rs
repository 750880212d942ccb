//! Road graph for delivery distances.
//!
//! Outgoing edges are stored in CSR form: the edges leaving node `n` are
//! `node_out_start[n] .. node_out_start[n + 1]`, so Dijkstra's inner loop is
//! a contiguous scan.  An R-tree snaps arbitrary coordinates to the nearest
//! node.
//!
//! # Routing resource format
//!
//! ```text
//! <routing>/nodes.csv   node_id,lat,lon
//! <routing>/edges.csv   from,to,length_m,travel_secs
//! ```
//!
//! Edges are directed; list both directions for a two-way street.

use std::fmt;
use std::path::Path;

use rstar::{AABB, PointDistance, RTree, RTreeObject};
use rustc_hash::FxHashMap;
use serde::Deserialize;
use tracing::info;

use gk_core::GeoPoint;

use crate::{SpatialError, SpatialResult};

#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct NodeId(pub u32);

#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct EdgeId(pub u32);

impl NodeId {
    #[inline(always)]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl EdgeId {
    pub const NONE: EdgeId = EdgeId(u32::MAX);

    #[inline(always)]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

// ── R-tree entry ──────────────────────────────────────────────────────────────

#[derive(Clone)]
struct NodeEntry {
    point: [f64; 2],
    id:    NodeId,
}

impl RTreeObject for NodeEntry {
    type Envelope = AABB<[f64; 2]>;
    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.point)
    }
}

impl PointDistance for NodeEntry {
    /// Squared degrees; fine for picking the nearest node within a city.
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dlat = self.point[0] - point[0];
        let dlon = self.point[1] - point[1];
        dlat * dlat + dlon * dlon
    }
}

// ── RoadNetwork ───────────────────────────────────────────────────────────────

pub struct RoadNetwork {
    pub node_pos:       Vec<GeoPoint>,
    pub node_out_start: Vec<u32>,
    pub edge_from:      Vec<NodeId>,
    pub edge_to:        Vec<NodeId>,
    pub edge_length_m:  Vec<f64>,
    pub edge_travel_s:  Vec<f64>,
    spatial_idx:        RTree<NodeEntry>,
}

impl RoadNetwork {
    pub fn node_count(&self) -> usize {
        self.node_pos.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_to.len()
    }

    pub fn is_empty(&self) -> bool {
        self.node_pos.is_empty()
    }

    #[inline]
    pub fn out_edges(&self, node: NodeId) -> impl Iterator<Item = EdgeId> + '_ {
        let start = self.node_out_start[node.index()];
        let end = self.node_out_start[node.index() + 1];
        (start..end).map(EdgeId)
    }

    pub fn snap_to_node(&self, pos: GeoPoint) -> Option<NodeId> {
        self.spatial_idx.nearest_neighbor(&[pos.lat, pos.lon]).map(|e| e.id)
    }
}

// ── Builder ───────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct RoadNetworkBuilder {
    nodes: Vec<GeoPoint>,
    edges: Vec<RawEdge>,
}

struct RawEdge {
    from:     NodeId,
    to:       NodeId,
    length_m: f64,
    travel_s: f64,
}

impl RoadNetworkBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, pos: GeoPoint) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(pos);
        id
    }

    pub fn add_directed_edge(&mut self, from: NodeId, to: NodeId, length_m: f64, travel_s: f64) {
        self.edges.push(RawEdge { from, to, length_m, travel_s });
    }

    /// Both directions at once.
    pub fn add_road(&mut self, a: NodeId, b: NodeId, length_m: f64, travel_s: f64) {
        self.add_directed_edge(a, b, length_m, travel_s);
        self.add_directed_edge(b, a, length_m, travel_s);
    }

    pub fn build(self) -> RoadNetwork {
        let node_count = self.nodes.len();
        let mut raw = self.edges;
        // Stable: parallel edges keep input order, so routes are reproducible.
        raw.sort_by_key(|e| e.from);

        let mut node_out_start = vec![0u32; node_count + 1];
        for e in &raw {
            node_out_start[e.from.index() + 1] += 1;
        }
        for i in 1..=node_count {
            node_out_start[i] += node_out_start[i - 1];
        }

        let entries = self
            .nodes
            .iter()
            .enumerate()
            .map(|(i, p)| NodeEntry { point: [p.lat, p.lon], id: NodeId(i as u32) })
            .collect();

        RoadNetwork {
            node_out_start,
            edge_from: raw.iter().map(|e| e.from).collect(),
            edge_to: raw.iter().map(|e| e.to).collect(),
            edge_length_m: raw.iter().map(|e| e.length_m).collect(),
            edge_travel_s: raw.iter().map(|e| e.travel_s).collect(),
            spatial_idx: RTree::bulk_load(entries),
            node_pos: self.nodes,
        }
    }
}

// ── CSV loader ────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct NodeRecord {
    node_id: u64,
    lat:     f64,
    lon:     f64,
}

#[derive(Deserialize)]
struct EdgeRecord {
    from:        u64,
    to:          u64,
    length_m:    f64,
    travel_secs: f64,
}

/// Load `nodes.csv` + `edges.csv` from `dir`.  Returns `Ok(None)` when the
/// directory holds no node file, meaning "no road graph, use great-circle".
pub fn load_road_network(dir: &Path) -> SpatialResult<Option<RoadNetwork>> {
    let nodes_path = dir.join("nodes.csv");
    let edges_path = dir.join("edges.csv");
    if !nodes_path.is_file() {
        return Ok(None);
    }

    let mut builder = RoadNetworkBuilder::new();
    let mut ids: FxHashMap<u64, NodeId> = FxHashMap::default();

    let mut rdr = csv::Reader::from_path(&nodes_path).map_err(csv_error(&nodes_path))?;
    for row in rdr.deserialize::<NodeRecord>() {
        let rec = row.map_err(csv_error(&nodes_path))?;
        let pos = GeoPoint::checked(rec.lat, rec.lon)
            .map_err(|_| SpatialError::InvalidCoordinate { lat: rec.lat, lon: rec.lon })?;
        ids.insert(rec.node_id, builder.add_node(pos));
    }

    if edges_path.is_file() {
        let mut rdr = csv::Reader::from_path(&edges_path).map_err(csv_error(&edges_path))?;
        for row in rdr.deserialize::<EdgeRecord>() {
            let rec = row.map_err(csv_error(&edges_path))?;
            let from = *ids.get(&rec.from).ok_or(SpatialError::UnknownNode(rec.from))?;
            let to = *ids.get(&rec.to).ok_or(SpatialError::UnknownNode(rec.to))?;
            builder.add_directed_edge(from, to, rec.length_m, rec.travel_secs);
        }
    }

    let network = builder.build();
    info!(
        dir = %dir.display(),
        nodes = network.node_count(),
        edges = network.edge_count(),
        "loaded road network"
    );
    Ok(Some(network))
}

fn csv_error(path: &Path) -> impl Fn(csv::Error) -> SpatialError + '_ {
    move |source| SpatialError::Csv { path: path.to_path_buf(), source }
}
