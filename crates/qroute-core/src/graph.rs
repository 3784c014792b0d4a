//! Road graph storage and loading
//!
//! Nodes and edges are read from whitespace-separated, line-oriented sources:
//!
//! - nodes: `id x y`
//! - edges: `edge_id start end value`
//!
//! `value` is either the edge length itself ([`WeightMode::Direct`]) or an
//! additive correction on top of the calibrated straight-line distance
//! between the endpoints ([`WeightMode::Derived`]). Malformed records are
//! skipped with a warning; they never abort a load.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use petgraph::graph::{EdgeIndex, NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{Result, RouteError};
use crate::types::{Coordinate, Node, NodeId};

/// How the fourth field of an edge record becomes an edge weight
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum WeightMode {
    /// `weight = value`
    Direct,
    /// `weight = distance(u, v) * calibration + value`
    Derived { calibration: f64 },
}

impl WeightMode {
    /// Metres per degree of arc on a sphere of mean Earth radius.
    ///
    /// Converts latitude/longitude distances into metres.
    pub const DEFAULT_CALIBRATION: f64 = 111_195.0;

    pub fn derived() -> Self {
        WeightMode::Derived {
            calibration: Self::DEFAULT_CALIBRATION,
        }
    }

    fn weight(self, from: &Coordinate, to: &Coordinate, value: f64) -> f64 {
        match self {
            WeightMode::Direct => value,
            WeightMode::Derived { calibration } => from.distance(to) * calibration + value,
        }
    }
}

impl Default for WeightMode {
    fn default() -> Self {
        WeightMode::Direct
    }
}

/// Borrowed view of one undirected edge
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeView {
    pub from: NodeId,
    pub to: NodeId,
    pub weight: f64,
}

/// Weighted undirected road network.
///
/// # Invariants
///
/// - Every undirected edge is stored once, so `weight(u, v) == weight(v, u)`
///   holds by construction
/// - No self-loops
/// - Every weight is strictly positive and finite
#[derive(Debug, Clone, Default)]
pub struct RoadGraph {
    graph: UnGraph<Node, f64>,
    index_by_id: HashMap<NodeId, NodeIndex>,
}

impl RoadGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a graph from node and edge files.
    pub fn from_files(
        nodes: impl AsRef<Path>,
        edges: impl AsRef<Path>,
        mode: WeightMode,
    ) -> Result<Self> {
        let nodes = nodes.as_ref();
        let edges = edges.as_ref();
        info!("Loading road graph from {:?} and {:?}", nodes, edges);

        let node_file = File::open(nodes).map_err(|e| {
            RouteError::DataFormat(format!("cannot open node source {}: {e}", nodes.display()))
        })?;
        let edge_file = File::open(edges).map_err(|e| {
            RouteError::DataFormat(format!("cannot open edge source {}: {e}", edges.display()))
        })?;

        Self::from_readers(BufReader::new(node_file), BufReader::new(edge_file), mode)
    }

    /// Load a graph from any line-oriented sources.
    ///
    /// Fails with [`RouteError::DataFormat`] when no node or no edge survives
    /// parsing.
    pub fn from_readers<N: BufRead, E: BufRead>(
        nodes: N,
        edges: E,
        mode: WeightMode,
    ) -> Result<Self> {
        let mut graph = Self::new();

        for (line_no, bytes) in nodes.split(b'\n').enumerate() {
            let Some(line) = decode_line(bytes?, "node", line_no) else {
                continue;
            };
            let Some(fields) = record_fields(&line) else {
                continue;
            };
            match parse_node(&fields) {
                Some((id, coordinate)) => graph.add_node(id, coordinate),
                None => warn!("Skipping invalid node line {}: {:?}", line_no + 1, line),
            }
        }
        if graph.node_count() == 0 {
            return Err(RouteError::DataFormat(
                "node source contains no valid records".to_string(),
            ));
        }

        for (line_no, bytes) in edges.split(b'\n').enumerate() {
            let Some(line) = decode_line(bytes?, "edge", line_no) else {
                continue;
            };
            let Some(fields) = record_fields(&line) else {
                continue;
            };
            let Some((edge_id, from, to, value)) = parse_edge(&fields) else {
                warn!("Skipping invalid edge line {}: {:?}", line_no + 1, line);
                continue;
            };
            let (Some(a), Some(b)) = (graph.coordinate(from), graph.coordinate(to)) else {
                warn!(
                    "Skipping edge {} on line {}: references undefined node ({} or {})",
                    edge_id,
                    line_no + 1,
                    from,
                    to
                );
                continue;
            };
            let weight = mode.weight(&a, &b, value);
            if let Err(e) = graph.add_edge(from, to, weight) {
                warn!("Skipping edge {} on line {}: {}", edge_id, line_no + 1, e);
            }
        }
        if graph.edge_count() == 0 {
            return Err(RouteError::DataFormat(
                "edge source contains no valid records".to_string(),
            ));
        }

        info!(
            "Road graph loaded: {} nodes, {} edges",
            graph.node_count(),
            graph.edge_count()
        );
        Ok(graph)
    }

    /// Insert a node; a repeated id replaces the earlier coordinate.
    pub fn add_node(&mut self, id: NodeId, coordinate: Coordinate) {
        let node = Node { id, coordinate };
        if let Some(&index) = self.index_by_id.get(&id) {
            warn!("Node {} defined more than once, keeping the last definition", id);
            self.graph[index] = node;
        } else {
            let index = self.graph.add_node(node);
            self.index_by_id.insert(id, index);
        }
    }

    /// Insert or replace the undirected edge `from`-`to`.
    pub fn add_edge(&mut self, from: NodeId, to: NodeId, weight: f64) -> Result<()> {
        if from == to {
            return Err(RouteError::DataFormat(format!("self-loop on node {from}")));
        }
        check_weight(weight)?;
        let a = self.index(from)?;
        let b = self.index(to)?;
        if self.graph.find_edge(a, b).is_some() {
            debug!("Edge {}-{} redefined, keeping the last weight", from, to);
        }
        self.graph.update_edge(a, b, weight);
        Ok(())
    }

    /// Overwrite the weight of an existing edge (both directions).
    pub fn set_weight(&mut self, from: NodeId, to: NodeId, weight: f64) -> Result<()> {
        check_weight(weight)?;
        let edge = self.edge_index(from, to).ok_or_else(|| {
            RouteError::DataFormat(format!("no edge between {from} and {to}"))
        })?;
        self.graph[edge] = weight;
        Ok(())
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.index_by_id.contains_key(&id)
    }

    pub fn coordinate(&self, id: NodeId) -> Option<Coordinate> {
        self.index_by_id
            .get(&id)
            .map(|&index| self.graph[index].coordinate)
    }

    pub fn weight(&self, from: NodeId, to: NodeId) -> Option<f64> {
        self.edge_index(from, to).map(|edge| self.graph[edge])
    }

    /// Neighbors of `id` with the current edge weight.
    ///
    /// The enumeration order is fixed for a given graph, which makes
    /// tie-breaking downstream deterministic.
    pub fn neighbors(&self, id: NodeId) -> Vec<(NodeId, f64)> {
        let Some(&index) = self.index_by_id.get(&id) else {
            return Vec::new();
        };
        self.graph
            .edges(index)
            .map(|edge| (self.graph[edge.target()].id, *edge.weight()))
            .collect()
    }

    /// Node ids in load order
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.graph.node_weights().map(|node| node.id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> + '_ {
        self.graph.node_weights()
    }

    pub fn edges(&self) -> impl Iterator<Item = EdgeView> + '_ {
        self.graph.edge_references().map(|edge| EdgeView {
            from: self.graph[edge.source()].id,
            to: self.graph[edge.target()].id,
            weight: *edge.weight(),
        })
    }

    /// Sum of the current weights along consecutive nodes of `path`.
    ///
    /// Returns `None` if two consecutive nodes are not adjacent.
    pub fn path_cost(&self, path: &[NodeId]) -> Option<f64> {
        path.windows(2)
            .map(|pair| self.weight(pair[0], pair[1]))
            .sum()
    }

    fn index(&self, id: NodeId) -> Result<NodeIndex> {
        self.index_by_id
            .get(&id)
            .copied()
            .ok_or(RouteError::UnknownNode(id))
    }

    fn edge_index(&self, from: NodeId, to: NodeId) -> Option<EdgeIndex> {
        let a = *self.index_by_id.get(&from)?;
        let b = *self.index_by_id.get(&to)?;
        self.graph.find_edge(a, b)
    }
}

fn check_weight(weight: f64) -> Result<()> {
    if weight.is_finite() && weight > 0.0 {
        Ok(())
    } else {
        Err(RouteError::DataFormat(format!(
            "edge weight must be positive and finite, got {weight}"
        )))
    }
}

/// Split a record into fields; blank lines and `#` comments yield `None`.
/// Non-UTF-8 records are malformed lines, not read failures
fn decode_line(bytes: Vec<u8>, source: &str, line_no: usize) -> Option<String> {
    match String::from_utf8(bytes) {
        Ok(line) => Some(line),
        Err(_) => {
            warn!("Skipping {} line {}: not valid UTF-8", source, line_no + 1);
            None
        }
    }
}

fn record_fields(line: &str) -> Option<Vec<&str>> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return None;
    }
    Some(trimmed.split_whitespace().collect())
}

fn parse_node(fields: &[&str]) -> Option<(NodeId, Coordinate)> {
    let [id, x, y] = fields else {
        return None;
    };
    let coordinate = Coordinate::new(x.parse().ok()?, y.parse().ok()?);
    if !coordinate.is_finite() {
        return None;
    }
    Some((id.parse().ok()?, coordinate))
}

fn parse_edge(fields: &[&str]) -> Option<(i64, NodeId, NodeId, f64)> {
    let [edge_id, from, to, value] = fields else {
        return None;
    };
    Some((
        edge_id.parse().ok()?,
        from.parse().ok()?,
        to.parse().ok()?,
        value.parse().ok()?,
    ))
}
