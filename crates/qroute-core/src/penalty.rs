//! Penalty overlay - transient cost multipliers inside a circular region
//!
//! Obstacles and weather are modelled by multiplying the weight of every edge
//! whose midpoint lies inside a circle. The pre-penalty weight of each touched
//! edge is recorded once per session so that [`PenaltyOverlay::reset`] can
//! restore it exactly, whatever combination of areas was applied.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{Result, RouteError};
use crate::graph::RoadGraph;
use crate::types::{Coordinate, NodeId};

/// A circular region whose covered edges receive a cost multiplier
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PenaltyArea {
    pub center: Coordinate,
    pub radius: f64,
    pub factor: f64,
}

impl PenaltyArea {
    /// Near-impassable obstacle
    pub const OBSTACLE_FACTOR: f64 = 1000.0;
    /// Degraded but passable conditions
    pub const WEATHER_FACTOR: f64 = 20.0;

    pub fn new(center: Coordinate, radius: f64, factor: f64) -> Self {
        Self {
            center,
            radius,
            factor,
        }
    }

    pub fn obstacle(center: Coordinate, radius: f64) -> Self {
        Self::new(center, radius, Self::OBSTACLE_FACTOR)
    }

    pub fn weather(center: Coordinate, radius: f64) -> Self {
        Self::new(center, radius, Self::WEATHER_FACTOR)
    }

    /// Inclusive boundary, compared on squared distances
    pub fn covers(&self, point: &Coordinate) -> bool {
        self.center.distance_squared(point) <= self.radius * self.radius
    }

    fn validate(&self) -> Result<()> {
        if !self.center.is_finite() {
            return Err(RouteError::InvalidConfig(
                "penalty center must be finite".to_string(),
            ));
        }
        if !self.radius.is_finite() || self.radius < 0.0 {
            return Err(RouteError::InvalidConfig(format!(
                "penalty radius must be finite and non-negative, got {}",
                self.radius
            )));
        }
        if !self.factor.is_finite() || self.factor <= 0.0 {
            return Err(RouteError::InvalidConfig(format!(
                "penalty factor must be finite and positive, got {}",
                self.factor
            )));
        }
        Ok(())
    }
}

/// Undirected edge key, endpoints in ascending order
type EdgeKey = (NodeId, NodeId);

fn edge_key(a: NodeId, b: NodeId) -> EdgeKey {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Tracks original weights of penalised edges for exact rollback
#[derive(Debug, Clone, Default)]
pub struct PenaltyOverlay {
    originals: BTreeMap<EdgeKey, f64>,
}

impl PenaltyOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Multiply the weight of every edge whose midpoint falls inside `area`.
    ///
    /// Overlapping areas compose multiplicatively. Returns the number of
    /// edges penalised by this call.
    pub fn apply(&mut self, graph: &mut RoadGraph, area: &PenaltyArea) -> Result<usize> {
        area.validate()?;

        let view: &RoadGraph = graph;
        let covered: Vec<_> = view
            .edges()
            .filter(|edge| match (view.coordinate(edge.from), view.coordinate(edge.to)) {
                (Some(a), Some(b)) => area.covers(&a.midpoint(&b)),
                _ => false,
            })
            .collect();

        for edge in &covered {
            self.originals
                .entry(edge_key(edge.from, edge.to))
                .or_insert(edge.weight);
            let penalised = (edge.weight * area.factor).clamp(f64::MIN_POSITIVE, f64::MAX);
            graph.set_weight(edge.from, edge.to, penalised)?;
            debug!(
                "Penalised edge {}-{}: {} -> {}",
                edge.from, edge.to, edge.weight, penalised
            );
        }

        info!(
            "Applied penalty x{} at ({}, {}) r={}: {} edges affected",
            area.factor,
            area.center.x,
            area.center.y,
            area.radius,
            covered.len()
        );
        Ok(covered.len())
    }

    /// Restore every recorded edge to its pre-penalty weight and clear the
    /// session. Returns the number of edges restored.
    pub fn reset(&mut self, graph: &mut RoadGraph) -> usize {
        if self.originals.is_empty() {
            return 0;
        }

        let mut restored = 0;
        for ((from, to), original) in std::mem::take(&mut self.originals) {
            match graph.set_weight(from, to, original) {
                Ok(()) => restored += 1,
                Err(e) => warn!("Failed to restore edge {}-{}: {}", from, to, e),
            }
        }

        info!("Penalties reset: {} edges restored", restored);
        restored
    }

    pub fn is_active(&self) -> bool {
        !self.originals.is_empty()
    }

    /// Edges currently penalised, with their recorded original weight
    pub fn penalised_edges(&self) -> impl Iterator<Item = (NodeId, NodeId, f64)> + '_ {
        self.originals
            .iter()
            .map(|(&(from, to), &original)| (from, to, original))
    }
}
