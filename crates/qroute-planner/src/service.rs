//! Synchronous planner core
//!
//! Owns one road graph and its transient penalty record. Every operation
//! either succeeds or returns a typed [`RouteError`].

use std::path::Path;

use serde::Serialize;
use tracing::{debug, info, warn};

use qroute_core::{
    Coordinate, NodeId, PenaltyArea, PenaltyOverlay, Result, RoadGraph, RouteError, WeightMode,
};
use qroute_rl::{LearningConfig, PathExtractor, QLearner, Termination};

use crate::config::Config;

/// Outcome of one path computation
#[derive(Debug, Clone, Serialize)]
pub struct PlannedRoute {
    pub start: NodeId,
    pub goal: NodeId,
    pub nodes: Vec<NodeId>,
    pub coordinates: Vec<Coordinate>,
    /// Sum of current edge weights along `nodes`
    pub total_cost: f64,
    pub termination: Termination,
}

impl PlannedRoute {
    pub fn is_complete(&self) -> bool {
        self.termination == Termination::ReachedGoal
    }
}

pub struct PlannerService {
    graph: RoadGraph,
    penalties: PenaltyOverlay,
    learning: LearningConfig,
}

impl PlannerService {
    pub fn new(graph: RoadGraph, learning: LearningConfig) -> Result<Self> {
        learning.validate()?;
        info!(
            "Planner ready: {} nodes, {} edges, alpha={}, gamma={}, epsilon={}, episodes={}",
            graph.node_count(),
            graph.edge_count(),
            learning.alpha,
            learning.gamma,
            learning.epsilon,
            learning.episodes
        );
        Ok(Self {
            graph,
            penalties: PenaltyOverlay::new(),
            learning,
        })
    }

    /// Build the graph from the node and edge files
    pub fn initialize(
        nodes: &Path,
        edges: &Path,
        mode: WeightMode,
        learning: LearningConfig,
    ) -> Result<Self> {
        let graph = RoadGraph::from_files(nodes, edges, mode)?;
        Self::new(graph, learning)
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::initialize(
            &config.data.nodes,
            &config.data.edges,
            config.data.weight_mode(),
            config.learning.clone(),
        )
    }

    /// Learn from `start` toward `end` and read out the greedy route.
    ///
    /// A cyclic or dead-end readout is returned as a partial route.
    pub fn compute_route(&self, start: NodeId, end: NodeId) -> Result<PlannedRoute> {
        for id in [start, end] {
            if !self.graph.contains(id) {
                return Err(RouteError::UnknownNode(id));
            }
        }

        let outcome = QLearner::new(self.learning.clone()).run(&self.graph, start, end);
        debug!(
            "Learned {} action values over {} states",
            outcome.table.len(),
            outcome.table.state_count()
        );
        let path = PathExtractor::extract(&outcome.table, start, end);

        let coordinates = path
            .nodes
            .iter()
            .map(|&id| {
                self.graph.coordinate(id).ok_or_else(|| {
                    RouteError::PlanningFailure(format!("path node {id} has no coordinate"))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        let total_cost = self.graph.path_cost(&path.nodes).ok_or_else(|| {
            RouteError::PlanningFailure("extracted path follows a missing edge".to_string())
        })?;

        let route = PlannedRoute {
            start,
            goal: end,
            nodes: path.nodes,
            coordinates,
            total_cost,
            termination: path.termination,
        };

        if route.is_complete() {
            info!(
                "Path {} -> {}: {} nodes, total length {:.2}",
                start,
                end,
                route.nodes.len(),
                route.total_cost
            );
        } else {
            warn!(
                "Partial path {} -> {}: {:?} after {} nodes",
                start,
                end,
                route.termination,
                route.nodes.len()
            );
        }
        Ok(route)
    }

    /// Coordinates of the computed route, start first
    pub fn compute_path(&self, start: NodeId, end: NodeId) -> Result<Vec<Coordinate>> {
        self.compute_route(start, end).map(|route| route.coordinates)
    }

    /// Returns the number of edges the area touched
    pub fn apply_penalty_area(&mut self, area: &PenaltyArea) -> Result<usize> {
        self.penalties.apply(&mut self.graph, area)
    }

    /// Returns the number of edges restored
    pub fn reset_penalty(&mut self) -> usize {
        self.penalties.reset(&mut self.graph)
    }

    pub fn penalties_active(&self) -> bool {
        self.penalties.is_active()
    }

    /// Closest facility to `from` by straight-line distance.
    ///
    /// Facilities without a coordinate are skipped; the origin itself is a
    /// valid answer when it is listed.
    pub fn find_nearest_facility(&self, from: NodeId, facilities: &[NodeId]) -> Result<NodeId> {
        let origin = self
            .graph
            .coordinate(from)
            .ok_or(RouteError::UnknownNode(from))?;

        let mut nearest: Option<(NodeId, f64)> = None;
        for &facility in facilities {
            let Some(coordinate) = self.graph.coordinate(facility) else {
                debug!("Skipping facility {} with no coordinate", facility);
                continue;
            };
            let distance = origin.distance_squared(&coordinate);
            if nearest.map_or(true, |(_, best)| distance < best) {
                nearest = Some((facility, distance));
            }
        }

        nearest.map(|(id, _)| id).ok_or_else(|| {
            RouteError::NoFacilityAvailable(format!(
                "none of {} candidate facilities has a coordinate",
                facilities.len()
            ))
        })
    }

    pub fn graph(&self) -> &RoadGraph {
        &self.graph
    }

    pub fn node_coordinate(&self, id: NodeId) -> Option<Coordinate> {
        self.graph.coordinate(id)
    }

    pub fn learning_config(&self) -> &LearningConfig {
        &self.learning
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 1 - 2 - 3 chain plus a long 1 - 3 shortcut and an isolated 9
    fn service() -> PlannerService {
        let graph = RoadGraph::from_readers(
            "1 0 0\n2 1 0\n3 2 0\n9 7 7\n".as_bytes(),
            "1 1 2 1\n2 2 3 1\n3 1 3 5\n".as_bytes(),
            WeightMode::Direct,
        )
        .unwrap();
        let learning = LearningConfig::default().with_episodes(1000).with_seed(5);
        PlannerService::new(graph, learning).unwrap()
    }

    #[test]
    fn test_new_rejects_invalid_learning_config() {
        let graph = service().graph().clone();
        let learning = LearningConfig {
            alpha: 0.0,
            ..LearningConfig::default()
        };
        assert!(matches!(
            PlannerService::new(graph, learning),
            Err(RouteError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_unknown_endpoints() {
        let planner = service();
        assert!(matches!(
            planner.compute_path(NodeId(42), NodeId(1)),
            Err(RouteError::UnknownNode(NodeId(42)))
        ));
        assert!(matches!(
            planner.compute_path(NodeId(1), NodeId(43)),
            Err(RouteError::UnknownNode(NodeId(43)))
        ));
    }

    #[test]
    fn test_start_equals_goal() {
        let planner = service();
        let route = planner.compute_route(NodeId(2), NodeId(2)).unwrap();
        assert_eq!(route.nodes, vec![NodeId(2)]);
        assert_eq!(route.coordinates, vec![Coordinate::new(1.0, 0.0)]);
        assert_eq!(route.total_cost, 0.0);
        assert!(route.is_complete());
    }

    #[test]
    fn test_compute_route_maps_coordinates() {
        let planner = service();
        let route = planner.compute_route(NodeId(1), NodeId(3)).unwrap();

        assert_eq!(route.nodes, vec![NodeId(1), NodeId(2), NodeId(3)]);
        assert_eq!(
            route.coordinates,
            vec![
                Coordinate::new(0.0, 0.0),
                Coordinate::new(1.0, 0.0),
                Coordinate::new(2.0, 0.0)
            ]
        );
        assert_eq!(route.total_cost, 2.0);
    }

    #[test]
    fn test_isolated_goal_yields_partial_route() {
        let planner = service();
        let route = planner.compute_route(NodeId(1), NodeId(9)).unwrap();
        assert!(!route.is_complete());
        assert_eq!(route.nodes[0], NodeId(1));
        assert!(!route.nodes.contains(&NodeId(9)));
    }

    #[test]
    fn test_penalty_pass_through() {
        let mut planner = service();
        let area = PenaltyArea::obstacle(Coordinate::new(0.5, 0.0), 0.1);

        assert_eq!(planner.apply_penalty_area(&area).unwrap(), 1);
        assert!(planner.penalties_active());
        assert_eq!(planner.graph().weight(NodeId(1), NodeId(2)), Some(1000.0));

        assert_eq!(planner.reset_penalty(), 1);
        assert!(!planner.penalties_active());
        assert_eq!(planner.graph().weight(NodeId(2), NodeId(1)), Some(1.0));
    }

    #[test]
    fn test_penalised_sole_path_reports_penalised_cost() {
        let graph = RoadGraph::from_readers(
            "1 0 0\n2 1 0\n".as_bytes(),
            "1 1 2 1\n".as_bytes(),
            WeightMode::Direct,
        )
        .unwrap();
        let mut planner =
            PlannerService::new(graph, LearningConfig::default().with_episodes(50).with_seed(3))
                .unwrap();
        let area = PenaltyArea::obstacle(Coordinate::new(0.5, 0.0), 0.1);
        planner.apply_penalty_area(&area).unwrap();

        let route = planner.compute_route(NodeId(1), NodeId(2)).unwrap();
        assert_eq!(route.nodes, vec![NodeId(1), NodeId(2)]);
        assert!(route.is_complete());
        assert_eq!(route.total_cost, 1000.0);

        planner.reset_penalty();
        let route = planner.compute_route(NodeId(1), NodeId(2)).unwrap();
        assert_eq!(route.total_cost, 1.0);
    }

    #[test]
    fn test_route_json_shape() {
        let planner = service();
        let route = planner.compute_route(NodeId(2), NodeId(2)).unwrap();
        let json = serde_json::to_value(&route).unwrap();

        assert_eq!(json["start"], 2);
        assert_eq!(json["goal"], 2);
        assert_eq!(json["nodes"], serde_json::json!([2]));
        assert_eq!(json["coordinates"], serde_json::json!([{ "x": 1.0, "y": 0.0 }]));
        assert_eq!(json["total_cost"], 0.0);
        assert_eq!(json["termination"], serde_json::json!({ "kind": "reached_goal" }));

        let partial = PlannedRoute {
            termination: Termination::CycleDetected { at: NodeId(1) },
            ..route
        };
        assert_eq!(
            serde_json::to_value(&partial).unwrap()["termination"],
            serde_json::json!({ "kind": "cycle_detected", "at": 1 })
        );
    }

    #[test]
    fn test_nearest_facility() {
        let planner = service();
        let nearest = planner
            .find_nearest_facility(NodeId(1), &[NodeId(3), NodeId(2), NodeId(9)])
            .unwrap();
        assert_eq!(nearest, NodeId(2));

        // origin listed as a facility is its own nearest
        let nearest = planner
            .find_nearest_facility(NodeId(3), &[NodeId(1), NodeId(3)])
            .unwrap();
        assert_eq!(nearest, NodeId(3));
    }

    #[test]
    fn test_nearest_facility_failures() {
        let planner = service();
        assert!(matches!(
            planner.find_nearest_facility(NodeId(77), &[NodeId(1)]),
            Err(RouteError::UnknownNode(NodeId(77)))
        ));
        assert!(matches!(
            planner.find_nearest_facility(NodeId(1), &[NodeId(50), NodeId(51)]),
            Err(RouteError::NoFacilityAvailable(_))
        ));
        assert!(matches!(
            planner.find_nearest_facility(NodeId(1), &[]),
            Err(RouteError::NoFacilityAvailable(_))
        ));
    }
}
