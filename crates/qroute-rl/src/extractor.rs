//! Greedy path readout from a learned action-value table

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::warn;

use qroute_core::NodeId;

use crate::table::ActionValueTable;

/// Why extraction stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum Termination {
    ReachedGoal,
    /// The greedy choice pointed back to an already visited node
    CycleDetected { at: NodeId },
    /// The current node had no actions in the table
    DeadEnd { at: NodeId },
}

/// Ordered node sequence from start toward goal, start included
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Path {
    pub nodes: Vec<NodeId>,
    pub termination: Termination,
}

impl Path {
    pub fn is_complete(&self) -> bool {
        self.termination == Termination::ReachedGoal
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Never true: a path always holds at least its start node
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

pub struct PathExtractor;

impl PathExtractor {
    /// Follow the highest-valued action from `start` until `goal`.
    ///
    /// Stops early, returning the partial path, when the greedy choice would
    /// revisit a node or when the current node has no actions. Partial paths
    /// are a legitimate outcome of an approximate learner, not an error.
    pub fn extract(table: &ActionValueTable, start: NodeId, goal: NodeId) -> Path {
        let mut nodes = vec![start];
        let mut visited = HashSet::new();
        let mut state = start;

        while state != goal {
            visited.insert(state);

            let Some(action) = table.best_action(state) else {
                warn!("Path extraction stopped at node {}: no available actions", state);
                return Path {
                    nodes,
                    termination: Termination::DeadEnd { at: state },
                };
            };
            if visited.contains(&action) {
                warn!("Cycle detected during path extraction, stopped at {}", action);
                return Path {
                    nodes,
                    termination: Termination::CycleDetected { at: action },
                };
            }

            nodes.push(action);
            state = action;
        }

        Path {
            nodes,
            termination: Termination::ReachedGoal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qroute_core::{RoadGraph, WeightMode};

    /// Square 1-2-3-4-1 plus a dangling 5 attached to 4
    fn square() -> (RoadGraph, ActionValueTable) {
        let graph = RoadGraph::from_readers(
            "1 0 0\n2 1 0\n3 1 1\n4 0 1\n5 -1 1\n".as_bytes(),
            "1 1 2 1\n2 2 3 1\n3 3 4 1\n4 4 1 1\n5 4 5 1\n".as_bytes(),
            WeightMode::Direct,
        )
        .unwrap();
        let table = ActionValueTable::for_graph(&graph);
        (graph, table)
    }

    #[test]
    fn test_start_equals_goal() {
        let (_, table) = square();
        let path = PathExtractor::extract(&table, NodeId(3), NodeId(3));
        assert_eq!(path.nodes, vec![NodeId(3)]);
        assert!(path.is_complete());
    }

    #[test]
    fn test_follows_best_actions_to_goal() {
        let (_, mut table) = square();
        table.set(NodeId(1), NodeId(2), -1.0);
        table.set(NodeId(1), NodeId(4), -3.0);
        table.set(NodeId(2), NodeId(3), -1.0);
        table.set(NodeId(2), NodeId(1), -9.0);

        let path = PathExtractor::extract(&table, NodeId(1), NodeId(3));
        assert_eq!(path.nodes, vec![NodeId(1), NodeId(2), NodeId(3)]);
        assert_eq!(path.termination, Termination::ReachedGoal);
    }

    #[test]
    fn test_cycle_stops_extraction() {
        let (_, mut table) = square();
        // 1 -> 2 -> 1 is preferred everywhere
        table.set(NodeId(1), NodeId(2), 5.0);
        table.set(NodeId(2), NodeId(1), 5.0);

        let path = PathExtractor::extract(&table, NodeId(1), NodeId(5));
        assert_eq!(path.nodes, vec![NodeId(1), NodeId(2)]);
        assert_eq!(path.termination, Termination::CycleDetected { at: NodeId(1) });
        assert!(!path.is_complete());
    }

    #[test]
    fn test_unknown_start_is_dead_end() {
        let (_, table) = square();
        let path = PathExtractor::extract(&table, NodeId(42), NodeId(1));
        assert_eq!(path.nodes, vec![NodeId(42)]);
        assert_eq!(path.termination, Termination::DeadEnd { at: NodeId(42) });
    }

    #[test]
    fn test_extracted_path_has_no_duplicates() {
        let (graph, mut table) = square();
        // every state prefers its last action
        for state in graph.node_ids() {
            let actions: Vec<_> = table.actions(state).iter().map(|a| a.action).collect();
            for (i, action) in actions.iter().enumerate() {
                table.set(state, *action, i as f64);
            }
        }
        for start in graph.node_ids() {
            for goal in graph.node_ids() {
                let path = PathExtractor::extract(&table, start, goal);
                let unique: HashSet<_> = path.nodes.iter().collect();
                assert_eq!(unique.len(), path.nodes.len());
                assert_eq!(path.nodes[0], start);
            }
        }
    }
}
