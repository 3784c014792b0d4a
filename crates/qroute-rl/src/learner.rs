//! Episodic tabular Q-learning over a road graph
//!
//! Each episode starts at `start` and walks the graph with an ε-greedy
//! policy. The reward of a step is the negated edge weight, minus a fixed
//! penalty when the step revisits a node of the same episode. Entries are
//! updated with the temporal-difference rule
//!
//! ```text
//! Q[s][a] += α * (r + γ * max_b Q[a][b] - Q[s][a])
//! ```
//!
//! An episode ends at the goal, at a dead end, or after
//! `max_steps_per_episode` steps.

use std::collections::{HashMap, HashSet};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use qroute_core::{NodeId, RoadGraph};

use crate::config::LearningConfig;
use crate::table::{best_index, ActionValueTable};

/// Per-run counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LearningStats {
    pub episodes: usize,
    pub reached_goal: usize,
    pub dead_ends: usize,
    pub step_capped: usize,
    pub total_steps: usize,
}

/// Result of a learning run
#[derive(Debug, Clone)]
pub struct LearningOutcome {
    pub table: ActionValueTable,
    pub stats: LearningStats,
}

enum EpisodeEnd {
    Goal,
    DeadEnd,
    StepCap,
}

/// Tabular Q-learner
pub struct QLearner<R = StdRng> {
    config: LearningConfig,
    rng: R,
}

impl QLearner<StdRng> {
    /// Seeded from `config.seed`, or from OS entropy when unset
    pub fn new(config: LearningConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { config, rng }
    }
}

impl<R: Rng> QLearner<R> {
    pub fn with_rng(config: LearningConfig, rng: R) -> Self {
        Self { config, rng }
    }

    pub fn config(&self) -> &LearningConfig {
        &self.config
    }

    /// Learn an action-value table from `start` toward `goal`.
    ///
    /// `graph` is only read; a fresh table is allocated for every run.
    pub fn run(&mut self, graph: &RoadGraph, start: NodeId, goal: NodeId) -> LearningOutcome {
        let mut table = ActionValueTable::for_graph(graph);
        // Weights snapshot in the table's action order
        let adjacency: HashMap<NodeId, Vec<(NodeId, f64)>> = graph
            .node_ids()
            .map(|id| (id, graph.neighbors(id)))
            .collect();

        let mut stats = LearningStats::default();
        for _ in 0..self.config.episodes {
            let (end, steps) = self.episode(&adjacency, &mut table, start, goal);
            stats.episodes += 1;
            stats.total_steps += steps;
            match end {
                EpisodeEnd::Goal => stats.reached_goal += 1,
                EpisodeEnd::DeadEnd => stats.dead_ends += 1,
                EpisodeEnd::StepCap => stats.step_capped += 1,
            }
        }

        debug!(
            "Q-learning {} -> {}: {} episodes, {} reached goal, {} dead ends, {} capped, {} steps",
            start,
            goal,
            stats.episodes,
            stats.reached_goal,
            stats.dead_ends,
            stats.step_capped,
            stats.total_steps
        );

        LearningOutcome { table, stats }
    }

    fn episode(
        &mut self,
        adjacency: &HashMap<NodeId, Vec<(NodeId, f64)>>,
        table: &mut ActionValueTable,
        start: NodeId,
        goal: NodeId,
    ) -> (EpisodeEnd, usize) {
        let LearningConfig {
            alpha,
            gamma,
            revisit_penalty,
            max_steps_per_episode,
            ..
        } = self.config;

        let mut state = start;
        let mut visited = HashSet::new();
        let mut steps = 0;

        loop {
            if state == goal {
                return (EpisodeEnd::Goal, steps);
            }
            if steps >= max_steps_per_episode {
                return (EpisodeEnd::StepCap, steps);
            }
            visited.insert(state);

            let choices = match adjacency.get(&state) {
                Some(choices) if !choices.is_empty() => choices,
                _ => return (EpisodeEnd::DeadEnd, steps),
            };
            let index = self.select_action(table, state, choices.len());
            let (next, weight) = choices[index];

            let mut reward = -weight;
            if visited.contains(&next) {
                reward -= revisit_penalty;
            }

            let max_next = table.max_value(next);
            if let Some(entry) = table
                .actions_mut(state)
                .and_then(|actions| actions.get_mut(index))
            {
                entry.value += alpha * (reward + gamma * max_next - entry.value);
            }

            state = next;
            steps += 1;
        }
    }

    /// ε-greedy choice over the `count` actions of `state`
    fn select_action(&mut self, table: &ActionValueTable, state: NodeId, count: usize) -> usize {
        if self.rng.gen::<f64>() < self.config.epsilon {
            self.rng.gen_range(0..count)
        } else {
            best_index(table.actions(state)).unwrap_or(0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qroute_core::WeightMode;

    fn triangle() -> RoadGraph {
        RoadGraph::from_readers(
            "1 0 0\n2 1 0\n3 2 0\n".as_bytes(),
            "1 1 2 1\n2 2 3 1\n3 1 3 5\n".as_bytes(),
            WeightMode::Direct,
        )
        .unwrap()
    }

    fn config(episodes: usize) -> LearningConfig {
        LearningConfig::default().with_episodes(episodes).with_seed(42)
    }

    #[test]
    fn test_single_greedy_step_update() {
        // ε = 0, α = 0.5: first episode from 1 picks the first action
        let graph = triangle();
        let cfg = LearningConfig {
            alpha: 0.5,
            epsilon: 0.0,
            episodes: 1,
            ..config(1)
        };
        let mut learner = QLearner::new(cfg);
        let outcome = learner.run(&graph, NodeId(1), NodeId(3));

        let table = &outcome.table;
        let first = table.actions(NodeId(1))[0];
        let weight = graph.weight(NodeId(1), first.action).unwrap();
        assert_eq!(first.value, 0.5 * -weight);
        assert_eq!(outcome.stats.episodes, 1);
        assert_eq!(outcome.stats.reached_goal + outcome.stats.step_capped, 1);
    }

    #[test]
    fn test_revisit_penalty_applied() {
        // Path graph 1-2-3, goal 3. Edge 2-3 is loaded first so node 2
        // enumerates 1 before 3 and a greedy walk steps back from 2 to 1.
        let graph = RoadGraph::from_readers(
            "1 0 0\n2 1 0\n3 2 0\n".as_bytes(),
            "1 2 3 1\n2 1 2 1\n".as_bytes(),
            WeightMode::Direct,
        )
        .unwrap();
        let order: Vec<_> = graph.neighbors(NodeId(2)).into_iter().map(|(id, _)| id).collect();
        assert_eq!(order, vec![NodeId(1), NodeId(3)]);

        let cfg = LearningConfig {
            alpha: 1.0,
            gamma: 1.0,
            epsilon: 0.0,
            ..config(1)
        };
        let outcome = QLearner::new(cfg).run(&graph, NodeId(1), NodeId(3));

        // 1 -> 2 sets Q[1][2] = -1; 2 -> 1 revisits:
        // -1 (weight) - 10 (revisit) + 1.0 * max Q[1] (-1)
        assert_eq!(outcome.table.value(NodeId(2), NodeId(1)), Some(-12.0));
        // 1 -> 2 again is a revisit too: -1 - 10 + max Q[2] (0)
        assert_eq!(outcome.table.value(NodeId(1), NodeId(2)), Some(-11.0));
        // then 2 -> 3 reaches the goal
        assert_eq!(outcome.table.value(NodeId(2), NodeId(3)), Some(-1.0));
        assert_eq!(outcome.stats.reached_goal, 1);
        assert_eq!(outcome.stats.total_steps, 4);
    }

    #[test]
    fn test_start_equal_goal_leaves_table_at_zero() {
        let graph = triangle();
        let outcome = QLearner::new(config(50)).run(&graph, NodeId(2), NodeId(2));

        assert_eq!(outcome.stats.total_steps, 0);
        assert_eq!(outcome.stats.reached_goal, 50);
        for state in [NodeId(1), NodeId(2), NodeId(3)] {
            assert!(outcome.table.actions(state).iter().all(|a| a.value == 0.0));
        }
    }

    #[test]
    fn test_unknown_start_is_a_dead_end() {
        let graph = triangle();
        let outcome = QLearner::new(config(5)).run(&graph, NodeId(99), NodeId(3));
        assert_eq!(outcome.stats.dead_ends, 5);
        assert_eq!(outcome.stats.total_steps, 0);
    }

    #[test]
    fn test_step_cap_bounds_episodes() {
        // goal unreachable: 1-2 component, goal 3 isolated
        let graph = RoadGraph::from_readers(
            "1 0 0\n2 1 0\n3 5 5\n".as_bytes(),
            "1 1 2 1\n".as_bytes(),
            WeightMode::Direct,
        )
        .unwrap();
        let cfg = LearningConfig {
            max_steps_per_episode: 25,
            ..config(4)
        };
        let outcome = QLearner::new(cfg).run(&graph, NodeId(1), NodeId(3));

        assert_eq!(outcome.stats.step_capped, 4);
        assert_eq!(outcome.stats.total_steps, 100);
    }

    #[test]
    fn test_seeded_runs_are_reproducible() {
        let graph = triangle();
        let a = QLearner::new(config(300)).run(&graph, NodeId(1), NodeId(3));
        let b = QLearner::new(config(300)).run(&graph, NodeId(1), NodeId(3));

        assert_eq!(a.stats, b.stats);
        for state in [NodeId(1), NodeId(2), NodeId(3)] {
            assert_eq!(a.table.actions(state), b.table.actions(state));
        }
    }

    #[test]
    fn test_learning_prefers_cheaper_route() {
        let graph = triangle();
        let outcome = QLearner::new(config(2000)).run(&graph, NodeId(1), NodeId(3));
        let table = &outcome.table;

        let via_two = table.value(NodeId(1), NodeId(2)).unwrap();
        let direct = table.value(NodeId(1), NodeId(3)).unwrap();
        assert!(via_two > direct, "Q[1][2]={via_two} should beat Q[1][3]={direct}");
        assert_eq!(table.best_action(NodeId(2)), Some(NodeId(3)));
    }
}
