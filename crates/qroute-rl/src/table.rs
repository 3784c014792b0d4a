//! Action-value table (Q)

use std::collections::HashMap;

use qroute_core::{NodeId, RoadGraph};

/// Estimated value of moving from a state to one neighbor
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActionValue {
    pub action: NodeId,
    pub value: f64,
}

/// Sparse Q table: state -> (action -> value).
///
/// Entries exist for exactly the adjacencies of the graph it was built from.
/// Actions of a state keep the graph's neighbor enumeration order, so
/// maximum selection breaks ties the same way on every run.
#[derive(Debug, Clone, Default)]
pub struct ActionValueTable {
    entries: HashMap<NodeId, Vec<ActionValue>>,
}

impl ActionValueTable {
    /// Zero-initialised table for every adjacency of `graph`
    pub fn for_graph(graph: &RoadGraph) -> Self {
        let entries = graph
            .node_ids()
            .filter_map(|state| {
                let actions: Vec<_> = graph
                    .neighbors(state)
                    .into_iter()
                    .map(|(action, _)| ActionValue { action, value: 0.0 })
                    .collect();
                (!actions.is_empty()).then_some((state, actions))
            })
            .collect();
        Self { entries }
    }

    /// Available actions of `state`; empty for dead ends and unknown states
    pub fn actions(&self, state: NodeId) -> &[ActionValue] {
        self.entries.get(&state).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn value(&self, state: NodeId, action: NodeId) -> Option<f64> {
        self.actions(state)
            .iter()
            .find(|entry| entry.action == action)
            .map(|entry| entry.value)
    }

    /// Overwrite an existing entry; returns `false` if the pair is not an adjacency
    pub fn set(&mut self, state: NodeId, action: NodeId, value: f64) -> bool {
        match self
            .entries
            .get_mut(&state)
            .and_then(|actions| actions.iter_mut().find(|entry| entry.action == action))
        {
            Some(entry) => {
                entry.value = value;
                true
            }
            None => false,
        }
    }

    /// Highest-valued action, first one wins on ties
    pub fn best_action(&self, state: NodeId) -> Option<NodeId> {
        best_index(self.actions(state)).map(|i| self.actions(state)[i].action)
    }

    /// `max_b Q[state][b]`, or 0 when `state` has no actions
    pub fn max_value(&self, state: NodeId) -> f64 {
        best_index(self.actions(state)).map_or(0.0, |i| self.actions(state)[i].value)
    }

    /// Number of states with at least one action
    pub fn state_count(&self) -> usize {
        self.entries.len()
    }

    /// Number of (state, action) pairs
    pub fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn actions_mut(&mut self, state: NodeId) -> Option<&mut [ActionValue]> {
        self.entries.get_mut(&state).map(Vec::as_mut_slice)
    }
}

/// Index of the first maximum in enumeration order
pub(crate) fn best_index(actions: &[ActionValue]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (i, entry) in actions.iter().enumerate() {
        match best {
            Some(b) if actions[b].value >= entry.value => {}
            _ => best = Some(i),
        }
    }
    best
}
