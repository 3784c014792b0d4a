//! qroute RL - Reinforcement learning for road path planning
//!
//! This crate provides the tabular Q-learning procedure that learns an
//! action-value function over a [`RoadGraph`](qroute_core::RoadGraph) toward a
//! fixed goal, and the greedy readout that turns the learned table into a path.

// Clippy pedantic allows - these are intentional design choices
#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::float_cmp)]

pub mod config;
pub mod extractor;
pub mod learner;
pub mod table;

pub use config::LearningConfig;
pub use extractor::{Path, PathExtractor, Termination};
pub use learner::{LearningOutcome, LearningStats, QLearner};
pub use table::{ActionValue, ActionValueTable};
