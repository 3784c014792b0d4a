//! qroute Core - Road graph, penalty overlay, and shared types
//!
//! This crate provides the foundational types used across all qroute components:
//! node identifiers and coordinates, the weighted undirected road graph loaded
//! from line-oriented node/edge files, and the penalty overlay that perturbs
//! edge costs inside a circular region and reverts them exactly.

// Clippy pedantic allows - these are intentional design choices
#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::float_cmp)]

pub mod error;
pub mod graph;
pub mod penalty;
pub mod types;

pub use error::{Result, RouteError};
pub use graph::{EdgeView, RoadGraph, WeightMode};
pub use penalty::{PenaltyArea, PenaltyOverlay};
pub use types::{Coordinate, Node, NodeId};
