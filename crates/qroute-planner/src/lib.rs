//! qroute Planner - Path planning service
//!
//! This crate ties the road graph, penalty overlay, Q-learner, and path
//! extractor together behind a single "compute path" operation, offers an
//! async handle that runs computations on a background worker, and loads the
//! planner configuration.

// Clippy pedantic allows - these are intentional design choices
#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod handle;
pub mod service;

pub use crate::config::{Config, DataConfig, LoggingConfig, PenaltyConfig, WeightModeKind};
pub use handle::{PlanEvent, PlannerHandle};
pub use service::{PlannedRoute, PlannerService};
