//! CLI command modules

pub mod config;
pub mod graph;
pub mod nearest;
pub mod plan;
