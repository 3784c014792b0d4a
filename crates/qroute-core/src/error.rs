//! Error types for qroute

use thiserror::Error;

use crate::types::NodeId;

/// Main error type for qroute
#[derive(Error, Debug)]
pub enum RouteError {
    /// Node or edge source produced no usable records
    #[error("Data format error: {0}")]
    DataFormat(String),

    /// A start, end, or origin id is not part of the loaded node set
    #[error("Unknown node: {0}")]
    UnknownNode(NodeId),

    #[error("No facility available: {0}")]
    NoFacilityAvailable(String),

    /// Parameter source absent or unreadable
    #[error("Configuration missing: {0}")]
    ConfigMissing(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Unexpected fault while learning or extracting a path
    #[error("Planning failure: {0}")]
    PlanningFailure(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RouteError {
    /// Stable tag for reporting the failure to collaborators
    pub fn kind(&self) -> &'static str {
        match self {
            RouteError::DataFormat(_) => "data_format",
            RouteError::UnknownNode(_) => "unknown_node",
            RouteError::NoFacilityAvailable(_) => "no_facility_available",
            RouteError::ConfigMissing(_) => "config_missing",
            RouteError::InvalidConfig(_) => "invalid_config",
            RouteError::PlanningFailure(_) => "planning_failure",
            RouteError::Io(_) => "io",
        }
    }
}

/// Result type alias for qroute operations
pub type Result<T> = std::result::Result<T, RouteError>;
