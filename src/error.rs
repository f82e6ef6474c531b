//! Error types for the waypoint updater

use crate::lifecycle::State;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WaypointError {
    #[error("global route contains no waypoints")]
    EmptyRoute,

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("failed to publish lane: {0}")]
    Publish(String),

    #[error("{0} has not been received yet")]
    NotReady(&'static str),

    #[error("{node}: cannot move from {from:?} to {to:?}")]
    InvalidTransition { node: String, from: State, to: State },
}

pub type Result<T> = std::result::Result<T, WaypointError>;
