//! Lifecycle management for waypoint updater components

use crate::error::{Result, WaypointError};
use log::debug;

/// Components that are configured, activated and torn down in order
pub trait LifecycleNode: Send {
    /// Apply parameters and reset internal state
    fn on_configure(&mut self) -> Result<()>;

    /// Start producing output
    fn on_activate(&mut self) -> Result<()>;

    /// Stop producing output, keeping configuration
    fn on_deactivate(&mut self) -> Result<()>;

    /// Drop configuration and per-run state
    fn on_cleanup(&mut self) -> Result<()>;

    /// Final transition; the node cannot be configured again afterwards
    fn on_shutdown(&mut self) -> Result<()>;
}

/// State of a lifecycle node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Unconfigured,
    Inactive,
    Active,
    Finalized,
}

/// Named state holder shared by lifecycle node implementations
#[derive(Debug)]
pub struct LifecycleNodeBase {
    pub name: String,
    state: State,
}

impl LifecycleNodeBase {
    pub fn new(name: &str) -> Self {
        LifecycleNodeBase {
            name: name.to_string(),
            state: State::Unconfigured,
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    /// Move to `next` if the current state is one of `allowed_from`
    pub fn transition(&mut self, allowed_from: &[State], next: State) -> Result<()> {
        if !allowed_from.contains(&self.state) {
            return Err(WaypointError::InvalidTransition {
                node: self.name.clone(),
                from: self.state,
                to: next,
            });
        }
        debug!("{}: {:?} -> {:?}", self.name, self.state, next);
        self.state = next;
        Ok(())
    }
}
