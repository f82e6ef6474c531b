//! Outbound transport for the lookahead lane

use crate::common::Lane;
use crate::error::{Result, WaypointError};
use tokio::sync::watch;

/// Sink for the lane emitted on every control tick
pub trait LanePublisher: Send + Sync {
    fn publish(&self, lane: &Lane) -> Result<()>;
}

/// Publishes lanes into a single-slot tokio `watch` channel.
///
/// A lane the consumer has not read yet is replaced by the next one, so the
/// controller always sees the most recent window.
#[derive(Debug)]
pub struct ChannelPublisher {
    tx: watch::Sender<Option<Lane>>,
}

impl ChannelPublisher {
    /// Create a publisher and the receiving end of its channel
    pub fn channel() -> (Self, watch::Receiver<Option<Lane>>) {
        let (tx, rx) = watch::channel(None);
        (ChannelPublisher { tx }, rx)
    }
}

impl LanePublisher for ChannelPublisher {
    fn publish(&self, lane: &Lane) -> Result<()> {
        self.tx
            .send(Some(lane.clone()))
            .map_err(|_| WaypointError::Publish("final waypoints receiver closed".to_string()))
    }
}
