//! Snapshot-updated notifications

use serde::Serialize;
use tokio::sync::broadcast;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::{Stream, StreamExt};
use tracing::warn;
use uuid::Uuid;

use crate::domain::risk::RiskLevel;
use crate::shared::types::{BasisPoints, PoolId};

const CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum RiskEvent {
    #[serde(rename_all = "camelCase")]
    SnapshotUpdated {
        pool_id: PoolId,
        composite_score: BasisPoints,
        level: RiskLevel,
    },
}

#[derive(Clone)]
pub struct RiskNotifier {
    sender: broadcast::Sender<RiskEvent>,
}

impl Default for RiskNotifier {
    fn default() -> Self {
        Self::new(CHANNEL_CAPACITY)
    }
}

impl RiskNotifier {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Number of subscribers reached; zero when nobody listens
    pub fn publish(&self, event: RiskEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }

    pub fn subscribe(&self) -> Subscription {
        Subscription {
            id: Uuid::new_v4(),
            stream: BroadcastStream::new(self.sender.subscribe()),
        }
    }
}

/// Receiving end of [`RiskNotifier`]. A subscriber that falls behind skips
/// the events it missed.
pub struct Subscription {
    id: Uuid,
    stream: BroadcastStream<RiskEvent>,
}

impl Subscription {
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Next event, `None` once the notifier is gone
    pub async fn next_event(&mut self) -> Option<RiskEvent> {
        loop {
            match self.stream.next().await? {
                Ok(event) => return Some(event),
                Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                    warn!(subscription = %self.id, skipped, "Subscriber lagging, events dropped");
                }
            }
        }
    }

    pub fn into_stream(self) -> impl Stream<Item = RiskEvent> {
        let id = self.id;
        self.stream.filter_map(move |item| match item {
            Ok(event) => Some(event),
            Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                warn!(subscription = %id, skipped, "Subscriber lagging, events dropped");
                None
            }
        })
    }
}
