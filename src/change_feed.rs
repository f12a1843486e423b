//! Row-level change notifications.
//!
//! Services publish an event after each committed write; connected clients
//! subscribe and re-fetch the affected rows. The feed only signals that
//! something changed and carries no state, so a subscriber that lags behind
//! the channel capacity simply refreshes everything it shows.

use futures::stream::{self, Stream};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;

/// Default number of events buffered per subscriber.
pub const DEFAULT_CAPACITY: usize = 256;

/// Persisted collection an event refers to.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Entity {
    Orders,
    OrderItems,
    Tables,
    Payments,
}

/// What happened to the row.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Inserted,
    Updated,
    Deleted,
}

/// Notification that a row changed.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChangeEvent {
    pub entity: Entity,
    pub id: i32,
    pub kind: ChangeKind,
}

impl ChangeEvent {
    pub fn inserted(entity: Entity, id: i32) -> Self {
        Self {
            entity,
            id,
            kind: ChangeKind::Inserted,
        }
    }

    pub fn updated(entity: Entity, id: i32) -> Self {
        Self {
            entity,
            id,
            kind: ChangeKind::Updated,
        }
    }

    pub fn deleted(entity: Entity, id: i32) -> Self {
        Self {
            entity,
            id,
            kind: ChangeKind::Deleted,
        }
    }
}

/// Message delivered to a streaming subscriber.
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FeedMessage {
    Change(ChangeEvent),
    /// `missed` events were dropped. Everything shown must be re-fetched.
    RefreshAll { missed: u64 },
}

impl FeedMessage {
    /// Name used as the server-sent event type.
    pub fn event_name(&self) -> &'static str {
        match self {
            Self::Change(_) => "change",
            Self::RefreshAll { .. } => "refresh_all",
        }
    }

    /// Whether a subscriber interested only in `entity` should see it.
    pub fn concerns(&self, entity: Option<Entity>) -> bool {
        match (self, entity) {
            (Self::Change(event), Some(entity)) => event.entity == entity,
            _ => true,
        }
    }
}

/// Turn `receiver` into a stream of feed messages. A lagged receiver yields
/// [`FeedMessage::RefreshAll`] and keeps going; the stream ends once the
/// feed is dropped.
pub fn feed_stream(
    receiver: broadcast::Receiver<ChangeEvent>,
) -> impl Stream<Item = FeedMessage> {
    stream::unfold(receiver, |mut receiver| async move {
        let message = match receiver.recv().await {
            Ok(event) => FeedMessage::Change(event),
            Err(RecvError::Lagged(missed)) => {
                log::warn!("Change feed subscriber lagged, {missed} event(s) dropped");
                FeedMessage::RefreshAll { missed }
            }
            Err(RecvError::Closed) => return None,
        };
        Some((message, receiver))
    })
}

#[derive(Clone, Debug)]
/// Broadcast channel fanning change events out to subscribers.
pub struct ChangeFeed {
    sender: broadcast::Sender<ChangeEvent>, // cheap to clone
}

impl ChangeFeed {
    /// Create a feed buffering up to `capacity` events per subscriber.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Register interest in future change events.
    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.sender.subscribe()
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Fan an event out to every subscriber.
    pub fn publish(&self, event: ChangeEvent) {
        // Sending only fails when nobody listens.
        if self.sender.send(event).is_err() {
            log::trace!("No subscribers for change event {event:?}");
        }
    }

    /// Publish a batch of events in order.
    pub fn publish_all(&self, events: impl IntoIterator<Item = ChangeEvent>) {
        for event in events {
            self.publish(event);
        }
    }
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
