//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! The workflow publishes a [`PlatformEvent`] after every committed mutation.
//! Share the bus via `Arc<EventBus>`.

use chrono::{DateTime, Utc};
use ideaflow_core::types::DbId;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

// ---------------------------------------------------------------------------
// Event names
// ---------------------------------------------------------------------------

/// Dot-separated names of the events the workflow publishes.
pub mod names {
    pub const IDEA_SUBMITTED: &str = "idea.submitted";
    pub const IDEA_UPDATED: &str = "idea.updated";
    pub const IDEA_APPROVED: &str = "idea.approved";
    pub const IDEA_REJECTED: &str = "idea.rejected";
    pub const IDEA_STATUS_CHANGED: &str = "idea.status_changed";
    pub const IDEA_ATTACHMENT_ADDED: &str = "idea.attachment_added";
    pub const IDEA_RESTORED: &str = "idea.restored";
    pub const TASK_CREATED: &str = "task.created";
    pub const TASK_UPDATED: &str = "task.updated";
    pub const DISCUSSION_CREATED: &str = "discussion.created";
    pub const DISCUSSION_LOCKED: &str = "discussion.locked";
    pub const DISCUSSION_UNLOCKED: &str = "discussion.unlocked";
    pub const DISCUSSION_MESSAGE: &str = "discussion.message_added";
}

// ---------------------------------------------------------------------------
// PlatformEvent
// ---------------------------------------------------------------------------

/// A committed workflow change.
///
/// Built with [`PlatformEvent::new`] and the `with_*` methods.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformEvent {
    /// Dot-separated event name, see [`names`].
    pub event_type: String,

    /// Idea the change belongs to. Task and discussion events carry their
    /// parent idea here.
    pub idea_id: Option<DbId>,

    /// Entity kind that changed (`"idea"`, `"task"`, `"discussion"`).
    pub source_entity_type: Option<String>,

    pub source_entity_id: Option<DbId>,

    pub actor_user_id: Option<DbId>,

    /// Event-specific data, e.g. `{"from": "approved", "to": "completed"}`.
    pub payload: serde_json::Value,

    pub timestamp: DateTime<Utc>,
}

impl PlatformEvent {
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            idea_id: None,
            source_entity_type: None,
            source_entity_id: None,
            actor_user_id: None,
            payload: serde_json::Value::Object(Default::default()),
            timestamp: Utc::now(),
        }
    }

    pub fn for_idea(mut self, idea_id: DbId) -> Self {
        self.idea_id = Some(idea_id);
        self
    }

    pub fn with_source(mut self, entity_type: impl Into<String>, entity_id: DbId) -> Self {
        self.source_entity_type = Some(entity_type.into());
        self.source_entity_id = Some(entity_id);
        self
    }

    pub fn with_actor(mut self, user_id: DbId) -> Self {
        self.actor_user_id = Some(user_id);
        self
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

const DEFAULT_CAPACITY: usize = 1024;

/// Fan-out bus: every subscriber receives every published event.
///
/// ```rust
/// use ideaflow_events::bus::{names, EventBus, PlatformEvent};
///
/// let bus = EventBus::default();
/// let mut rx = bus.subscribe();
///
/// bus.publish(PlatformEvent::new(names::IDEA_APPROVED).for_idea(42));
/// ```
pub struct EventBus {
    sender: broadcast::Sender<PlatformEvent>,
}

impl EventBus {
    /// When the buffer is full the oldest events are dropped and slow
    /// receivers observe `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish to all current subscribers. Dropped if nobody listens.
    pub fn publish(&self, event: PlatformEvent) {
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PlatformEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscriber_receives_enriched_event() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();

        bus.publish(
            PlatformEvent::new(names::TASK_CREATED)
                .for_idea(42)
                .with_source("task", 7)
                .with_actor(1)
                .with_payload(serde_json::json!({"title": "Write checklist"})),
        );

        let received = rx.recv().await.expect("should receive the event");
        assert_eq!(received.event_type, "task.created");
        assert_eq!(received.idea_id, Some(42));
        assert_eq!(received.source_entity_type.as_deref(), Some("task"));
        assert_eq!(received.source_entity_id, Some(7));
        assert_eq!(received.actor_user_id, Some(1));
        assert_eq!(received.payload["title"], "Write checklist");
    }

    #[tokio::test]
    async fn every_subscriber_sees_the_event() {
        let bus = EventBus::default();
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        bus.publish(PlatformEvent::new(names::IDEA_REJECTED));

        assert_eq!(rx1.recv().await.unwrap().event_type, "idea.rejected");
        assert_eq!(rx2.recv().await.unwrap().event_type, "idea.rejected");
    }

    #[test]
    fn publish_without_subscribers_is_a_no_op() {
        let bus = EventBus::default();
        bus.publish(PlatformEvent::new(names::IDEA_SUBMITTED));
    }
}
