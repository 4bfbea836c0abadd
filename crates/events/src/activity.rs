//! Activity log subscriber.
//!
//! [`ActivityLogger`] consumes the [`EventBus`](crate::bus::EventBus) and
//! writes one structured tracing record per event. It runs as a background
//! task and exits when the bus is dropped.

use tokio::sync::broadcast;

use crate::bus::PlatformEvent;

pub struct ActivityLogger;

impl ActivityLogger {
    /// Run until the channel closes. Returns the number of events logged.
    pub async fn run(mut receiver: broadcast::Receiver<PlatformEvent>) -> u64 {
        let mut logged = 0u64;
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    Self::record(&event);
                    logged += 1;
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Activity logger lagged, events were dropped");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!(logged, "Event bus closed, activity logger shutting down");
                    break;
                }
            }
        }
        logged
    }

    fn record(event: &PlatformEvent) {
        tracing::info!(
            target: "ideaflow::activity",
            event_type = %event.event_type,
            idea_id = ?event.idea_id,
            entity_type = event.source_entity_type.as_deref().unwrap_or("-"),
            entity_id = ?event.source_entity_id,
            actor_id = ?event.actor_user_id,
            payload = %event.payload,
            "Workflow activity"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::{names, EventBus};

    #[tokio::test]
    async fn logs_until_bus_is_dropped() {
        let bus = EventBus::default();
        let handle = tokio::spawn(ActivityLogger::run(bus.subscribe()));

        bus.publish(PlatformEvent::new(names::IDEA_SUBMITTED).for_idea(1));
        bus.publish(PlatformEvent::new(names::IDEA_APPROVED).for_idea(1));
        drop(bus);

        assert_eq!(handle.await.unwrap(), 2);
    }
}
