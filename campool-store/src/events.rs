use async_trait::async_trait;
use campool_core::events::EventSink;
use campool_shared::BoardEvent;
use tokio::sync::broadcast;
use tracing::info;

/// In-process event fan-out. The notification side subscribes and turns
/// events into pushes and in-app messages; publishing never waits on them.
pub struct EventDispatcher {
    tx: broadcast::Sender<BoardEvent>,
}

impl EventDispatcher {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BoardEvent> {
        self.tx.subscribe()
    }
}

#[async_trait]
impl EventSink for EventDispatcher {
    async fn publish(
        &self,
        event: BoardEvent,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let payload = serde_json::to_string(&event)?;
        info!(
            "Published {} event for {}: {}",
            event.topic(),
            event.key(),
            payload
        );

        // No live subscribers is not an error; fan-out is best effort.
        let _ = self.tx.send(event);
        Ok(())
    }
}
