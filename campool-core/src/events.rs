use async_trait::async_trait;
use campool_shared::BoardEvent;

/// Sink for board events. Downstream this feeds push notifications and
/// in-app messages; the engine only publishes and never waits on delivery.
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn publish(
        &self,
        event: BoardEvent,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}
