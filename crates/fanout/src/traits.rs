use std::sync::Arc;

use async_trait::async_trait;

use watchtower_core::Alert;

use crate::error::FanoutError;

/// Publishes alert lifecycle events to all live subscribers.
///
/// Subscribers filter by topic (see [`crate::topics`]). This is the
/// broadcast side of the fan-out pattern; the engine never consumes a
/// return payload from it.
#[async_trait]
pub trait AlertPublisher: Send + Sync {
    /// Broadcast an alert under the given topic.
    async fn publish(&self, topic: &str, alert: &Alert) -> Result<(), FanoutError>;
}

/// Blanket implementation so `Arc<dyn AlertPublisher>` can be used directly.
#[async_trait]
impl<T: AlertPublisher + ?Sized> AlertPublisher for Arc<T> {
    async fn publish(&self, topic: &str, alert: &Alert) -> Result<(), FanoutError> {
        (**self).publish(topic, alert).await
    }
}
