//! In-process broadcast hub over `tokio::sync::broadcast`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::debug;

use watchtower_core::Alert;

use crate::error::FanoutError;
use crate::traits::AlertPublisher;

/// What subscribers receive: the alert plus routing topic.
#[derive(Debug, Clone, Serialize)]
pub struct AlertEnvelope {
    pub topic: String,
    pub alert: Alert,
    pub published_at: DateTime<Utc>,
}

/// In-process alert fan-out.
///
/// Wraps a `tokio::sync::broadcast` channel; every subscriber gets every
/// envelope. Publishing with zero live subscribers succeeds — fan-out is
/// best-effort and subscribers come and go with the service process, not
/// with the detection core. Slow subscribers that fall behind `capacity`
/// envelopes observe a lag error on their receiver and miss the oldest
/// entries; they never block publishers.
pub struct BroadcastHub {
    tx: broadcast::Sender<AlertEnvelope>,
}

impl BroadcastHub {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Open a new subscription receiving all envelopes published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<AlertEnvelope> {
        self.tx.subscribe()
    }

    /// Number of currently connected subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for BroadcastHub {
    fn default() -> Self {
        Self::new(256)
    }
}

#[async_trait]
impl AlertPublisher for BroadcastHub {
    async fn publish(&self, topic: &str, alert: &Alert) -> Result<(), FanoutError> {
        let envelope = AlertEnvelope {
            topic: topic.to_string(),
            alert: alert.clone(),
            published_at: Utc::now(),
        };
        match self.tx.send(envelope) {
            Ok(receivers) => {
                debug!(topic, alert_id = %alert.id, receivers, "alert broadcast");
            }
            // Send only fails when no receiver exists; that is a valid
            // best-effort outcome, not a delivery error.
            Err(_) => {
                debug!(topic, alert_id = %alert.id, "no live subscribers");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topics;
    use watchtower_core::{Alert, AlertDraft, Severity};

    fn sample_alert() -> Alert {
        Alert::from_draft(AlertDraft {
            event_ids: vec![uuid::Uuid::new_v4()],
            rule_id: "r1".to_string(),
            rule_name: "Rule 1".to_string(),
            severity: Severity::High,
            summary: "Rule 1: 1 event(s) detected".to_string(),
            affected_assets: vec!["10.0.0.5".to_string()],
        })
    }

    #[tokio::test]
    async fn subscriber_receives_published_alert() {
        let hub = BroadcastHub::new(8);
        let mut rx = hub.subscribe();

        let alert = sample_alert();
        hub.publish(topics::ALERT_NEW, &alert).await.unwrap();

        let envelope = rx.recv().await.unwrap();
        assert_eq!(envelope.topic, topics::ALERT_NEW);
        assert_eq!(envelope.alert.id, alert.id);
    }

    #[tokio::test]
    async fn publish_without_subscribers_succeeds() {
        let hub = BroadcastHub::new(8);
        assert_eq!(hub.subscriber_count(), 0);
        hub.publish(topics::ALERT_UPDATED, &sample_alert())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn every_subscriber_sees_every_envelope() {
        let hub = BroadcastHub::new(8);
        let mut rx_a = hub.subscribe();
        let mut rx_b = hub.subscribe();

        hub.publish(topics::ALERT_NEW, &sample_alert()).await.unwrap();
        hub.publish(topics::ALERT_UPDATED, &sample_alert())
            .await
            .unwrap();

        assert_eq!(rx_a.recv().await.unwrap().topic, topics::ALERT_NEW);
        assert_eq!(rx_a.recv().await.unwrap().topic, topics::ALERT_UPDATED);
        assert_eq!(rx_b.recv().await.unwrap().topic, topics::ALERT_NEW);
        assert_eq!(rx_b.recv().await.unwrap().topic, topics::ALERT_UPDATED);
    }
}
