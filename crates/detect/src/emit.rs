//! Alert emission: persist a fired rule's alert, then fan it out.
//!
//! Persistence is the source of truth; broadcast is best-effort. A
//! delivery failure is logged and swallowed — it never fails the emission
//! or the surrounding detection cycle.

use std::sync::Arc;

use indexmap::IndexSet;
use tracing::{info, warn};

use watchtower_core::{Alert, AlertDraft, DetectionRule, SecurityEvent};
use watchtower_fanout::{topics, AlertPublisher};

use crate::store::{AlertSink, StoreError};

pub struct AlertEmitter {
    sink: Arc<dyn AlertSink>,
    fanout: Arc<dyn AlertPublisher>,
}

impl AlertEmitter {
    pub fn new(sink: Arc<dyn AlertSink>, fanout: Arc<dyn AlertPublisher>) -> Self {
        Self { sink, fanout }
    }

    /// Persist an alert for a fired rule and broadcast it to subscribers.
    ///
    /// `triggered` is the non-empty set of events the rule matched this
    /// cycle, in batch order.
    pub async fn emit(
        &self,
        rule: &DetectionRule,
        triggered: &[&SecurityEvent],
    ) -> Result<Alert, StoreError> {
        let summary = format!("{}: {} event(s) detected", rule.name, triggered.len());
        // Dedup source IPs preserving first-seen order.
        let affected_assets: IndexSet<String> =
            triggered.iter().map(|e| e.source_ip.clone()).collect();

        let draft = AlertDraft {
            event_ids: triggered.iter().map(|e| e.id).collect(),
            rule_id: rule.id.clone(),
            rule_name: rule.name.clone(),
            severity: rule.severity,
            summary,
            affected_assets: affected_assets.into_iter().collect(),
        };

        let alert = self.sink.create(draft).await?;
        info!(
            alert_id = %alert.id,
            rule_id = %rule.id,
            events = alert.event_ids.len(),
            severity = %alert.severity,
            "alert created"
        );

        if let Err(e) = self.fanout.publish(topics::ALERT_NEW, &alert).await {
            warn!(alert_id = %alert.id, error = %e, "new-alert broadcast failed");
        }

        Ok(alert)
    }

    /// Broadcast a mutation of an existing alert (status, assignee, notes).
    ///
    /// Same best-effort policy as creation; the mutation itself is the
    /// caller's responsibility.
    pub async fn broadcast_update(&self, alert: &Alert) {
        if let Err(e) = self.fanout.publish(topics::ALERT_UPDATED, alert).await {
            warn!(alert_id = %alert.id, error = %e, "alert-update broadcast failed");
        }
    }
}
