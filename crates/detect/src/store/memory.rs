//! In-memory store implementations.
//!
//! Reference backends for tests, demos, and embedding. Thread-safe via
//! `std::sync::RwLock`; no guard is held across an await point.

use std::collections::HashSet;
use std::sync::RwLock;

use async_trait::async_trait;

use watchtower_core::{Alert, AlertDraft, DetectionRule, EventId, SecurityEvent};

use super::{AlertSink, EventStore, RuleStore, StoreError};

fn poisoned(what: &str) -> StoreError {
    StoreError::Backend(format!("{} lock poisoned", what))
}

// ── Event store ─────────────────────────────────────────────────────

/// Append-only in-memory event log.
#[derive(Default)]
pub struct MemoryEventStore {
    events: RwLock<Vec<SecurityEvent>>,
}

impl MemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event to the log.
    pub fn insert(&self, event: SecurityEvent) {
        if let Ok(mut events) = self.events.write() {
            events.push(event);
        }
    }

    pub fn len(&self) -> usize {
        self.events.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of all events, for inspection in tests.
    pub fn snapshot(&self) -> Vec<SecurityEvent> {
        self.events.read().map(|e| e.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl EventStore for MemoryEventStore {
    async fn fetch_unprocessed(&self, limit: usize) -> Result<Vec<SecurityEvent>, StoreError> {
        let events = self.events.read().map_err(|_| poisoned("event store"))?;
        let mut unprocessed: Vec<SecurityEvent> =
            events.iter().filter(|e| !e.processed).cloned().collect();
        unprocessed.sort_by_key(|e| e.timestamp);
        unprocessed.truncate(limit);
        Ok(unprocessed)
    }

    async fn mark_processed(&self, ids: &[EventId]) -> Result<(), StoreError> {
        let ids: HashSet<&EventId> = ids.iter().collect();
        let mut events = self.events.write().map_err(|_| poisoned("event store"))?;
        for event in events.iter_mut() {
            if ids.contains(&event.id) {
                event.processed = true;
            }
        }
        Ok(())
    }
}

// ── Rule store ──────────────────────────────────────────────────────

/// Fixed in-memory rule set.
#[derive(Default)]
pub struct MemoryRuleStore {
    rules: RwLock<Vec<DetectionRule>>,
}

impl MemoryRuleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rules(rules: Vec<DetectionRule>) -> Self {
        Self {
            rules: RwLock::new(rules),
        }
    }

    pub fn insert(&self, rule: DetectionRule) {
        if let Ok(mut rules) = self.rules.write() {
            rules.push(rule);
        }
    }

    /// Swap the full rule set (e.g. after an external reload).
    pub fn replace_all(&self, rules: Vec<DetectionRule>) {
        if let Ok(mut current) = self.rules.write() {
            *current = rules;
        }
    }
}

#[async_trait]
impl RuleStore for MemoryRuleStore {
    async fn fetch_enabled(&self) -> Result<Vec<DetectionRule>, StoreError> {
        let rules = self.rules.read().map_err(|_| poisoned("rule store"))?;
        Ok(rules.iter().filter(|r| r.enabled).cloned().collect())
    }
}

// ── Alert sink ──────────────────────────────────────────────────────

/// In-memory alert sink; assigns ID, creation timestamp, and `pending`.
#[derive(Default)]
pub struct MemoryAlertSink {
    alerts: RwLock<Vec<Alert>>,
}

impl MemoryAlertSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alerts(&self) -> Vec<Alert> {
        self.alerts.read().map(|a| a.clone()).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.alerts.read().map(|a| a.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl AlertSink for MemoryAlertSink {
    async fn create(&self, draft: AlertDraft) -> Result<Alert, StoreError> {
        let alert = Alert::from_draft(draft);
        let mut alerts = self.alerts.write().map_err(|_| poisoned("alert sink"))?;
        alerts.push(alert.clone());
        Ok(alert)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use watchtower_core::{EventType, Severity};

    fn event_at(offset_secs: i64, source_ip: &str) -> SecurityEvent {
        let mut event = SecurityEvent::new(
            EventType::Network,
            Severity::Low,
            source_ip,
            "connection observed",
        );
        event.timestamp = Utc::now() + Duration::seconds(offset_secs);
        event
    }

    #[tokio::test]
    async fn fetch_unprocessed_orders_oldest_first_with_limit() {
        let store = MemoryEventStore::new();
        store.insert(event_at(30, "10.0.0.3"));
        store.insert(event_at(10, "10.0.0.1"));
        store.insert(event_at(20, "10.0.0.2"));

        let batch = store.fetch_unprocessed(2).await.unwrap();
        let ips: Vec<&str> = batch.iter().map(|e| e.source_ip.as_str()).collect();
        assert_eq!(ips, vec!["10.0.0.1", "10.0.0.2"]);
    }

    #[tokio::test]
    async fn mark_processed_excludes_from_next_fetch() {
        let store = MemoryEventStore::new();
        store.insert(event_at(0, "10.0.0.1"));
        store.insert(event_at(1, "10.0.0.2"));

        let batch = store.fetch_unprocessed(10).await.unwrap();
        let first_id = batch[0].id;
        store.mark_processed(&[first_id]).await.unwrap();

        let remaining = store.fetch_unprocessed(10).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].source_ip, "10.0.0.2");

        // Idempotent: marking again (plus an unknown ID) changes nothing.
        store
            .mark_processed(&[first_id, uuid::Uuid::new_v4()])
            .await
            .unwrap();
        assert_eq!(store.fetch_unprocessed(10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn rule_store_filters_disabled() {
        let mut disabled = DetectionRule::new("r2", "Rule 2", Severity::Low);
        disabled.enabled = false;
        let store = MemoryRuleStore::with_rules(vec![
            DetectionRule::new("r1", "Rule 1", Severity::Low),
            disabled,
        ]);

        let enabled = store.fetch_enabled().await.unwrap();
        assert_eq!(enabled.len(), 1);
        assert_eq!(enabled[0].id, "r1");
    }

    #[tokio::test]
    async fn sink_assigns_identity_and_pending_status() {
        let sink = MemoryAlertSink::new();
        let draft = AlertDraft {
            event_ids: vec![uuid::Uuid::new_v4()],
            rule_id: "r1".to_string(),
            rule_name: "Rule 1".to_string(),
            severity: Severity::Critical,
            summary: "Rule 1: 1 event(s) detected".to_string(),
            affected_assets: vec!["10.0.0.5".to_string()],
        };

        let alert = sink.create(draft).await.unwrap();
        assert_eq!(alert.status, watchtower_core::AlertStatus::Pending);
        assert_eq!(sink.len(), 1);
        assert_eq!(sink.alerts()[0].id, alert.id);
    }
}
