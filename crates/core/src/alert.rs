//! Alert records produced when a detection rule fires.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::event::{EventId, Severity};
use crate::rule::RuleId;

/// Unique alert identifier, assigned by the alert sink.
pub type AlertId = Uuid;

/// Investigation lifecycle of an alert.
///
/// Every alert starts `pending`. Operators may move an alert between any
/// two states; the engine creates the initial state and validates nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertStatus {
    Pending,
    Investigating,
    Resolved,
    Escalated,
    FalsePositive,
}

/// Append-only investigation note.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvestigationNote {
    pub author: String,
    pub timestamp: DateTime<Utc>,
    pub note: String,
}

/// What the engine hands the alert sink: everything except the fields the
/// sink assigns (id, creation timestamp, initial status).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertDraft {
    pub event_ids: Vec<EventId>,
    pub rule_id: RuleId,
    pub rule_name: String,
    pub severity: Severity,
    pub summary: String,
    pub affected_assets: Vec<String>,
}

/// A stateful investigation record created when a rule fires.
///
/// `event_ids` is non-empty and references the events that triggered the
/// rule within one detection cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub id: AlertId,
    pub event_ids: Vec<EventId>,
    pub rule_id: RuleId,
    pub rule_name: String,
    pub severity: Severity,
    pub status: AlertStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,
    #[serde(default)]
    pub investigation_notes: Vec<InvestigationNote>,
    pub summary: String,
    pub affected_assets: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl Alert {
    /// Materialize a draft as a persisted record: fresh id, stamped now,
    /// status `pending`. Used by alert sink implementations.
    pub fn from_draft(draft: AlertDraft) -> Self {
        Self {
            id: Uuid::new_v4(),
            event_ids: draft.event_ids,
            rule_id: draft.rule_id,
            rule_name: draft.rule_name,
            severity: draft.severity,
            status: AlertStatus::Pending,
            assigned_to: None,
            investigation_notes: Vec::new(),
            summary: draft.summary,
            affected_assets: draft.affected_assets,
            created_at: Utc::now(),
        }
    }

    /// Append an investigation note stamped now. Notes are never removed.
    pub fn add_note(&mut self, author: impl Into<String>, note: impl Into<String>) {
        self.investigation_notes.push(InvestigationNote {
            author: author.into(),
            timestamp: Utc::now(),
            note: note.into(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> AlertDraft {
        AlertDraft {
            event_ids: vec![Uuid::new_v4()],
            rule_id: "r1".to_string(),
            rule_name: "Rule 1".to_string(),
            severity: Severity::High,
            summary: "Rule 1: 1 event(s) detected".to_string(),
            affected_assets: vec!["10.0.0.5".to_string()],
        }
    }

    #[test]
    fn from_draft_assigns_pending_status() {
        let alert = Alert::from_draft(draft());
        assert_eq!(alert.status, AlertStatus::Pending);
        assert!(alert.investigation_notes.is_empty());
        assert!(alert.assigned_to.is_none());
        assert_eq!(alert.event_ids.len(), 1);
    }

    #[test]
    fn notes_are_append_only() {
        let mut alert = Alert::from_draft(draft());
        alert.add_note("analyst", "looking into it");
        alert.add_note("analyst", "confirmed brute force");
        assert_eq!(alert.investigation_notes.len(), 2);
        assert_eq!(alert.investigation_notes[1].note, "confirmed brute force");
    }

    #[test]
    fn status_serializes_snake_case() {
        let json = serde_json::to_string(&AlertStatus::FalsePositive).unwrap();
        assert_eq!(json, r#""false_positive""#);
    }
}
