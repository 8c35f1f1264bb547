//! Detection rule schema: condition clauses, operators, and actions.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::event::{EventType, Severity};
use crate::value::MetaValue;

/// Rule identifier — a stable string chosen by the rule author or the
/// backing store (e.g. the YAML file's `id` field).
pub type RuleId = String;

/// Comparison operator of a single condition clause.
///
/// Operator strings outside the known set deserialize to [`Unknown`]
/// (`ConditionOperator::Unknown`), which never matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConditionOperator {
    Eq,
    Gt,
    Lt,
    Contains,
    Regex,
    #[serde(other)]
    Unknown,
}

/// A single comparison clause within a rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// Gate: events of a different type are skipped before any comparison.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_type: Option<EventType>,
    /// Dot-path into the event document (e.g. `metadata.attempts`).
    pub field: String,
    pub operator: ConditionOperator,
    /// Expected value, compared permissively per operator.
    #[serde(default)]
    pub value: MetaValue,
    /// Carried for rule authors; not evaluated by the engine.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_window: Option<u64>,
    /// Minimum count of matching events for the rule to fire. Only the
    /// first condition's threshold is consulted (legacy encoding).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<u32>,
}

impl Condition {
    pub fn new(
        field: impl Into<String>,
        operator: ConditionOperator,
        value: impl Into<MetaValue>,
    ) -> Self {
        Self {
            event_type: None,
            field: field.into(),
            operator,
            value: value.into(),
            time_window: None,
            threshold: None,
        }
    }

    pub fn for_event_type(mut self, event_type: EventType) -> Self {
        self.event_type = Some(event_type);
        self
    }

    pub fn with_threshold(mut self, threshold: u32) -> Self {
        self.threshold = Some(threshold);
        self
    }
}

/// What a fired rule asks the surrounding system to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionType {
    Alert,
    Block,
    Email,
    Webhook,
}

/// Rule action entry. The engine only ever creates alerts itself; other
/// action kinds are dispatched by downstream collaborators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleAction {
    #[serde(rename = "type")]
    pub kind: ActionType,
    #[serde(default)]
    pub config: HashMap<String, MetaValue>,
}

impl RuleAction {
    /// The default action list: a single `alert` action.
    pub fn default_actions() -> Vec<RuleAction> {
        vec![RuleAction {
            kind: ActionType::Alert,
            config: HashMap::new(),
        }]
    }
}

/// A named predicate + threshold policy over a batch of events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionRule {
    pub id: RuleId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    pub severity: Severity,
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(default = "RuleAction::default_actions")]
    pub actions: Vec<RuleAction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
}

fn default_enabled() -> bool {
    true
}

impl DetectionRule {
    pub fn new(id: impl Into<RuleId>, name: impl Into<String>, severity: Severity) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            enabled: true,
            severity,
            conditions: Vec::new(),
            actions: RuleAction::default_actions(),
            created_by: None,
        }
    }

    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    /// The rule-level firing threshold, read from the first condition only.
    pub fn threshold(&self) -> Option<u32> {
        self.conditions.first().and_then(|c| c.threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_operator_string_deserializes() {
        let condition: Condition = serde_json::from_str(
            r#"{"field": "severity", "operator": "startswith", "value": "hi"}"#,
        )
        .unwrap();
        assert_eq!(condition.operator, ConditionOperator::Unknown);
    }

    #[test]
    fn rule_defaults_from_minimal_document() {
        let rule: DetectionRule = serde_yaml::from_str(
            r#"
id: brute-force-login
name: Brute force login
severity: high
conditions:
  - eventType: login
    field: metadata.attempts
    operator: gt
    value: 5
    threshold: 1
"#,
        )
        .unwrap();

        assert!(rule.enabled);
        assert_eq!(rule.threshold(), Some(1));
        assert_eq!(rule.actions, RuleAction::default_actions());
        assert_eq!(rule.conditions[0].event_type, Some(EventType::Login));
        assert_eq!(rule.conditions[0].value, MetaValue::Integer(5));
    }

    #[test]
    fn threshold_reads_first_condition_only() {
        let rule = DetectionRule::new("r1", "Rule 1", Severity::Low)
            .with_condition(Condition::new("severity", ConditionOperator::Eq, "high"))
            .with_condition(
                Condition::new("sourceIP", ConditionOperator::Contains, "10.").with_threshold(9),
            );
        assert_eq!(rule.threshold(), None);
    }
}
