//! Single-condition evaluation against one event.

use std::cmp::Ordering;

use regex::Regex;
use tracing::debug;

use watchtower_core::{Condition, ConditionOperator, MetaValue, SecurityEvent};

/// Evaluate one condition against one event.
///
/// Pure and side-effect free; safe to call concurrently for different
/// events. Fails closed: an event-type mismatch, an unresolvable field
/// path, an invalid regex pattern, or an unknown operator all evaluate to
/// `false` rather than erroring.
pub fn evaluate(event: &SecurityEvent, condition: &Condition) -> bool {
    // The event-type gate precedes field comparison and is not itself an
    // operator.
    if let Some(gate) = condition.event_type {
        if gate != event.event_type {
            return false;
        }
    }

    let resolved = match event.field(&condition.field) {
        Some(value) => value,
        None => return false,
    };

    match condition.operator {
        ConditionOperator::Eq => eq_strict(&resolved, &condition.value),
        ConditionOperator::Gt => compare(&resolved, &condition.value) == Some(Ordering::Greater),
        ConditionOperator::Lt => compare(&resolved, &condition.value) == Some(Ordering::Less),
        ConditionOperator::Contains => resolved
            .to_string()
            .contains(&condition.value.to_string()),
        ConditionOperator::Regex => regex_match(&resolved, &condition.value),
        ConditionOperator::Unknown => false,
    }
}

/// Strict, type-sensitive equality. Numbers compare numerically across the
/// integer/float split; there is no string↔number coercion, and maps never
/// compare equal.
fn eq_strict(resolved: &MetaValue, expected: &MetaValue) -> bool {
    use MetaValue::*;
    match (resolved, expected) {
        (Null, Null) => true,
        (Boolean(a), Boolean(b)) => a == b,
        (Text(a), Text(b)) => a == b,
        (Integer(a), Integer(b)) => a == b,
        (Float(a), Float(b)) => a == b,
        (Integer(a), Float(b)) | (Float(b), Integer(a)) => (*a as f64) == *b,
        _ => false,
    }
}

/// Ordering for `gt`/`lt`: two text operands compare lexicographically;
/// otherwise both sides must yield a number (text operands are parsed
/// permissively). Anything else is unordered.
fn compare(resolved: &MetaValue, expected: &MetaValue) -> Option<Ordering> {
    if let (MetaValue::Text(a), MetaValue::Text(b)) = (resolved, expected) {
        return Some(a.cmp(b));
    }
    let a = numeric(resolved)?;
    let b = numeric(expected)?;
    a.partial_cmp(&b)
}

fn numeric(value: &MetaValue) -> Option<f64> {
    match value {
        MetaValue::Integer(n) => Some(*n as f64),
        MetaValue::Float(x) => Some(*x),
        MetaValue::Text(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn regex_match(resolved: &MetaValue, expected: &MetaValue) -> bool {
    let pattern = expected.to_string();
    match Regex::new(&pattern) {
        Ok(re) => re.is_match(&resolved.to_string()),
        Err(e) => {
            debug!(pattern = %pattern, error = %e, "invalid regex pattern in condition");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use watchtower_core::{EventType, Severity};

    fn login_event() -> SecurityEvent {
        SecurityEvent::new(
            EventType::Login,
            Severity::Medium,
            "10.0.0.5",
            "failed login burst",
        )
        .with_metadata("attempts", 6)
    }

    fn condition(
        field: &str,
        operator: ConditionOperator,
        value: impl Into<MetaValue>,
    ) -> Condition {
        Condition::new(field, operator, value)
    }

    #[test]
    fn event_type_gate_short_circuits() {
        let cond = condition("metadata.attempts", ConditionOperator::Gt, 5)
            .for_event_type(EventType::Firewall);
        assert!(!evaluate(&login_event(), &cond));

        let cond = condition("metadata.attempts", ConditionOperator::Gt, 5)
            .for_event_type(EventType::Login);
        assert!(evaluate(&login_event(), &cond));
    }

    #[test]
    fn gt_numeric_comparison() {
        let event = login_event();
        assert!(evaluate(
            &event,
            &condition("metadata.attempts", ConditionOperator::Gt, 5)
        ));
        assert!(!evaluate(
            &event,
            &condition("metadata.attempts", ConditionOperator::Gt, 6)
        ));
        assert!(evaluate(
            &event,
            &condition("metadata.attempts", ConditionOperator::Lt, 7)
        ));
    }

    #[test]
    fn gt_parses_numeric_text() {
        let event = login_event().with_metadata("count", "12");
        assert!(evaluate(
            &event,
            &condition("metadata.count", ConditionOperator::Gt, 9)
        ));
    }

    #[test]
    fn gt_non_numeric_is_false_not_panic() {
        let event = login_event();
        assert!(!evaluate(
            &event,
            &condition("description", ConditionOperator::Gt, 5)
        ));
        assert!(!evaluate(
            &event,
            &condition("processed", ConditionOperator::Lt, 1)
        ));
    }

    #[test]
    fn text_operands_compare_lexicographically() {
        let event = login_event();
        assert!(evaluate(
            &event,
            &condition("severity", ConditionOperator::Gt, "low")
        ));
    }

    #[test]
    fn eq_is_type_sensitive() {
        let event = login_event().with_metadata("port", 443).with_metadata("tag", "443");
        assert!(evaluate(
            &event,
            &condition("metadata.port", ConditionOperator::Eq, 443)
        ));
        assert!(!evaluate(
            &event,
            &condition("metadata.tag", ConditionOperator::Eq, 443)
        ));
        assert!(evaluate(
            &event,
            &condition("metadata.port", ConditionOperator::Eq, 443.0)
        ));
    }

    #[test]
    fn contains_stringifies_both_operands() {
        let event = login_event();
        assert!(evaluate(
            &event,
            &condition("sourceIP", ConditionOperator::Contains, "10.0")
        ));
        assert!(evaluate(
            &event,
            &condition("metadata.attempts", ConditionOperator::Contains, "6")
        ));
        assert!(!evaluate(
            &event,
            &condition("sourceIP", ConditionOperator::Contains, "192.168")
        ));
    }

    #[test]
    fn regex_matches_stringified_value() {
        let event = login_event();
        assert!(evaluate(
            &event,
            &condition("sourceIP", ConditionOperator::Regex, r"^10\.0\.")
        ));
        assert!(!evaluate(
            &event,
            &condition("sourceIP", ConditionOperator::Regex, r"^192\.")
        ));
    }

    #[test]
    fn invalid_regex_fails_closed() {
        let event = login_event();
        assert!(!evaluate(
            &event,
            &condition("description", ConditionOperator::Regex, "(")
        ));
    }

    #[test]
    fn unknown_operator_is_false() {
        let event = login_event();
        assert!(!evaluate(
            &event,
            &condition("sourceIP", ConditionOperator::Unknown, "10.0.0.5")
        ));
    }

    #[test]
    fn unresolvable_path_fails_closed_for_every_operator() {
        let event = login_event();
        for op in [
            ConditionOperator::Eq,
            ConditionOperator::Gt,
            ConditionOperator::Lt,
            ConditionOperator::Contains,
            ConditionOperator::Regex,
        ] {
            assert!(
                !evaluate(&event, &condition("metadata.missing", op, "x")),
                "operator {:?} matched a missing field",
                op
            );
        }
    }
}
