//! Rule matching over event batches.
//!
//! A rule's conditions combine with implicit AND: an event is a candidate
//! only when every condition passes, and evaluation short-circuits on the
//! first failure. The rule-level firing threshold is read from the FIRST
//! condition only — a legacy encoding preserved for compatibility with
//! existing rule documents.

mod condition;

pub use condition::evaluate;

use watchtower_core::{DetectionRule, SecurityEvent};

/// Apply a rule's full condition set and threshold policy to an event batch.
///
/// Returns the triggered subset in input order. With a threshold `T`, a
/// candidate count below `T` means the rule does not fire this cycle and
/// the result is empty even though individual events matched. Zero
/// conditions match vacuously. Pure: calling twice on the same inputs
/// yields identical results.
pub fn match_rule<'a>(
    rule: &DetectionRule,
    events: &'a [SecurityEvent],
) -> Vec<&'a SecurityEvent> {
    let candidates: Vec<&SecurityEvent> = events
        .iter()
        .filter(|event| rule.conditions.iter().all(|c| evaluate(event, c)))
        .collect();

    if let Some(threshold) = rule.threshold() {
        if (candidates.len() as u32) < threshold {
            return Vec::new();
        }
    }

    candidates
}
