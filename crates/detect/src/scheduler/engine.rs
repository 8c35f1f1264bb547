//! [`DetectionEngine`] — one detection cycle over a bounded event batch.

use std::sync::Arc;

use tracing::{debug, error, info};

use watchtower_core::{EventId, RuleId};

use crate::emit::AlertEmitter;
use crate::evaluator::match_rule;
use crate::store::{EventStore, RuleStore, StoreError};

/// A rule whose alert emission failed during a cycle.
#[derive(Debug, Clone)]
pub struct RuleFailure {
    pub rule_id: RuleId,
    pub error: String,
}

/// Counters from one cycle, for logs and metrics in the surrounding system.
#[derive(Debug, Clone, Default)]
pub struct CycleOutcome {
    pub events_fetched: usize,
    pub rules_evaluated: usize,
    pub alerts_emitted: usize,
    pub rule_failures: Vec<RuleFailure>,
    /// False when the final mark-processed step failed; the batch will be
    /// refetched next cycle and may produce duplicate alerts.
    pub marked_processed: bool,
}

/// Runs the detection cycle against injected collaborators.
///
/// One cycle: fetch unprocessed events (oldest first, bounded by
/// `batch_size`), fetch enabled rules, match every rule against the full
/// batch, emit one alert per fired rule, then mark the entire batch
/// processed. A failure in one rule's emission is isolated — remaining
/// rules still run and the batch is still marked.
pub struct DetectionEngine {
    events: Arc<dyn EventStore>,
    rules: Arc<dyn RuleStore>,
    emitter: AlertEmitter,
    batch_size: usize,
}

impl DetectionEngine {
    pub fn new(
        events: Arc<dyn EventStore>,
        rules: Arc<dyn RuleStore>,
        emitter: AlertEmitter,
        batch_size: usize,
    ) -> Self {
        Self {
            events,
            rules,
            emitter,
            batch_size,
        }
    }

    /// Execute one detection cycle.
    ///
    /// Returns `Err` only when the cycle could not evaluate at all (event
    /// or rule fetch failed); events are then left unprocessed for the
    /// next cycle to retry. Per-rule failures are captured in the outcome.
    pub async fn run_cycle(&self) -> Result<CycleOutcome, StoreError> {
        let batch = self.events.fetch_unprocessed(self.batch_size).await?;
        if batch.is_empty() {
            debug!("no unprocessed events, skipping cycle");
            return Ok(CycleOutcome {
                marked_processed: true,
                ..CycleOutcome::default()
            });
        }

        let rules = self.rules.fetch_enabled().await?;
        debug!(
            events = batch.len(),
            rules = rules.len(),
            "detection cycle started"
        );

        let mut outcome = CycleOutcome {
            events_fetched: batch.len(),
            rules_evaluated: rules.len(),
            marked_processed: false,
            ..CycleOutcome::default()
        };

        for rule in &rules {
            let triggered = match_rule(rule, &batch);
            if triggered.is_empty() {
                continue;
            }

            // Isolated per rule: a bad sink write must not stop the
            // remaining rules or the final mark-processed step.
            match self.emitter.emit(rule, &triggered).await {
                Ok(_) => outcome.alerts_emitted += 1,
                Err(e) => {
                    error!(rule_id = %rule.id, error = %e, "alert emission failed");
                    outcome.rule_failures.push(RuleFailure {
                        rule_id: rule.id.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        // Every fetched event is marked, triggered or not, exactly once per
        // cycle.
        let ids: Vec<EventId> = batch.iter().map(|e| e.id).collect();
        match self.events.mark_processed(&ids).await {
            Ok(()) => outcome.marked_processed = true,
            Err(e) => {
                error!(
                    events = ids.len(),
                    error = %e,
                    "failed to mark events processed; batch will be retried"
                );
            }
        }

        info!(
            events = outcome.events_fetched,
            rules = outcome.rules_evaluated,
            alerts = outcome.alerts_emitted,
            failures = outcome.rule_failures.len(),
            "detection cycle complete"
        );
        Ok(outcome)
    }
}
