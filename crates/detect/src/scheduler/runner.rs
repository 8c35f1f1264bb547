//! Periodic driver for the detection engine.

use std::str::FromStr;
use std::sync::Arc;

use chrono::Utc;
use cron::Schedule;
use tokio::sync::Notify;
use tracing::{error, info, warn};

use super::cron::{duration_until, next_tick, normalize_cron};
use super::engine::DetectionEngine;

/// Drives [`DetectionEngine::run_cycle`] on a cron schedule.
///
/// Runs on a single task and awaits each cycle inline, so a new cycle can
/// never start while the previous one is still running. Shutdown is only
/// observed between cycles: an in-flight cycle always finishes its rule
/// evaluation and the final mark-processed step, so events are never left
/// stuck half-processed.
pub struct EngineRunner {
    engine: DetectionEngine,
    schedule: Schedule,
    cron_expr: String,
    shutdown: Arc<Notify>,
}

impl EngineRunner {
    /// Build a runner from a 5- or 6-field cron expression.
    pub fn new(
        engine: DetectionEngine,
        cron_expr: &str,
        shutdown: Arc<Notify>,
    ) -> Result<Self, cron::error::Error> {
        let cron_expr = normalize_cron(cron_expr);
        let schedule = Schedule::from_str(&cron_expr)?;
        Ok(Self {
            engine,
            schedule,
            cron_expr,
            shutdown,
        })
    }

    /// Run until shutdown is signalled.
    pub async fn run(self) {
        info!(schedule = %self.cron_expr, "detection runner started");
        loop {
            let now = Utc::now();
            let next = match next_tick(&self.schedule, now) {
                Some(next) => next,
                None => {
                    warn!("cron schedule has no upcoming tick, runner exiting");
                    break;
                }
            };

            tokio::select! {
                _ = tokio::time::sleep(duration_until(now, next)) => {
                    match self.engine.run_cycle().await {
                        Ok(outcome) if !outcome.rule_failures.is_empty() => {
                            warn!(
                                failures = outcome.rule_failures.len(),
                                "cycle finished with rule failures"
                            );
                        }
                        Ok(_) => {}
                        Err(e) => error!(error = %e, "detection cycle failed"),
                    }
                }
                _ = self.shutdown.notified() => {
                    info!("detection runner shutting down");
                    break;
                }
            }
        }
    }
}
