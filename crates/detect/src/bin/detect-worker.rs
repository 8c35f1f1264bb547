//! detect-worker — periodic detection engine host.
//!
//! Wires a YAML-file rule store (with hot-reload), in-memory event and
//! alert stores, and an in-process broadcast hub into the cycle runner.
//! Real deployments replace the memory stores with durable backends; the
//! engine only sees the store traits.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::sync::{broadcast, Notify};
use tracing::{info, warn};

use watchtower_core::{load_dotenv, DetectConfig, EventType, SecurityEvent, Severity};
use watchtower_detect::emit::AlertEmitter;
use watchtower_detect::scheduler::{DetectionEngine, EngineRunner};
use watchtower_detect::store::file::FileRuleStore;
use watchtower_detect::store::memory::{MemoryAlertSink, MemoryEventStore};
use watchtower_fanout::BroadcastHub;

// ── CLI ─────────────────────────────────────────────────────────────

/// Watchtower detection worker — periodic rule evaluation over security
/// events with real-time alert fan-out.
#[derive(Parser, Debug)]
#[command(name = "detect-worker", version, about)]
struct Cli {
    /// Directory containing YAML rule files.
    #[arg(long, env = "RULES_DIR", default_value = "data/rules")]
    rules_dir: PathBuf,

    /// Cron expression driving the detection cycle (5- or 6-field).
    #[arg(long, env = "DETECT_CYCLE_CRON", default_value = "*/30 * * * * *")]
    cycle_cron: String,

    /// Maximum unprocessed events fetched per cycle.
    #[arg(long, env = "DETECT_BATCH_SIZE", default_value_t = 100)]
    batch_size: usize,

    /// Broadcast channel capacity for the alert fanout hub.
    #[arg(long, env = "FANOUT_CAPACITY", default_value_t = 256)]
    fanout_capacity: usize,

    /// Seed sample events into the in-memory event store for a
    /// self-contained demo run.
    #[arg(long, default_value_t = false)]
    demo: bool,
}

// ── main ────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    load_dotenv();
    let cli = Cli::parse();

    let config = DetectConfig {
        cycle_cron: cli.cycle_cron.clone(),
        batch_size: cli.batch_size,
        rules_dir: cli.rules_dir.clone(),
        fanout_capacity: cli.fanout_capacity,
    };
    config.log_summary();

    // Rules from disk, hot-reloaded on change.
    let mut rule_store = FileRuleStore::new(&config.rules_dir);
    let loaded = rule_store.load_all()?;
    if loaded == 0 {
        warn!(
            dir = %config.rules_dir.display(),
            "no rules found; cycles will fetch events but fire nothing"
        );
    }
    if let Err(e) = rule_store.watch() {
        warn!(error = %e, "rule hot-reload unavailable, continuing without it");
    }
    let rule_store = Arc::new(rule_store);

    let event_store = Arc::new(MemoryEventStore::new());
    if cli.demo {
        seed_demo_events(&event_store);
    }

    let sink = Arc::new(MemoryAlertSink::new());
    let hub = Arc::new(BroadcastHub::new(config.fanout_capacity));

    // A live subscriber, standing in for the WebSocket gateway.
    let mut alerts_rx = hub.subscribe();
    tokio::spawn(async move {
        loop {
            match alerts_rx.recv().await {
                Ok(envelope) => info!(
                    topic = %envelope.topic,
                    alert_id = %envelope.alert.id,
                    summary = %envelope.alert.summary,
                    "alert broadcast received"
                ),
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    warn!(missed, "alert subscriber lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    let emitter = AlertEmitter::new(sink, hub);
    let engine = DetectionEngine::new(event_store, rule_store, emitter, config.batch_size);

    let shutdown = Arc::new(Notify::new());
    let runner = EngineRunner::new(engine, &config.cycle_cron, shutdown.clone())
        .context("invalid cycle cron expression")?;

    info!("detect-worker starting");
    let runner_handle = tokio::spawn(runner.run());

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for ctrl-c")?;
    info!("shutdown requested, letting in-flight cycle finish");
    shutdown.notify_one();
    runner_handle.await.context("runner task panicked")?;

    info!("detect-worker exited cleanly");
    Ok(())
}

/// A handful of events that exercise the bundled demo rules.
fn seed_demo_events(store: &MemoryEventStore) {
    store.insert(
        SecurityEvent::new(
            EventType::Login,
            Severity::Medium,
            "10.0.0.5",
            "6 failed logins for admin",
        )
        .with_metadata("attempts", 6),
    );
    store.insert(
        SecurityEvent::new(
            EventType::Login,
            Severity::Low,
            "10.0.0.6",
            "2 failed logins for jdoe",
        )
        .with_metadata("attempts", 2),
    );
    store.insert(SecurityEvent::new(
        EventType::Firewall,
        Severity::Critical,
        "192.168.1.9",
        "blocked outbound connection to known C2 host",
    ));
    info!(events = 3, "seeded demo events");
}
