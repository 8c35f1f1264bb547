//! Environment-backed configuration for the detection engine.

use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_usize(key: &str, default: usize) -> usize {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Detection engine settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectConfig {
    /// Cron expression driving the detection cycle (5- or 6-field).
    pub cycle_cron: String,
    /// Maximum unprocessed events fetched per cycle.
    pub batch_size: usize,
    /// Directory scanned for YAML rule files.
    pub rules_dir: PathBuf,
    /// Broadcast channel capacity for the alert fanout hub.
    pub fanout_capacity: usize,
}

impl DetectConfig {
    /// Build config from environment variables (call `load_dotenv()` first).
    pub fn from_env() -> Self {
        Self {
            cycle_cron: env_or("DETECT_CYCLE_CRON", "*/30 * * * * *"),
            batch_size: env_usize("DETECT_BATCH_SIZE", 100),
            rules_dir: PathBuf::from(env_or("RULES_DIR", "data/rules")),
            fanout_capacity: env_usize("FANOUT_CAPACITY", 256),
        }
    }

    /// Print a summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded:");
        tracing::info!("  cycle:   cron={}", self.cycle_cron);
        tracing::info!("  events:  batch_size={}", self.batch_size);
        tracing::info!("  rules:   dir={}", self.rules_dir.display());
        tracing::info!("  fanout:  capacity={}", self.fanout_capacity);
    }
}

impl Default for DetectConfig {
    fn default() -> Self {
        Self {
            cycle_cron: "*/30 * * * * *".to_string(),
            batch_size: 100,
            rules_dir: PathBuf::from("data/rules"),
            fanout_capacity: 256,
        }
    }
}
