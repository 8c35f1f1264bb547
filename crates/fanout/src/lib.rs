//! Real-time alert fan-out to live subscribers.
//!
//! This crate provides:
//! - [`AlertPublisher`] — the topic-based broadcast seam the detection
//!   engine publishes through
//! - [`BroadcastHub`] — in-process fan-out over `tokio::sync::broadcast`
//! - Topic constants for alert lifecycle events
//!
//! Fan-out is best-effort by contract: alert persistence is the source of
//! truth and delivery failures never propagate back into detection.

pub mod error;
pub mod hub;
pub mod topics;
pub mod traits;

pub use error::FanoutError;
pub use hub::{AlertEnvelope, BroadcastHub};
pub use traits::AlertPublisher;
