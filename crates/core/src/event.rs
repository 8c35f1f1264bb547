//! Security event record and safe field-path resolution.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::value::MetaValue;

/// Unique event identifier.
pub type EventId = Uuid;

/// Category of an observed security event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Login,
    ApiAccess,
    Firewall,
    FileAccess,
    Network,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Login => "login",
            EventType::ApiAccess => "api_access",
            EventType::Firewall => "firewall",
            EventType::FileAccess => "file_access",
            EventType::Network => "network",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity shared by events, rules, and the alerts a rule produces.
/// Variant order gives `low < medium < high < critical`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Geo context attached by upstream enrichment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub country: String,
    pub city: String,
    pub lat: f64,
    pub lon: f64,
}

impl Location {
    fn field(&self, segments: &[&str]) -> Option<MetaValue> {
        match segments {
            ["country"] => Some(MetaValue::Text(self.country.clone())),
            ["city"] => Some(MetaValue::Text(self.city.clone())),
            ["lat"] => Some(MetaValue::Float(self.lat)),
            ["lon"] => Some(MetaValue::Float(self.lon)),
            _ => None,
        }
    }
}

/// An immutable observed security fact.
///
/// Wire names are camelCase (`sourceIP`, `eventType`, …) — the same document
/// shape rule field paths address. The `processed` flag is flipped exactly
/// once, by the detection engine, after a cycle completes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityEvent {
    #[serde(default = "Uuid::new_v4")]
    pub id: EventId,
    pub timestamp: DateTime<Utc>,
    pub event_type: EventType,
    pub severity: Severity,
    #[serde(rename = "sourceIP")]
    pub source_ip: String,
    #[serde(rename = "targetIP", default, skip_serializing_if = "Option::is_none")]
    pub target_ip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    pub description: String,
    #[serde(default)]
    pub metadata: HashMap<String, MetaValue>,
    #[serde(default)]
    pub processed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anomaly_score: Option<f64>,
}

impl SecurityEvent {
    /// Build an unprocessed event stamped now.
    pub fn new(
        event_type: EventType,
        severity: Severity,
        source_ip: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            event_type,
            severity,
            source_ip: source_ip.into(),
            target_ip: None,
            user_id: None,
            device_id: None,
            location: None,
            description: description.into(),
            metadata: HashMap::new(),
            processed: false,
            anomaly_score: None,
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<MetaValue>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Resolve a dot-separated field path against this event.
    ///
    /// Top-level segments use wire names (`sourceIP`, `eventType`,
    /// `anomalyScore`, …); `metadata.*` descends into nested maps. Missing
    /// or non-traversable segments yield `None` rather than erroring.
    pub fn field(&self, path: &str) -> Option<MetaValue> {
        let mut segments = path.split('.');
        let head = segments.next()?;
        let rest: Vec<&str> = segments.collect();

        // Scalar fields resolve only when the path ends at them.
        let scalar = |value: MetaValue| {
            if rest.is_empty() {
                Some(value)
            } else {
                None
            }
        };

        match head {
            "id" => scalar(MetaValue::Text(self.id.to_string())),
            "timestamp" => scalar(MetaValue::Text(self.timestamp.to_rfc3339())),
            "eventType" => scalar(MetaValue::Text(self.event_type.as_str().to_string())),
            "severity" => scalar(MetaValue::Text(self.severity.as_str().to_string())),
            "sourceIP" => scalar(MetaValue::Text(self.source_ip.clone())),
            "targetIP" => {
                let v = self.target_ip.clone()?;
                scalar(MetaValue::Text(v))
            }
            "userId" => {
                let v = self.user_id.clone()?;
                scalar(MetaValue::Text(v))
            }
            "deviceId" => {
                let v = self.device_id.clone()?;
                scalar(MetaValue::Text(v))
            }
            "description" => scalar(MetaValue::Text(self.description.clone())),
            "processed" => scalar(MetaValue::Boolean(self.processed)),
            "anomalyScore" => {
                let v = self.anomaly_score?;
                scalar(MetaValue::Float(v))
            }
            "location" => self.location.as_ref().and_then(|loc| loc.field(&rest)),
            "metadata" => {
                if rest.is_empty() {
                    return Some(MetaValue::Map(self.metadata.clone()));
                }
                let root = self.metadata.get(rest[0])?;
                root.descend(&rest[1..]).cloned()
            }
            _ => None,
        }
    }
}
