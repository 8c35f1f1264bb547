use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Typed metadata value — event attributes arrive as arbitrary JSON but we
/// preserve type info instead of reaching for dynamic access.
///
/// Untagged so `{"attempts": 6, "tags": {"env": "prod"}}` deserializes
/// directly from event documents and rule files.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum MetaValue {
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    Map(HashMap<String, MetaValue>),
}

impl MetaValue {
    /// Numeric view of the value. Text is not parsed here; comparison
    /// operators decide how permissive to be.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            MetaValue::Integer(n) => Some(*n as f64),
            MetaValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            MetaValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, MetaValue::Null)
    }

    /// Walk dot-path segments through nested maps. Empty segment list
    /// resolves to the value itself; any non-map intermediate yields `None`.
    pub fn descend(&self, segments: &[&str]) -> Option<&MetaValue> {
        let mut current = self;
        for segment in segments {
            current = match current {
                MetaValue::Map(entries) => entries.get(*segment)?,
                _ => return None,
            };
        }
        Some(current)
    }
}

impl Default for MetaValue {
    fn default() -> Self {
        MetaValue::Null
    }
}

/// String rendering used by the substring and regex operators.
impl fmt::Display for MetaValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetaValue::Null => write!(f, "null"),
            MetaValue::Boolean(b) => write!(f, "{}", b),
            MetaValue::Integer(n) => write!(f, "{}", n),
            MetaValue::Float(x) => write!(f, "{}", x),
            MetaValue::Text(s) => write!(f, "{}", s),
            MetaValue::Map(entries) => {
                let json = serde_json::to_string(entries).unwrap_or_default();
                write!(f, "{}", json)
            }
        }
    }
}

impl From<&str> for MetaValue {
    fn from(s: &str) -> Self {
        MetaValue::Text(s.to_string())
    }
}

impl From<String> for MetaValue {
    fn from(s: String) -> Self {
        MetaValue::Text(s)
    }
}

impl From<i64> for MetaValue {
    fn from(n: i64) -> Self {
        MetaValue::Integer(n)
    }
}

impl From<i32> for MetaValue {
    fn from(n: i32) -> Self {
        MetaValue::Integer(n as i64)
    }
}

impl From<f64> for MetaValue {
    fn from(x: f64) -> Self {
        MetaValue::Float(x)
    }
}

impl From<bool> for MetaValue {
    fn from(b: bool) -> Self {
        MetaValue::Boolean(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_untagged_json() {
        let value: MetaValue = serde_json::from_str("6").unwrap();
        assert_eq!(value, MetaValue::Integer(6));

        let value: MetaValue = serde_json::from_str("6.5").unwrap();
        assert_eq!(value, MetaValue::Float(6.5));

        let value: MetaValue = serde_json::from_str("null").unwrap();
        assert_eq!(value, MetaValue::Null);

        let value: MetaValue = serde_json::from_str(r#"{"env":"prod"}"#).unwrap();
        assert_eq!(
            value.descend(&["env"]),
            Some(&MetaValue::Text("prod".to_string()))
        );
    }

    #[test]
    fn descend_missing_segment_is_none() {
        let value: MetaValue = serde_json::from_str(r#"{"a":{"b":1}}"#).unwrap();
        assert_eq!(value.descend(&["a", "b"]), Some(&MetaValue::Integer(1)));
        assert_eq!(value.descend(&["a", "x"]), None);
        assert_eq!(value.descend(&["a", "b", "c"]), None);
    }

    #[test]
    fn display_matches_operator_stringification() {
        assert_eq!(MetaValue::from(6).to_string(), "6");
        assert_eq!(MetaValue::from(true).to_string(), "true");
        assert_eq!(MetaValue::Null.to_string(), "null");
        assert_eq!(MetaValue::from("abc").to_string(), "abc");
    }
}
