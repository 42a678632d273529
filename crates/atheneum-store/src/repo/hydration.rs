//! Row-to-model hydration helpers
//!
//! JSON-typed TEXT columns decode leniently: malformed stored JSON yields
//! empty collections rather than failing the whole row read.

#![allow(clippy::result_large_err)]

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

/// Decode a JSON array column into strings, tolerating NULL and bad JSON
pub fn string_vec_from_json(raw: Option<String>) -> Vec<String> {
    raw.and_then(|s| serde_json::from_str(&s).ok())
        .unwrap_or_default()
}

/// Decode a JSON array column into ids, tolerating NULL and bad JSON
pub fn id_vec_from_json(raw: Option<String>) -> Vec<i64> {
    raw.and_then(|s| serde_json::from_str(&s).ok())
        .unwrap_or_default()
}

/// Decode a JSON object column into an ordered score map
pub fn score_map_from_json(raw: Option<String>) -> BTreeMap<String, f64> {
    raw.and_then(|s| serde_json::from_str(&s).ok())
        .unwrap_or_default()
}

/// Decode an optional JSON value column
pub fn value_from_json(raw: Option<String>) -> Option<serde_json::Value> {
    raw.and_then(|s| serde_json::from_str(&s).ok())
}

/// Decode an RFC3339 TEXT timestamp, falling back to now for bad data
pub fn datetime_from_text(raw: String) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

/// Decode an optional RFC3339 TEXT timestamp
pub fn optional_datetime_from_text(raw: Option<String>) -> Option<DateTime<Utc>> {
    raw.and_then(|s| {
        DateTime::parse_from_rfc3339(&s)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
    })
}

/// Encode ids as a JSON array column value
pub fn ids_to_json(ids: &[i64]) -> String {
    serde_json::to_string(ids).unwrap_or_else(|_| "[]".to_string())
}

/// Encode strings as a JSON array column value
pub fn strings_to_json(values: &[String]) -> String {
    serde_json::to_string(values).unwrap_or_else(|_| "[]".to_string())
}

/// Encode a score map as a JSON object column value
pub fn score_map_to_json(map: &BTreeMap<String, f64>) -> String {
    serde_json::to_string(map).unwrap_or_else(|_| "{}".to_string())
}

/// Encode an optional JSON value column
pub fn value_to_json(value: &Option<serde_json::Value>) -> Option<String> {
    value.as_ref().map(|v| v.to_string())
}
