//! Wire-value parsing for Graph API fields.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use nestsync_meta::GraphAction;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

/// Action types counted as conversions, besides any `offsite_conversion.*`.
const CONVERSION_ACTIONS: [&str; 3] = ["purchase", "lead", "complete_registration"];

/// Parses a decimal string (`"12.34"`, `"5000"`) to an integer, truncating
/// toward zero. Absent, empty or malformed values are `0`.
#[must_use]
pub fn parse_count(raw: Option<&str>) -> i64 {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| Decimal::from_str(s).ok())
        .and_then(|d| d.trunc().to_i64())
        .unwrap_or(0)
}

/// Parses a percentage such as click-through rate. Absent, malformed or
/// non-finite values are `0.0`.
#[must_use]
pub fn parse_rate(raw: Option<&str>) -> f64 {
    raw.map(str::trim)
        .and_then(|s| s.parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

#[must_use]
pub fn is_conversion(action_type: &str) -> bool {
    CONVERSION_ACTIONS.contains(&action_type) || action_type.starts_with("offsite_conversion.")
}

/// Sums the values of every conversion action.
#[must_use]
pub fn sum_conversions(actions: &[GraphAction]) -> i64 {
    actions
        .iter()
        .filter(|a| is_conversion(&a.action_type))
        .map(|a| parse_count(a.value.as_deref()))
        .fold(0i64, i64::saturating_add)
}

/// Reads an insight value that may be a JSON number or a numeric string.
#[must_use]
pub fn json_count(value: &serde_json::Value) -> Option<i64> {
    match value {
        serde_json::Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().and_then(|f| Decimal::from_f64_retain(f)?.trunc().to_i64())),
        serde_json::Value::String(s) => Decimal::from_str(s.trim()).ok()?.trunc().to_i64(),
        _ => None,
    }
}

/// Parses Graph timestamps (`2026-03-01T12:00:00+0000`), falling back to RFC 3339.
#[must_use]
pub fn parse_graph_timestamp(raw: Option<&str>) -> Option<DateTime<Utc>> {
    let raw = raw?.trim();
    DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%z")
        .or_else(|_| DateTime::parse_from_rfc3339(raw))
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Calendar date at the start of a timestamp or plain `YYYY-MM-DD` string,
/// as written by the provider.
#[must_use]
pub fn parse_graph_date(raw: Option<&str>) -> Option<NaiveDate> {
    let raw = raw?.trim();
    let date_part = raw.get(..10)?;
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}
