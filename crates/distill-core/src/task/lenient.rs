//! Forgiving serde helpers for persisted records.
//!
//! A malformed field is replaced by its default and logged; it never makes
//! the surrounding state fail to load.

use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use super::{Priority, Status};

const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn epoch() -> DateTime<Utc> {
    DateTime::<Utc>::UNIX_EPOCH
}

/// Parse a due date written either as `YYYY-MM-DD` or as a full RFC 3339
/// timestamp. Timestamps are reduced to the local calendar day.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, DATE_FORMAT) {
        return Some(date);
    }
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Local).date_naive())
}

pub fn date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match &value {
        Value::Null => None,
        Value::String(s) => {
            let parsed = parse_date(s);
            if parsed.is_none() && !s.trim().is_empty() {
                tracing::warn!(raw = %s, "ignoring unparseable due date");
            }
            parsed
        }
        other => {
            tracing::warn!(raw = %other, "ignoring non-string due date");
            None
        }
    })
}

pub fn serialize_date<S>(date: &Option<NaiveDate>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match date {
        Some(d) => serializer.serialize_str(&d.format(DATE_FORMAT).to_string()),
        None => serializer.serialize_none(),
    }
}

pub fn timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(parse_timestamp(&value).unwrap_or_else(|| {
        tracing::warn!(raw = %value, "unparseable timestamp, using epoch");
        epoch()
    }))
}

pub fn optional_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    if value.is_null() {
        return Ok(None);
    }
    let parsed = parse_timestamp(&value);
    if parsed.is_none() {
        tracing::warn!(raw = %value, "ignoring unparseable timestamp");
    }
    Ok(parsed)
}

fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => DateTime::parse_from_rfc3339(s.trim())
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        Value::Number(n) => n.as_i64().and_then(DateTime::from_timestamp_millis),
        _ => None,
    }
}

/// Decode any value, falling back to `T::default()` when it does not fit.
pub fn or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value::<T>(value.clone()).unwrap_or_else(|e| {
        tracing::warn!(raw = %value, error = %e, "ignoring malformed value");
        T::default()
    }))
}

/// Decode a list record by record, dropping the ones that do not decode.
pub fn records<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let raw = match Value::deserialize(deserializer)? {
        Value::Array(items) => items,
        Value::Null => Vec::new(),
        other => {
            tracing::warn!(raw = %other, "ignoring non-list record collection");
            Vec::new()
        }
    };
    let mut out = Vec::with_capacity(raw.len());
    for (index, value) in raw.into_iter().enumerate() {
        match serde_json::from_value::<T>(value) {
            Ok(record) => out.push(record),
            Err(e) => tracing::warn!(index, error = %e, "skipping malformed record"),
        }
    }
    Ok(out)
}

fn ordinal_of(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

impl Serialize for Priority {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.ordinal())
    }
}

impl<'de> Deserialize<'de> for Priority {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        let parsed = ordinal_of(&value)
            .and_then(Priority::from_ordinal)
            .or_else(|| value.as_str().and_then(|s| s.parse().ok()));
        Ok(parsed.unwrap_or_else(|| {
            tracing::warn!(raw = %value, "unknown priority, using default");
            Priority::default()
        }))
    }
}

impl Serialize for Status {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.ordinal())
    }
}

impl<'de> Deserialize<'de> for Status {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        let parsed = ordinal_of(&value)
            .and_then(Status::from_ordinal)
            .or_else(|| value.as_str().and_then(|s| s.parse().ok()));
        Ok(parsed.unwrap_or_else(|| {
            tracing::warn!(raw = %value, "unknown status, using default");
            Status::default()
        }))
    }
}
