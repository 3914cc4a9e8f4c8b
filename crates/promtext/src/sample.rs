//! Reader output normalization.
//!
//! Counter and gauge readers may report a sample in any of four shapes.
//! [`ReaderEntry`] names each shape explicitly, and [`Sample::normalize`]
//! maps every one of them to the canonical `(value, labels, timestamp)`
//! triple used by the renderers.

use std::time::{SystemTime, UNIX_EPOCH};

use serde_json::Value;

use crate::error::{MetricsError, MetricsResult};
use crate::labels::Labels;

/// One entry produced by a reader, in one of the four accepted shapes.
#[derive(Debug, Clone, PartialEq)]
pub enum ReaderEntry {
    /// A bare value, stamped with the current time.
    Value(f64),
    /// A value with an explicit timestamp in milliseconds.
    Stamped(f64, i64),
    /// A value with labels, stamped with the current time.
    Labelled(f64, Labels),
    /// A value with labels and an explicit timestamp.
    Full(f64, Labels, i64),
}

impl From<f64> for ReaderEntry {
    fn from(value: f64) -> Self {
        ReaderEntry::Value(value)
    }
}

impl From<(f64, i64)> for ReaderEntry {
    fn from((value, ts): (f64, i64)) -> Self {
        ReaderEntry::Stamped(value, ts)
    }
}

impl From<(f64, Labels)> for ReaderEntry {
    fn from((value, labels): (f64, Labels)) -> Self {
        ReaderEntry::Labelled(value, labels)
    }
}

impl From<(f64, Labels, i64)> for ReaderEntry {
    fn from((value, labels, ts): (f64, Labels, i64)) -> Self {
        ReaderEntry::Full(value, labels, ts)
    }
}

/// Dynamically shaped reader output (JSON, TOML, script output).
///
/// A two-element array is discriminated by the type of its second
/// element: a number is a timestamp, an object is a label map.
impl TryFrom<&Value> for ReaderEntry {
    type Error = MetricsError;

    fn try_from(raw: &Value) -> MetricsResult<Self> {
        let unexpected = || MetricsError::UnexpectedValueFormat(raw.to_string());

        match raw {
            Value::Number(n) => n.as_f64().map(ReaderEntry::Value).ok_or_else(unexpected),
            Value::Array(items) => {
                let value = items
                    .first()
                    .and_then(Value::as_f64)
                    .ok_or_else(unexpected)?;
                match items.as_slice() {
                    [_, second @ Value::Number(_)] => {
                        let ts = timestamp(second).ok_or_else(unexpected)?;
                        Ok(ReaderEntry::Stamped(value, ts))
                    }
                    [_, second @ Value::Object(_)] => {
                        let labels = labels(second).ok_or_else(unexpected)?;
                        Ok(ReaderEntry::Labelled(value, labels))
                    }
                    [_, second @ Value::Object(_), third @ Value::Number(_)] => {
                        let labels = labels(second).ok_or_else(unexpected)?;
                        let ts = timestamp(third).ok_or_else(unexpected)?;
                        Ok(ReaderEntry::Full(value, labels, ts))
                    }
                    _ => Err(unexpected()),
                }
            }
            _ => Err(unexpected()),
        }
    }
}

impl TryFrom<Value> for ReaderEntry {
    type Error = MetricsError;

    fn try_from(raw: Value) -> MetricsResult<Self> {
        ReaderEntry::try_from(&raw)
    }
}

/// Integral millisecond timestamp; fractional or out-of-range numbers are
/// rejected rather than truncated.
fn timestamp(raw: &Value) -> Option<i64> {
    if let Some(ts) = raw.as_i64() {
        return Some(ts);
    }
    let f = raw.as_f64()?;
    let in_range = f >= i64::MIN as f64 && f < i64::MAX as f64;
    (f.fract() == 0.0 && in_range).then_some(f as i64)
}

fn labels(raw: &Value) -> Option<Labels> {
    serde_json::from_value(raw.clone()).ok()
}

/// A single data point, built fresh on every render.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub value: f64,
    pub labels: Labels,
    pub timestamp_ms: i64,
}

impl Sample {
    /// Normalize a reader entry, using `now_ms` where it has no timestamp.
    pub fn normalize(entry: ReaderEntry, now_ms: i64) -> Self {
        let (value, labels, timestamp_ms) = match entry {
            ReaderEntry::Value(v) => (v, Labels::new(), now_ms),
            ReaderEntry::Stamped(v, ts) => (v, Labels::new(), ts),
            ReaderEntry::Labelled(v, labels) => (v, labels, now_ms),
            ReaderEntry::Full(v, labels, ts) => (v, labels, ts),
        };
        Sample {
            value,
            labels,
            timestamp_ms,
        }
    }

    /// Normalize a reader entry against the wall clock.
    pub fn now(entry: ReaderEntry) -> Self {
        Self::normalize(entry, epoch_millis())
    }
}

/// Milliseconds since the Unix epoch.
pub fn epoch_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const NOW: i64 = 1_700_000_000_000;

    #[test]
    fn bare_number() {
        let s = Sample::normalize(ReaderEntry::from(42.0), NOW);
        assert_eq!(s.value, 42.0);
        assert!(s.labels.is_empty());
        assert_eq!(s.timestamp_ms, NOW);
    }

    #[test]
    fn value_with_timestamp() {
        let s = Sample::normalize((20.0, 1_600_000_000_000).into(), NOW);
        assert_eq!(s.value, 20.0);
        assert!(s.labels.is_empty());
        assert_eq!(s.timestamp_ms, 1_600_000_000_000);
    }

    #[test]
    fn value_with_labels() {
        let s = Sample::normalize((30.0, Labels::from([("region", "us")])).into(), NOW);
        assert_eq!(s.value, 30.0);
        assert_eq!(s.labels.get("region"), Some("us"));
        assert_eq!(s.timestamp_ms, NOW);
    }

    #[test]
    fn full_entry_passes_through() {
        let labels = Labels::from([("region", "eu")]);
        let s = Sample::normalize((40.0, labels.clone(), 1_500_000_000_000).into(), NOW);
        assert_eq!(
            s,
            Sample {
                value: 40.0,
                labels,
                timestamp_ms: 1_500_000_000_000,
            }
        );
    }

    #[test]
    fn json_shapes() {
        assert_eq!(
            ReaderEntry::try_from(json!(42)).unwrap(),
            ReaderEntry::Value(42.0)
        );
        assert_eq!(
            ReaderEntry::try_from(json!([20, 1_600_000_000_000i64])).unwrap(),
            ReaderEntry::Stamped(20.0, 1_600_000_000_000)
        );
        assert_eq!(
            ReaderEntry::try_from(json!([30, {"region": "us"}])).unwrap(),
            ReaderEntry::Labelled(30.0, Labels::from([("region", "us")]))
        );
        assert_eq!(
            ReaderEntry::try_from(json!([40, {"region": "eu"}, 1_500_000_000_000i64])).unwrap(),
            ReaderEntry::Full(40.0, Labels::from([("region", "eu")]), 1_500_000_000_000)
        );
    }

    #[test]
    fn integral_float_timestamp_is_accepted() {
        assert_eq!(
            ReaderEntry::try_from(json!([2, 1.6e12])).unwrap(),
            ReaderEntry::Stamped(2.0, 1_600_000_000_000)
        );
    }

    #[test]
    fn numeric_looking_label_keys_stay_labels() {
        let entry = ReaderEntry::try_from(json!([1, {"123": "x"}])).unwrap();
        assert_eq!(entry, ReaderEntry::Labelled(1.0, Labels::from([("123", "x")])));
    }

    #[test]
    fn malformed_shapes_are_rejected() {
        for raw in [
            json!("42"),
            json!(null),
            json!([]),
            json!([1]),
            json!(["1", 2]),
            json!([1, "label"]),
            json!([1, 2, 3]),
            json!([1, {"a": "b"}, "ts"]),
            json!([1, {"a": "b"}, 3, 4]),
            json!([1, 1.5]),
            json!([1, 1e30]),
            json!([1, u64::MAX]),
            json!([1, {"a": "b"}, 1_600_000_000_000.25]),
            json!({"value": 1}),
        ] {
            let err = ReaderEntry::try_from(&raw).unwrap_err();
            assert!(
                matches!(err, MetricsError::UnexpectedValueFormat(_)),
                "expected format error for {raw}"
            );
        }
    }

    #[test]
    fn epoch_millis_is_recent() {
        // 2020-09-13 in milliseconds.
        assert!(epoch_millis() > 1_600_000_000_000);
    }
}
