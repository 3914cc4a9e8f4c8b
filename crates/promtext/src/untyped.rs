//! Untyped single-value metric.

use async_trait::async_trait;

use crate::error::MetricsResult;
use crate::labels::Labels;
use crate::metric::{Metric, MetricKind, MetricMeta};
use crate::sample::epoch_millis;

/// Value accepted by [`Untyped::set`]: bare, or with a timestamp.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UntypedValue {
    Bare(f64),
    Stamped(f64, i64),
}

impl From<f64> for UntypedValue {
    fn from(value: f64) -> Self {
        UntypedValue::Bare(value)
    }
}

impl From<(f64, i64)> for UntypedValue {
    fn from((value, ts): (f64, i64)) -> Self {
        UntypedValue::Stamped(value, ts)
    }
}

/// A metric holding one explicitly set value. Renders without a TYPE line.
#[derive(Debug, Clone)]
pub struct Untyped {
    meta: MetricMeta,
    value: f64,
    timestamp_ms: i64,
}

impl Untyped {
    /// Starts at `0`, stamped now.
    pub fn new(name: &str) -> Self {
        Self {
            meta: MetricMeta::new(name),
            value: 0.0,
            timestamp_ms: epoch_millis(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.meta.set_description(description);
        self
    }

    pub fn with_labels(mut self, labels: Labels) -> Self {
        self.meta.set_labels(labels);
        self
    }

    pub fn with_value(mut self, value: impl Into<UntypedValue>) -> Self {
        self.set(value);
        self
    }

    /// Set the value; a bare value is stamped with the current time.
    pub fn set(&mut self, value: impl Into<UntypedValue>) {
        let (value, ts) = match value.into() {
            UntypedValue::Bare(v) => (v, epoch_millis()),
            UntypedValue::Stamped(v, ts) => (v, ts),
        };
        self.value = value;
        self.timestamp_ms = ts;
    }

    /// `(value, timestamp in milliseconds)`.
    pub fn get(&self) -> (f64, i64) {
        (self.value, self.timestamp_ms)
    }
}

#[async_trait]
impl Metric for Untyped {
    fn meta(&self) -> &MetricMeta {
        &self.meta
    }

    fn kind(&self) -> MetricKind {
        MetricKind::Untyped
    }

    async fn render_body(&self) -> MetricsResult<String> {
        Ok(self
            .meta
            .line("", &Labels::new(), self.value, Some(self.timestamp_ms)))
    }
}
