//! Reader-driven counter.

use std::future::Future;

use async_trait::async_trait;
use tracing::warn;

use crate::error::MetricsResult;
use crate::labels::Labels;
use crate::metric::{Metric, MetricKind, MetricMeta};
use crate::reader::{Reader, ReaderMetric};
use crate::sample::ReaderEntry;

/// A counter whose samples come from a reader on every render.
///
/// The counter keeps no value of its own. To count events, share the
/// state with the reader, e.g. an `Arc<AtomicU64>` captured by both the
/// reader and the code that increments it.
#[derive(Debug, Clone)]
pub struct Counter {
    inner: ReaderMetric,
}

impl Counter {
    /// Create a counter backed by an asynchronous reader.
    pub fn new<F, Fut>(name: &str, reader: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Vec<ReaderEntry>>> + Send + 'static,
    {
        Self::with_reader(name, Reader::new(reader))
    }

    /// Create a counter backed by a synchronous reader.
    pub fn from_fn<F>(name: &str, reader: F) -> Self
    where
        F: Fn() -> Vec<ReaderEntry> + Send + Sync + 'static,
    {
        Self::with_reader(name, Reader::from_fn(reader))
    }

    pub fn with_reader(name: &str, reader: Reader) -> Self {
        Self {
            inner: ReaderMetric::new(name, reader),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.inner.meta.set_description(description);
        self
    }

    pub fn with_labels(mut self, labels: Labels) -> Self {
        self.inner.meta.set_labels(labels);
        self
    }

    /// Has no effect: values come from the reader only.
    ///
    /// Kept for API compatibility. Emits a warning so misuse shows up in
    /// the logs; increment the state the reader reads instead.
    pub fn inc(&self, delta: f64) {
        warn!(
            metric = %self.inner.meta.name(),
            delta,
            "Counter::inc has no effect, counter values come from its reader"
        );
    }
}

#[async_trait]
impl Metric for Counter {
    fn meta(&self) -> &MetricMeta {
        &self.inner.meta
    }

    fn kind(&self) -> MetricKind {
        MetricKind::Counter
    }

    async fn render_body(&self) -> MetricsResult<String> {
        self.inner.render_body(MetricKind::Counter).await
    }
}
