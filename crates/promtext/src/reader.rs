//! Reader callbacks that drive counters and gauges.
//!
//! A reader is invoked on every render and reports the current samples.
//! It owns whatever state it needs; the metric itself stores nothing
//! but its identity.

use std::future::Future;
use std::sync::Arc;

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use tracing::debug;

use crate::error::MetricsResult;
use crate::metric::{MetricKind, MetricMeta};
use crate::sample::{ReaderEntry, Sample, epoch_millis};

/// Future returned by a reader.
pub type ReaderFuture = BoxFuture<'static, anyhow::Result<Vec<ReaderEntry>>>;

/// A shareable reader callback.
#[derive(Clone)]
pub struct Reader(Arc<dyn Fn() -> ReaderFuture + Send + Sync>);

impl Reader {
    /// Wrap an asynchronous reader.
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Vec<ReaderEntry>>> + Send + 'static,
    {
        Self(Arc::new(move || f().boxed()))
    }

    /// Wrap a synchronous, infallible reader.
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn() -> Vec<ReaderEntry> + Send + Sync + 'static,
    {
        Self(Arc::new(move || {
            let entries = f();
            async move { Ok::<_, anyhow::Error>(entries) }.boxed()
        }))
    }

    pub async fn read(&self) -> anyhow::Result<Vec<ReaderEntry>> {
        (self.0)().await
    }
}

impl std::fmt::Debug for Reader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Reader")
    }
}

/// Shared body of the reader-driven kinds.
#[derive(Debug, Clone)]
pub(crate) struct ReaderMetric {
    pub(crate) meta: MetricMeta,
    reader: Reader,
}

impl ReaderMetric {
    pub(crate) fn new(name: &str, reader: Reader) -> Self {
        Self {
            meta: MetricMeta::new(name),
            reader,
        }
    }

    /// One `name{labels} value timestamp` line per reader entry.
    pub(crate) async fn render_body(&self, kind: MetricKind) -> MetricsResult<String> {
        let entries = self.reader.read().await?;
        let now = epoch_millis();
        debug!(
            metric = %self.meta.name(),
            %kind,
            samples = entries.len(),
            "reader produced samples"
        );

        let mut out = String::new();
        for entry in entries {
            let sample = Sample::normalize(entry, now);
            out.push_str(&self.meta.line(
                "",
                &sample.labels,
                sample.value,
                Some(sample.timestamp_ms),
            ));
        }
        Ok(out)
    }
}
