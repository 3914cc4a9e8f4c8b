//! Reader-driven gauge.

use std::future::Future;

use async_trait::async_trait;

use crate::error::MetricsResult;
use crate::labels::Labels;
use crate::metric::{Metric, MetricKind, MetricMeta};
use crate::reader::{Reader, ReaderMetric};
use crate::sample::ReaderEntry;

/// A gauge whose samples come from a reader on every render.
#[derive(Debug, Clone)]
pub struct Gauge {
    inner: ReaderMetric,
}

impl Gauge {
    /// Create a gauge backed by an asynchronous reader.
    pub fn new<F, Fut>(name: &str, reader: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Vec<ReaderEntry>>> + Send + 'static,
    {
        Self::with_reader(name, Reader::new(reader))
    }

    /// Create a gauge backed by a synchronous reader.
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
}

#[async_trait]
impl Metric for Gauge {
    fn meta(&self) -> &MetricMeta {
        &self.inner.meta
    }

    fn kind(&self) -> MetricKind {
        MetricKind::Gauge
    }

    async fn render_body(&self) -> MetricsResult<String> {
        self.inner.render_body(MetricKind::Gauge).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MetricsError;
    use serde_json::json;

    #[tokio::test]
    async fn renders_all_entry_shapes() {
        let gauge = Gauge::from_fn("temperature", || {
            vec![
                ReaderEntry::Stamped(20.0, 1_600_000_000_000),
                ReaderEntry::Full(40.0, Labels::from([("region", "eu")]), 1_500_000_000_000),
            ]
        })
        .with_description("Room temperature");

        let text = gauge.stringify().await.unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                "# HELP temperature Room temperature",
                "# TYPE temperature gauge",
                "temperature 20 1600000000000",
                "temperature{region=\"eu\"} 40 1500000000000",
            ]
        );
    }

    #[tokio::test]
    async fn unstamped_entries_get_current_time() {
        let gauge = Gauge::from_fn("load", || {
            vec![
                ReaderEntry::Value(0.5),
                ReaderEntry::Labelled(30.0, Labels::from([("region", "us")])),
            ]
        });
        let body = gauge.render_body().await.unwrap();
        for line in body.lines() {
            let ts: i64 = line.rsplit(' ').next().unwrap().parse().unwrap();
            assert!(ts > 1_600_000_000_000, "missing timestamp in {line}");
        }
        assert!(body.starts_with("load 0.5 "));
        assert!(body.contains("load{region=\"us\"} 30 "));
    }

    #[tokio::test]
    async fn async_reader_parses_dynamic_output() {
        let gauge = Gauge::new("queue_depth", || async {
            let raw = json!([[7, {"queue": "mail"}, 100], [3, 200]]);
            let entries = raw
                .as_array()
                .into_iter()
                .flatten()
                .map(ReaderEntry::try_from)
                .collect::<Result<Vec<_>, _>>()?;
            Ok::<_, anyhow::Error>(entries)
        });

        let body = gauge.render_body().await.unwrap();
        assert_eq!(body, "queue_depth{queue=\"mail\"} 7 100\nqueue_depth 3 200\n");
    }

    #[tokio::test]
    async fn malformed_reader_output_fails_render() {
        let gauge = Gauge::new("broken", || async {
            let entry = ReaderEntry::try_from(json!([1, "oops"]))?;
            Ok::<_, anyhow::Error>(vec![entry])
        });
        let err = gauge.render_body().await.unwrap_err();
        assert!(err.to_string().contains("unexpected value format"));
        assert!(matches!(err, MetricsError::Reader(_)));
    }
}
