//! The render contract shared by every metric kind.

use std::fmt;

use async_trait::async_trait;

use crate::error::MetricsResult;
use crate::exposition::Format;
use crate::labels::{
    Labels, clean_name, escape_help, escape_openmetrics_help, format_value, label_string,
};

/// The five metric kinds of the exposition formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricKind {
    Counter,
    Gauge,
    Histogram,
    Summary,
    Untyped,
}

impl MetricKind {
    /// The keyword written on the `# TYPE` line, if any.
    pub fn type_keyword(&self) -> Option<&'static str> {
        match self {
            MetricKind::Counter => Some("counter"),
            MetricKind::Gauge => Some("gauge"),
            MetricKind::Histogram => Some("histogram"),
            MetricKind::Summary => Some("summary"),
            MetricKind::Untyped => None,
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_keyword().unwrap_or("untyped"))
    }
}

/// Identity shared by all metric kinds.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricMeta {
    name: String,
    description: Option<String>,
    labels: Labels,
}

impl MetricMeta {
    /// The name is sanitized here, once.
    pub fn new(name: &str) -> Self {
        Self {
            name: clean_name(name),
            description: None,
            labels: Labels::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Default labels merged into every sample.
    pub fn labels(&self) -> &Labels {
        &self.labels
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = Some(description.into());
    }

    pub fn set_labels(&mut self, labels: Labels) {
        self.labels = labels;
    }

    /// Header lines: `# HELP` when described, `# TYPE` unless untyped.
    ///
    /// OpenMetrics HELP text additionally escapes double quotes.
    pub fn header(&self, kind: MetricKind, format: Format) -> String {
        let mut out = String::new();
        if let Some(help) = &self.description {
            let help = match format {
                Format::Prometheus => escape_help(help),
                Format::OpenMetrics => escape_openmetrics_help(help),
            };
            out.push_str(&format!("# HELP {} {help}\n", self.name));
        }
        if let Some(keyword) = kind.type_keyword() {
            out.push_str(&format!("# TYPE {} {keyword}\n", self.name));
        }
        out
    }

    /// One sample line. `sample_labels` override the default labels.
    pub(crate) fn line(
        &self,
        suffix: &str,
        sample_labels: &Labels,
        value: f64,
        timestamp_ms: Option<i64>,
    ) -> String {
        let labels = label_string(&self.labels.merged(sample_labels));
        let value = format_value(value);
        match timestamp_ms {
            Some(ts) => format!("{}{suffix}{labels} {value} {ts}\n", self.name),
            None => format!("{}{suffix}{labels} {value}\n", self.name),
        }
    }
}

/// A metric that can render itself into exposition text.
///
/// Rendering is asynchronous because reader-driven kinds may await their
/// reader. Every line of the output is terminated by a line feed.
#[async_trait]
pub trait Metric: Send + Sync {
    fn meta(&self) -> &MetricMeta;

    fn kind(&self) -> MetricKind;

    fn name(&self) -> &str {
        self.meta().name()
    }

    fn render_header(&self, format: Format) -> String {
        self.meta().header(self.kind(), format)
    }

    async fn render_body(&self) -> MetricsResult<String>;

    /// Header followed by body, in the Prometheus text format.
    async fn stringify(&self) -> MetricsResult<String> {
        self.stringify_as(Format::Prometheus).await
    }

    /// Header followed by body, in the given format.
    async fn stringify_as(&self, format: Format) -> MetricsResult<String> {
        let body = self.render_body().await?;
        Ok(self.render_header(format) + &body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_is_sanitized() {
        let meta = MetricMeta::new("http-requests/total (all)");
        assert_eq!(meta.name(), "httprequests_total_all");
    }

    #[test]
    fn header_with_help_and_type() {
        let mut meta = MetricMeta::new("jobs_total");
        meta.set_description("Jobs processed");
        assert_eq!(
            meta.header(MetricKind::Counter, Format::Prometheus),
            "# HELP jobs_total Jobs processed\n# TYPE jobs_total counter\n"
        );
    }

    #[test]
    fn help_quotes_escaped_only_for_openmetrics() {
        let mut meta = MetricMeta::new("greeting");
        meta.set_description("say \"hi\"");
        assert_eq!(
            meta.header(MetricKind::Gauge, Format::Prometheus),
            "# HELP greeting say \"hi\"\n# TYPE greeting gauge\n"
        );
        assert_eq!(
            meta.header(MetricKind::Gauge, Format::OpenMetrics),
            "# HELP greeting say \\\"hi\\\"\n# TYPE greeting gauge\n"
        );
    }

    #[test]
    fn header_without_help() {
        let meta = MetricMeta::new("queue_depth");
        assert_eq!(
            meta.header(MetricKind::Gauge, Format::Prometheus),
            "# TYPE queue_depth gauge\n"
        );
    }

    #[test]
    fn untyped_header_has_no_type_line() {
        let mut meta = MetricMeta::new("legacy");
        meta.set_description("Legacy value");
        assert_eq!(
            meta.header(MetricKind::Untyped, Format::Prometheus),
            "# HELP legacy Legacy value\n"
        );
        assert_eq!(MetricKind::Untyped.to_string(), "untyped");
    }

    #[test]
    fn line_merges_default_labels() {
        let mut meta = MetricMeta::new("temp");
        meta.set_labels(Labels::from([("site", "a"), ("unit", "c")]));
        let line = meta.line("", &Labels::from([("unit", "f")]), 71.5, Some(1000));
        assert_eq!(line, "temp{site=\"a\",unit=\"f\"} 71.5 1000\n");
    }

    #[test]
    fn line_without_labels_or_timestamp() {
        let meta = MetricMeta::new("latency");
        assert_eq!(meta.line("_sum", &Labels::new(), 1.5, None), "latency_sum 1.5\n");
    }
}
