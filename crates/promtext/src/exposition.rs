//! Text exposition: joining rendered metrics into one document.
//!
//! Both formats come from the same rendered fragments. OpenMetrics adds
//! its framing on top: no blank lines, no trailing whitespace, and a
//! single `# EOF` terminator.
//!
//! # Example Output
//!
//! ```text
//! # HELP http_request_duration_seconds HTTP request duration in seconds
//! # TYPE http_request_duration_seconds histogram
//! http_request_duration_seconds_bucket{method="GET",le="0.1"} 10
//! http_request_duration_seconds_bucket{method="GET",le="+Inf"} 42
//! http_request_duration_seconds_sum{method="GET"} 12.345
//! http_request_duration_seconds_count{method="GET"} 42
//! # EOF
//! ```

use futures_util::future::try_join_all;
use tracing::debug;

use crate::error::MetricsResult;
use crate::metric::Metric;

/// Content type of the Prometheus text format.
pub const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Content type of the OpenMetrics text format.
pub const OPENMETRICS_CONTENT_TYPE: &str =
    "application/openmetrics-text; version=1.0.0; charset=utf-8";

/// OpenMetrics document terminator.
pub const EOF_MARKER: &str = "# EOF";

/// Output framing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Format {
    #[default]
    Prometheus,
    OpenMetrics,
}

impl Format {
    pub fn content_type(&self) -> &'static str {
        match self {
            Format::Prometheus => PROMETHEUS_CONTENT_TYPE,
            Format::OpenMetrics => OPENMETRICS_CONTENT_TYPE,
        }
    }

    /// Pick the format a scraper asked for in its `Accept` header.
    ///
    /// OpenMetrics wins when it is offered with a non-zero weight at least
    /// as high as any other media range; everything else gets Prometheus.
    pub fn from_accept(accept: Option<&str>) -> Self {
        let Some(header) = accept else {
            return Format::Prometheus;
        };

        let mut openmetrics = 0.0_f64;
        let mut other = 0.0_f64;
        for range in header.split(',') {
            let mut parts = range.split(';');
            let media = parts.next().unwrap_or_default().trim();
            if media.is_empty() {
                continue;
            }
            let weight = parts
                .filter_map(|p| p.trim().strip_prefix("q="))
                .find_map(|q| q.trim().parse::<f64>().ok())
                .unwrap_or(1.0);
            if media.eq_ignore_ascii_case("application/openmetrics-text") {
                openmetrics = openmetrics.max(weight);
            } else {
                other = other.max(weight);
            }
        }

        if openmetrics > 0.0 && openmetrics >= other {
            Format::OpenMetrics
        } else {
            Format::Prometheus
        }
    }
}

/// Render every metric and join them into one document.
///
/// Renders run concurrently; the output keeps the order of `metrics`.
/// The first failing render fails the whole document.
pub async fn concat(format: Format, metrics: &[&dyn Metric]) -> MetricsResult<String> {
    let rendered = try_join_all(metrics.iter().map(|m| m.stringify_as(format))).await?;
    debug!(metrics = rendered.len(), ?format, "metrics rendered");

    Ok(match format {
        Format::Prometheus => rendered.join("\n"),
        Format::OpenMetrics => {
            let fragments: Vec<&str> = rendered
                .iter()
                .map(|r| r.trim_end())
                .filter(|r| !r.is_empty())
                .collect();
            let mut out = fragments.join("\n").trim_end().to_string();
            out.push('\n');
            out.push_str(EOF_MARKER);
            out
        }
    })
}
