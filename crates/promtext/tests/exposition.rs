//! End-to-end exposition tests.
//!
//! Builds one metric of every kind, drives them the way an application
//! would, and checks the documents produced in both formats.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use promtext::{
    Counter, Format, Gauge, Histogram, Labels, Metric, MetricsError, ReaderEntry, Summary,
    Untyped, concat,
};

struct AppMetrics {
    requests: Counter,
    temperature: Gauge,
    latency: Histogram,
    payload: Summary,
    build: Untyped,
}

impl AppMetrics {
    fn new(served: Arc<AtomicU64>) -> Self {
        let requests = Counter::from_fn("http-requests/total", move || {
            vec![ReaderEntry::Full(
                served.load(Ordering::Relaxed) as f64,
                Labels::from([("code", "200")]),
                1_700_000_000_000,
            )]
        })
        .with_description("Requests served")
        .with_labels(Labels::from([("app", "shop"), ("code", "000")]));

        let temperature = Gauge::from_fn("room temperature", || {
            vec![
                ReaderEntry::Stamped(20.0, 1_600_000_000_000),
                ReaderEntry::Full(40.0, Labels::from([("region", "eu")]), 1_500_000_000_000),
            ]
        });

        let latency = Histogram::new("latency_ms", &[100.0, 10.0, 50.0])
            .unwrap()
            .with_description("Request latency");

        // Keeps the largest value seen, whatever the quantile.
        let max_seen = Arc::new(std::sync::Mutex::new(f64::MIN));
        let payload = Summary::new("payload_bytes", &[0.9, 0.5], move |v, _q| {
            let mut max = max_seen.lock().unwrap();
            let current = (*max).max(v);
            *max = current;
            current
        })
        .unwrap();

        let build = Untyped::new("build_timestamp").with_value((1.0, 1_234));

        Self {
            requests,
            temperature,
            latency,
            payload,
            build,
        }
    }

    fn all(&self) -> Vec<&dyn Metric> {
        vec![
            &self.requests as &dyn Metric,
            &self.temperature as &dyn Metric,
            &self.latency as &dyn Metric,
            &self.payload as &dyn Metric,
            &self.build as &dyn Metric,
        ]
    }
}

#[tokio::test]
async fn prometheus_document() {
    let served = Arc::new(AtomicU64::new(0));
    let mut metrics = AppMetrics::new(served.clone());

    served.fetch_add(12, Ordering::Relaxed);
    for v in [30.0, 80.0, 120.0] {
        metrics.latency.observe(v).unwrap();
    }
    metrics.payload.observe(512.0).unwrap();
    metrics.payload.observe(256.0).unwrap();

    let text = concat(Format::Prometheus, &metrics.all()).await.unwrap();
    let expected = "\
# HELP httprequests_total Requests served
# TYPE httprequests_total counter
httprequests_total{app=\"shop\",code=\"200\"} 12 1700000000000

# TYPE room_temperature gauge
room_temperature 20 1600000000000
room_temperature{region=\"eu\"} 40 1500000000000

# HELP latency_ms Request latency
# TYPE latency_ms histogram
latency_ms_bucket{le=\"10\"} 0
latency_ms_bucket{le=\"50\"} 1
latency_ms_bucket{le=\"100\"} 2
latency_ms_bucket{le=\"+Inf\"} 3
latency_ms_sum 230
latency_ms_count 3

# TYPE payload_bytes summary
payload_bytes{quantile=\"0.5\"} 512
payload_bytes{quantile=\"0.9\"} 512
payload_bytes_sum 768
payload_bytes_count 2

build_timestamp 1 1234
";
    assert_eq!(text, expected);
}

#[tokio::test]
async fn openmetrics_document_framing() {
    let served = Arc::new(AtomicU64::new(3));
    let metrics = AppMetrics::new(served);

    let text = concat(Format::OpenMetrics, &metrics.all()).await.unwrap();
    assert!(text.ends_with("\nbuild_timestamp 1 1234\n# EOF"));
    assert_eq!(text.matches("# EOF").count(), 1);
    assert!(!text.contains("\n\n"));

    let body = text.strip_suffix("# EOF").unwrap();
    assert!(body.ends_with('\n'));
    assert!(!body[..body.len() - 1].ends_with(char::is_whitespace));
}

#[tokio::test]
async fn state_persists_across_renders() {
    let served = Arc::new(AtomicU64::new(0));
    let mut metrics = AppMetrics::new(served.clone());

    metrics.latency.observe(5.0).unwrap();
    let first = metrics.latency.stringify().await.unwrap();
    let second = metrics.latency.stringify().await.unwrap();
    assert_eq!(first, second);

    served.store(7, Ordering::Relaxed);
    let counter = metrics.requests.stringify().await.unwrap();
    assert!(counter.contains("} 7 "));
}

#[tokio::test]
async fn invalid_observations_leave_document_unchanged() {
    let served = Arc::new(AtomicU64::new(0));
    let mut metrics = AppMetrics::new(served);
    metrics.latency.observe(30.0).unwrap();
    metrics.payload.observe(1.0).unwrap();

    let before = concat(Format::Prometheus, &metrics.all()).await.unwrap();

    assert!(matches!(
        metrics.latency.observe(f64::NAN),
        Err(MetricsError::InvalidHistogramValue(_))
    ));
    assert!(matches!(
        metrics.payload.observe(f64::NAN),
        Err(MetricsError::InvalidSummaryValue(_))
    ));

    let after = concat(Format::Prometheus, &metrics.all()).await.unwrap();
    assert_eq!(before, after);
}

#[test]
fn summary_without_quantiles_fails() {
    let err = Summary::new("empty", &[], |v, _| v).unwrap_err();
    assert!(matches!(err, MetricsError::NoQuantiles));
}
