//! The metric set served by promtextd.
//!
//! Built-in metrics describe the exporter itself (scrapes, uptime, scrape
//! latency, last background update); static metrics come from the config
//! file. The set is owned by the server and guarded by its mutex.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use promtext::{
    Counter, Format, Gauge, Histogram, Metric, MetricsResult, ReaderEntry, Summary,
    Untyped, concat, exponential_buckets,
};
use tracing::{debug, warn};

use crate::config::{ExporterConfig, StaticKind, StaticMetricConfig};

/// Quantiles reported for scrape latency.
pub const SCRAPE_QUANTILES: &[f64] = &[0.5, 0.9, 0.99];

/// Number of recent scrapes the latency quantiles are computed over.
const WINDOW_CAPACITY: usize = 512;

/// Bounded window of recent latency samples (seconds).
#[derive(Debug)]
pub struct LatencyWindow {
    samples: Mutex<VecDeque<f64>>,
    capacity: usize,
}

impl LatencyWindow {
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    pub fn push(&self, value: f64) {
        let mut samples = self.samples.lock().unwrap_or_else(|e| e.into_inner());
        if samples.len() == self.capacity {
            samples.pop_front();
        }
        samples.push_back(value);
    }

    /// Nearest-rank quantile of the window. Returns 0.0 when empty.
    pub fn quantile(&self, q: f64) -> f64 {
        let samples = self.samples.lock().unwrap_or_else(|e| e.into_inner());
        if samples.is_empty() {
            return 0.0;
        }

        let mut sorted: Vec<f64> = samples.iter().copied().collect();
        sorted.sort_by(f64::total_cmp);

        let rank = (sorted.len() as f64 * q).ceil() as usize;
        sorted[rank.clamp(1, sorted.len()) - 1]
    }
}

/// Everything `/metrics` renders.
pub struct ExporterMetrics {
    scrapes: Arc<AtomicU64>,
    scrapes_total: Counter,
    uptime: Gauge,
    scrape_seconds: Histogram,
    scrape_quantiles: Summary,
    window: Arc<LatencyWindow>,
    last_update: Untyped,
    statics: Vec<Box<dyn Metric>>,
}

impl ExporterMetrics {
    pub fn new(config: &ExporterConfig) -> anyhow::Result<Self> {
        let labels = config.labels.clone();

        let scrapes = Arc::new(AtomicU64::new(0));
        let reader_scrapes = scrapes.clone();
        let scrapes_total = Counter::from_fn("promtextd_scrapes_total", move || {
            vec![ReaderEntry::Value(
                reader_scrapes.load(Ordering::Relaxed) as f64,
            )]
        })
        .with_description("Scrapes served by this exporter")
        .with_labels(labels.clone());

        let started = Instant::now();
        let uptime = Gauge::from_fn("promtextd_uptime_seconds", move || {
            vec![ReaderEntry::Value(started.elapsed().as_secs_f64())]
        })
        .with_description("Seconds since the exporter started")
        .with_labels(labels.clone());

        let scrape_seconds = Histogram::new(
            "promtextd_scrape_duration_seconds",
            &exponential_buckets(0.0005, 2.0, 12),
        )?
        .with_description("Time spent rendering /metrics")
        .with_labels(labels.clone());

        let window = Arc::new(LatencyWindow::new(WINDOW_CAPACITY));
        let estimator = window.clone();
        let scrape_quantiles = Summary::new(
            "promtextd_scrape_latency_seconds",
            SCRAPE_QUANTILES,
            move |_value, q| estimator.quantile(q),
        )?
        .with_description("Scrape latency over the most recent scrapes")
        .with_labels(labels.clone());

        let last_update = Untyped::new("promtextd_last_update")
            .with_description("Unix time of the last background update")
            .with_labels(labels);

        let statics = config
            .metrics
            .iter()
            .map(static_metric)
            .collect::<anyhow::Result<Vec<_>>>()?;

        debug!(statics = statics.len(), "exporter metrics built");

        Ok(Self {
            scrapes,
            scrapes_total,
            uptime,
            scrape_seconds,
            scrape_quantiles,
            window,
            last_update,
            statics,
        })
    }

    /// Count a scrape. Called before rendering so a scrape sees itself.
    pub fn begin_scrape(&self) {
        self.scrapes.fetch_add(1, Ordering::Relaxed);
    }

    /// Record how long a scrape took to render.
    pub fn record_scrape(&mut self, elapsed: Duration) {
        let secs = elapsed.as_secs_f64();
        self.window.push(secs);
        if let Err(e) = self.scrape_seconds.observe(secs) {
            warn!(error = %e, "scrape duration not recorded");
        }
        if let Err(e) = self.scrape_quantiles.observe(secs) {
            warn!(error = %e, "scrape latency not recorded");
        }
    }

    /// Stamp the last background update with the current time.
    pub fn mark_update(&mut self) {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs_f64();
        self.last_update.set(now.floor());
    }

    /// `(unix seconds, timestamp in milliseconds)` of the last update.
    pub fn last_update(&self) -> (f64, i64) {
        self.last_update.get()
    }

    pub fn scrapes(&self) -> u64 {
        self.scrapes.load(Ordering::Relaxed)
    }

    /// Every metric, built-ins first, in render order.
    pub fn all(&self) -> Vec<&dyn Metric> {
        let mut all: Vec<&dyn Metric> = vec![
            &self.scrapes_total as &dyn Metric,
            &self.uptime as &dyn Metric,
            &self.scrape_seconds as &dyn Metric,
            &self.scrape_quantiles as &dyn Metric,
            &self.last_update as &dyn Metric,
        ];
        all.extend(self.statics.iter().map(|m| m.as_ref()));
        all
    }

    pub async fn render(&self, format: Format) -> MetricsResult<String> {
        concat(format, &self.all()).await
    }
}

fn static_metric(config: &StaticMetricConfig) -> anyhow::Result<Box<dyn Metric>> {
    let entries = config.entries()?;
    let reader = move || entries.clone();

    let metric: Box<dyn Metric> = match config.kind {
        StaticKind::Counter => {
            let mut counter =
                Counter::from_fn(&config.name, reader).with_labels(config.labels.clone());
            if let Some(description) = &config.description {
                counter = counter.with_description(description);
            }
            Box::new(counter)
        }
        StaticKind::Gauge => {
            let mut gauge =
                Gauge::from_fn(&config.name, reader).with_labels(config.labels.clone());
            if let Some(description) = &config.description {
                gauge = gauge.with_description(description);
            }
            Box::new(gauge)
        }
    };
    Ok(metric)
}
