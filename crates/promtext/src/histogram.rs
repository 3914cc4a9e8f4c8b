//! Cumulative-bucket histogram.
//!
//! Buckets follow "less or equal" semantics: an observation is counted in
//! every bucket whose upper bound is at least the observed value. A `+Inf`
//! bucket is always present, so its count equals the total count.

use async_trait::async_trait;
use tracing::debug;

use crate::error::{MetricsError, MetricsResult};
use crate::labels::{Labels, format_value};
use crate::metric::{Metric, MetricKind, MetricMeta};

/// A histogram accumulating observations into fixed buckets.
#[derive(Debug, Clone)]
pub struct Histogram {
    meta: MetricMeta,
    /// Ascending upper bounds, last one is `+Inf`.
    buckets: Vec<f64>,
    /// Cumulative count per bound, parallel to `buckets`.
    counts: Vec<u64>,
    sum: f64,
    count: u64,
}

impl Histogram {
    /// Create a histogram with the given upper bounds.
    ///
    /// Bounds are sorted, duplicates are dropped and `+Inf` is appended.
    /// A NaN bound is rejected.
    pub fn new(name: &str, buckets: &[f64]) -> MetricsResult<Self> {
        if let Some(&bad) = buckets.iter().find(|b| b.is_nan()) {
            return Err(MetricsError::InvalidBucket(bad));
        }

        let mut bounds: Vec<f64> = buckets
            .iter()
            .copied()
            .filter(|b| *b != f64::INFINITY)
            .collect();
        bounds.sort_by(f64::total_cmp);
        bounds.dedup();
        bounds.push(f64::INFINITY);

        Ok(Self {
            meta: MetricMeta::new(name),
            counts: vec![0; bounds.len()],
            buckets: bounds,
            sum: 0.0,
            count: 0,
        })
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.meta.set_description(description);
        self
    }

    pub fn with_labels(mut self, labels: Labels) -> Self {
        self.meta.set_labels(labels);
        self
    }

    /// Record one observation. Non-finite values are rejected and leave
    /// the histogram unchanged.
    pub fn observe(&mut self, value: f64) -> MetricsResult<()> {
        if !value.is_finite() {
            return Err(MetricsError::InvalidHistogramValue(value));
        }

        self.sum += value;
        self.count += 1;
        for (bound, count) in self.buckets.iter().zip(self.counts.iter_mut()) {
            if value <= *bound {
                *count += 1;
            }
        }
        Ok(())
    }

    /// Alias of [`Histogram::observe`].
    pub fn push(&mut self, value: f64) -> MetricsResult<()> {
        self.observe(value)
    }

    /// Zero every count, the sum and the total. Bounds are kept.
    pub fn reset(&mut self) {
        self.counts.iter_mut().for_each(|c| *c = 0);
        self.sum = 0.0;
        self.count = 0;
        debug!(metric = %self.meta.name(), "histogram reset");
    }

    /// Upper bounds, ascending, ending with `+Inf`.
    pub fn buckets(&self) -> &[f64] {
        &self.buckets
    }

    /// `(upper bound, cumulative count)` pairs, ascending.
    pub fn bucket_counts(&self) -> impl Iterator<Item = (f64, u64)> + '_ {
        self.buckets.iter().copied().zip(self.counts.iter().copied())
    }

    pub fn sum(&self) -> f64 {
        self.sum
    }

    pub fn count(&self) -> u64 {
        self.count
    }
}

#[async_trait]
impl Metric for Histogram {
    fn meta(&self) -> &MetricMeta {
        &self.meta
    }

    fn kind(&self) -> MetricKind {
        MetricKind::Histogram
    }

    async fn render_body(&self) -> MetricsResult<String> {
        let mut out = String::new();
        for (bound, count) in self.bucket_counts() {
            let le = Labels::new().with("le", format_value(bound));
            out.push_str(&self.meta.line("_bucket", &le, count as f64, None));
        }
        out.push_str(&self.meta.line("_sum", &Labels::new(), self.sum, None));
        out.push_str(&self.meta.line("_count", &Labels::new(), self.count as f64, None));
        Ok(out)
    }
}

/// `count` bounds starting at `start`, each `width` apart.
pub fn linear_buckets(start: f64, width: f64, count: usize) -> Vec<f64> {
    (0..count).map(|i| start + width * i as f64).collect()
}

/// `count` bounds starting at `start`, each `factor` times the previous.
pub fn exponential_buckets(start: f64, factor: f64, count: usize) -> Vec<f64> {
    std::iter::successors(Some(start), |b| Some(b * factor))
        .take(count)
        .collect()
}
