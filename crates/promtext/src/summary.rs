//! Summary with caller-supplied quantile estimation.
//!
//! The summary keeps the estimate table, the running sum and the count.
//! How an estimate evolves is entirely up to the `calculate` callback,
//! which receives each observation once per configured quantile.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::error::{MetricsError, MetricsResult};
use crate::labels::{Labels, format_value};
use crate::metric::{Metric, MetricKind, MetricMeta};

/// Estimation callback: `(observed value, quantile) -> new estimate`.
pub type Calculate = Arc<dyn Fn(f64, f64) -> f64 + Send + Sync>;

/// A summary reporting caller-estimated quantiles.
#[derive(Clone)]
pub struct Summary {
    meta: MetricMeta,
    /// `(quantile, estimate)` sorted by quantile.
    quantiles: Vec<(f64, f64)>,
    calculate: Calculate,
    sum: f64,
    count: u64,
}

impl Summary {
    /// Create a summary tracking `quantiles`.
    ///
    /// Fails when no quantile is given or one lies outside `(0, 1)`.
    /// Duplicate quantiles are collapsed.
    pub fn new<F>(name: &str, quantiles: &[f64], calculate: F) -> MetricsResult<Self>
    where
        F: Fn(f64, f64) -> f64 + Send + Sync + 'static,
    {
        if quantiles.is_empty() {
            return Err(MetricsError::NoQuantiles);
        }
        if let Some(&bad) = quantiles.iter().find(|q| !(**q > 0.0 && **q < 1.0)) {
            return Err(MetricsError::InvalidQuantile(bad));
        }

        let mut sorted = quantiles.to_vec();
        sorted.sort_by(f64::total_cmp);
        sorted.dedup();

        Ok(Self {
            meta: MetricMeta::new(name),
            quantiles: sorted.into_iter().map(|q| (q, 0.0)).collect(),
            calculate: Arc::new(calculate),
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
    /// the summary unchanged.
    pub fn observe(&mut self, value: f64) -> MetricsResult<()> {
        if !value.is_finite() {
            return Err(MetricsError::InvalidSummaryValue(value));
        }

        self.sum += value;
        self.count += 1;
        for (q, estimate) in self.quantiles.iter_mut() {
            *estimate = (self.calculate)(value, *q);
        }
        Ok(())
    }

    /// Alias of [`Summary::observe`].
    pub fn push(&mut self, value: f64) -> MetricsResult<()> {
        self.observe(value)
    }

    /// Zero every estimate, the sum and the count.
    pub fn reset(&mut self) {
        self.quantiles.iter_mut().for_each(|(_, e)| *e = 0.0);
        self.sum = 0.0;
        self.count = 0;
        debug!(metric = %self.meta.name(), "summary reset");
    }

    /// Configured quantiles, ascending.
    pub fn quantiles(&self) -> impl Iterator<Item = f64> + '_ {
        self.quantiles.iter().map(|(q, _)| *q)
    }

    /// Current estimate for `quantile`, if configured.
    pub fn estimate(&self, quantile: f64) -> Option<f64> {
        self.quantiles
            .iter()
            .find(|(q, _)| *q == quantile)
            .map(|(_, e)| *e)
    }

    pub fn sum(&self) -> f64 {
        self.sum
    }

    pub fn count(&self) -> u64 {
        self.count
    }
}

impl fmt::Debug for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Summary")
            .field("meta", &self.meta)
            .field("quantiles", &self.quantiles)
            .field("sum", &self.sum)
            .field("count", &self.count)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Metric for Summary {
    fn meta(&self) -> &MetricMeta {
        &self.meta
    }

    fn kind(&self) -> MetricKind {
        MetricKind::Summary
    }

    async fn render_body(&self) -> MetricsResult<String> {
        let mut out = String::new();
        for (q, estimate) in &self.quantiles {
            let quantile = Labels::new().with("quantile", format_value(*q));
            out.push_str(&self.meta.line("", &quantile, *estimate, None));
        }
        out.push_str(&self.meta.line("_sum", &Labels::new(), self.sum, None));
        out.push_str(&self.meta.line("_count", &Labels::new(), self.count as f64, None));
        Ok(out)
    }
}
