//! promtext — typed metrics with Prometheus and OpenMetrics text exposition.
//!
//! Callers own their metrics: reader-driven counters and gauges compute
//! samples on demand, while histograms, summaries and untyped values keep
//! state mutated through `&mut self`. The exposition encoder borrows any
//! number of them and renders one document.
//!
//! # Architecture
//!
//! ```text
//! Metric (trait)
//!   ├── Counter / Gauge  ← Reader callback, normalized via ReaderEntry → Sample
//!   ├── Histogram        ← observe() into cumulative buckets
//!   ├── Summary          ← observe() through caller-supplied calculate()
//!   └── Untyped          ← set() / get()
//!
//! exposition::concat(format, &[&dyn Metric])
//!   └── Prometheus text, or OpenMetrics with `# EOF` framing
//! ```

pub mod counter;
pub mod error;
pub mod exposition;
pub mod gauge;
pub mod histogram;
pub mod labels;
pub mod metric;
pub mod reader;
pub mod sample;
pub mod summary;
pub mod untyped;

pub use counter::Counter;
pub use error::{MetricsError, MetricsResult};
pub use exposition::{Format, concat};
pub use gauge::Gauge;
pub use histogram::{Histogram, exponential_buckets, linear_buckets};
pub use labels::{Labels, clean_name, label_string};
pub use metric::{Metric, MetricKind, MetricMeta};
pub use reader::Reader;
pub use sample::{ReaderEntry, Sample};
pub use summary::Summary;
pub use untyped::{Untyped, UntypedValue};
