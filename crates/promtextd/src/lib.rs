//! promtextd — serves promtext metrics over HTTP.
//!
//! Thin glue around the `promtext` core: loads the TOML config, owns the
//! metric set behind a mutex, negotiates the exposition format per
//! request, and refreshes stateful metrics on an interval.
//!
//! # Routes
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | GET | `/metrics` | Prometheus or OpenMetrics text, by `Accept` header |
//! | GET | `/healthz` | Liveness probe |

pub mod config;
pub mod metrics;
pub mod server;
pub mod updater;

pub use config::ExporterConfig;
pub use metrics::ExporterMetrics;
pub use server::{AppState, build_router};
