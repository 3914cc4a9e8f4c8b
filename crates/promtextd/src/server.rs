//! HTTP routes: `/metrics` with format negotiation, `/healthz`.

use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use axum::extract::State;
use axum::http::header::{ACCEPT, CONTENT_TYPE};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use promtext::Format;
use tokio::sync::Mutex;
use tracing::{debug, error};

use crate::metrics::ExporterMetrics;

/// Shared state for handlers and the update loop.
#[derive(Clone)]
pub struct AppState {
    pub metrics: Arc<Mutex<ExporterMetrics>>,
}

impl AppState {
    pub fn new(metrics: ExporterMetrics) -> Self {
        Self {
            metrics: Arc::new(Mutex::new(metrics)),
        }
    }
}

/// Build the exporter router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .route("/healthz", get(healthz))
        .with_state(state)
}

/// GET /metrics
pub async fn metrics_handler(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let format = Format::from_accept(headers.get(ACCEPT).and_then(|v| v.to_str().ok()));
    let started = Instant::now();

    let mut metrics = state.metrics.lock().await;
    metrics.begin_scrape();

    match metrics.render(format).await {
        Ok(body) => {
            let elapsed = started.elapsed();
            metrics.record_scrape(elapsed);
            debug!(?format, bytes = body.len(), ?elapsed, "scrape served");
            (
                StatusCode::OK,
                [(CONTENT_TYPE, format.content_type())],
                body,
            )
                .into_response()
        }
        Err(e) => {
            error!(error = %e, "metrics render failed");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

/// GET /healthz
pub async fn healthz() -> &'static str {
    "ok"
}
