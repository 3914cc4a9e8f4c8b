//! Background update loop.
//!
//! Periodically refreshes the stateful metrics that are not driven by a
//! reader. Runs until the shutdown channel flips.

use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, info};

use crate::server::AppState;

/// Run the update loop until shutdown signal.
pub async fn run(state: AppState, interval: Duration, mut shutdown: watch::Receiver<bool>) {
    info!(interval_secs = interval.as_secs(), "metrics updater started");

    state.metrics.lock().await.mark_update();

    loop {
        tokio::select! {
            _ = tokio::time::sleep(interval) => {
                state.metrics.lock().await.mark_update();
                debug!("metrics updated");
            }
            _ = shutdown.changed() => {
                info!("metrics updater shutting down");
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExporterConfig;
    use crate::metrics::ExporterMetrics;

    #[tokio::test]
    async fn stops_on_shutdown() {
        let state = AppState::new(ExporterMetrics::new(&ExporterConfig::default()).unwrap());
        let (tx, rx) = watch::channel(false);

        let handle = tokio::spawn(run(state.clone(), Duration::from_secs(3600), rx));
        tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("updater did not stop")
            .unwrap();

        let (updated_at, _) = state.metrics.lock().await.last_update();
        assert!(updated_at > 1_600_000_000.0);
    }
}
