use tracing::warn;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Probe the row store and report which collections are served from cache.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    let mut cached: Vec<String> = state
        .collections()
        .fresh_keys()
        .into_iter()
        .map(|collection| collection.to_string())
        .collect();
    cached.sort();

    match state.store().health_check().await {
        Ok(()) => HealthResponse::ok(cached),
        Err(err) => {
            warn!(error = %err, "row store health check failed");
            HealthResponse::degraded(cached)
        }
    }
}
