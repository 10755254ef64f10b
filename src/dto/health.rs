use serde::Serialize;
use utoipa::ToSchema;

/// Health payload returned by the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// "ok" when the row store answered, "degraded" otherwise.
    pub status: String,
    /// Collections currently served from the snapshot cache.
    pub cached_collections: Vec<String>,
}

impl HealthResponse {
    /// The row store answered its health probe.
    pub fn ok(cached_collections: Vec<String>) -> Self {
        Self {
            status: "ok".to_string(),
            cached_collections,
        }
    }

    /// The row store could not be reached; cached data may still be served.
    pub fn degraded(cached_collections: Vec<String>) -> Self {
        Self {
            status: "degraded".to_string(),
            cached_collections,
        }
    }
}
