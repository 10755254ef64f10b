use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, put},
};
use axum_valid::Valid;

use crate::{
    dao::models::RowId,
    dto::matches::{MatchSummary, MatchesQuery, UpdateStatusRequest},
    error::AppError,
    services::match_service,
    state::SharedState,
};

/// Match schedule endpoints.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/matches", get(list_matches))
        .route("/matches/{id}/status", put(update_match_status))
}

#[utoipa::path(
    get,
    path = "/matches",
    tag = "matches",
    params(MatchesQuery),
    responses(
        (status = 200, description = "Matching matches ordered by kick-off", body = [MatchSummary]),
        (status = 400, description = "Invalid filter")
    )
)]
/// List matches with optional filters.
pub async fn list_matches(
    State(state): State<SharedState>,
    Valid(Query(query)): Valid<Query<MatchesQuery>>,
) -> Json<Vec<MatchSummary>> {
    Json(match_service::list_matches(&state, &query).await)
}

#[utoipa::path(
    put,
    path = "/matches/{id}/status",
    tag = "matches",
    params(("id" = u64, Path, description = "Match row id")),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Match as stored after the update", body = MatchSummary),
        (status = 404, description = "No such match"),
        (status = 503, description = "Row store unavailable; the change was reverted")
    )
)]
/// Change the status of a match.
pub async fn update_match_status(
    State(state): State<SharedState>,
    Path(id): Path<RowId>,
    Json(body): Json<UpdateStatusRequest>,
) -> Result<Json<MatchSummary>, AppError> {
    let updated = match_service::update_match_status(&state, id, body.status).await?;
    Ok(Json(updated))
}
