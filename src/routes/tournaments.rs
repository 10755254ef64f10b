use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use axum_valid::Valid;

use crate::{
    dao::models::RowId,
    dto::tournament::{
        FreshQuery, StageSummary, StagesQuery, TourSummary, TournamentSummary, ToursQuery,
    },
    error::AppError,
    services::tournament_service,
    state::SharedState,
};

/// Tournament structure endpoints.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/tournaments", get(list_tournaments))
        .route("/tournaments/{id}", get(get_tournament))
        .route("/stages", get(list_stages))
        .route("/tours", get(list_tours))
}

#[utoipa::path(
    get,
    path = "/tournaments",
    tag = "tournaments",
    params(FreshQuery),
    responses((status = 200, description = "Every tournament", body = [TournamentSummary]))
)]
/// List every tournament.
pub async fn list_tournaments(
    State(state): State<SharedState>,
    Valid(Query(query)): Valid<Query<FreshQuery>>,
) -> Json<Vec<TournamentSummary>> {
    Json(tournament_service::list_tournaments(&state, query.fresh).await)
}

#[utoipa::path(
    get,
    path = "/tournaments/{id}",
    tag = "tournaments",
    params(("id" = u64, Path, description = "Tournament row id"), FreshQuery),
    responses(
        (status = 200, description = "Tournament", body = TournamentSummary),
        (status = 404, description = "No such tournament"),
        (status = 503, description = "Row store unavailable")
    )
)]
/// Fetch one tournament.
pub async fn get_tournament(
    State(state): State<SharedState>,
    Path(id): Path<RowId>,
    Valid(Query(query)): Valid<Query<FreshQuery>>,
) -> Result<Json<TournamentSummary>, AppError> {
    let tournament = tournament_service::get_tournament(&state, id, query.fresh).await?;
    Ok(Json(tournament))
}

#[utoipa::path(
    get,
    path = "/stages",
    tag = "tournaments",
    params(StagesQuery),
    responses((status = 200, description = "Stages ordered by position", body = [StageSummary]))
)]
/// List stages, optionally of one tournament.
pub async fn list_stages(
    State(state): State<SharedState>,
    Valid(Query(query)): Valid<Query<StagesQuery>>,
) -> Json<Vec<StageSummary>> {
    Json(tournament_service::list_stages(&state, query.tournament_id, query.fresh).await)
}

#[utoipa::path(
    get,
    path = "/tours",
    tag = "tournaments",
    params(ToursQuery),
    responses((status = 200, description = "Tours ordered by number", body = [TourSummary]))
)]
/// List tours, optionally of one stage.
pub async fn list_tours(
    State(state): State<SharedState>,
    Valid(Query(query)): Valid<Query<ToursQuery>>,
) -> Json<Vec<TourSummary>> {
    Json(tournament_service::list_tours(&state, query.stage_id, query.fresh).await)
}
