use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};
use axum_valid::Valid;

use crate::{
    dto::team::{CaptainSummary, CaptainsQuery, TeamSummary, TeamsQuery},
    services::team_service,
    state::SharedState,
};

/// Team and captain listings.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/teams", get(list_teams))
        .route("/captains", get(list_captains))
}

#[utoipa::path(
    get,
    path = "/teams",
    tag = "teams",
    params(TeamsQuery),
    responses(
        (status = 200, description = "Matching teams sorted by name", body = [TeamSummary]),
        (status = 400, description = "Invalid filter")
    )
)]
/// List teams, filtered by tournament and name.
pub async fn list_teams(
    State(state): State<SharedState>,
    Valid(Query(query)): Valid<Query<TeamsQuery>>,
) -> Json<Vec<TeamSummary>> {
    let teams =
        team_service::list_teams(&state, query.tournament_id, query.search.as_deref(), query.fresh)
            .await;
    Json(teams)
}

#[utoipa::path(
    get,
    path = "/captains",
    tag = "teams",
    params(CaptainsQuery),
    responses((status = 200, description = "Captains", body = [CaptainSummary]))
)]
/// List captains, optionally of one team.
pub async fn list_captains(
    State(state): State<SharedState>,
    Valid(Query(query)): Valid<Query<CaptainsQuery>>,
) -> Json<Vec<CaptainSummary>> {
    Json(team_service::list_captains(&state, query.team_id, query.fresh).await)
}
