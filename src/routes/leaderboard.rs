use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};
use axum_valid::Valid;

use crate::{
    dto::leaderboard::{LeaderboardQuery, TeamStanding},
    services::leaderboard_service,
    state::SharedState,
};

/// Standings endpoint.
pub fn router() -> Router<SharedState> {
    Router::new().route("/leaderboard", get(get_leaderboard))
}

#[utoipa::path(
    get,
    path = "/leaderboard",
    tag = "leaderboard",
    params(LeaderboardQuery),
    responses((status = 200, description = "Standings, best team first", body = [TeamStanding]))
)]
/// Return the standings computed from finished matches.
pub async fn get_leaderboard(
    State(state): State<SharedState>,
    Valid(Query(query)): Valid<Query<LeaderboardQuery>>,
) -> Json<Vec<TeamStanding>> {
    let standings = leaderboard_service::leaderboard(&state, query.tournament_id, query.fresh).await;
    Json(standings.as_ref().clone())
}
