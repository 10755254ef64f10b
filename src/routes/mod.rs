use axum::Router;

use crate::state::SharedState;

/// Swagger UI and OpenAPI document.
pub mod docs;
/// `/healthcheck`.
pub mod health;
/// `/leaderboard`.
pub mod leaderboard;
/// `/matches` and status updates.
pub mod matches;
/// `/teams` and `/captains`.
pub mod teams;
/// `/tournaments`, `/stages` and `/tours`.
pub mod tournaments;

/// Compose all route trees, including documentation, and attach the shared state.
pub fn router(state: SharedState) -> Router<()> {
    let api_router = health::router()
        .merge(tournaments::router())
        .merge(teams::router())
        .merge(matches::router())
        .merge(leaderboard::router())
        .merge(docs::router());

    api_router.with_state(state)
}
