use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for Tourney Back.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::tournaments::list_tournaments,
        crate::routes::tournaments::get_tournament,
        crate::routes::tournaments::list_stages,
        crate::routes::tournaments::list_tours,
        crate::routes::teams::list_teams,
        crate::routes::teams::list_captains,
        crate::routes::matches::list_matches,
        crate::routes::matches::update_match_status,
        crate::routes::leaderboard::get_leaderboard,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::tournament::TournamentSummary,
            crate::dto::tournament::StageSummary,
            crate::dto::tournament::TourSummary,
            crate::dto::team::TeamSummary,
            crate::dto::team::CaptainSummary,
            crate::dto::matches::MatchSummary,
            crate::dto::matches::UpdateStatusRequest,
            crate::dto::leaderboard::TeamStanding,
            crate::dao::models::MatchStatus,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "tournaments", description = "Tournaments, stages and tours"),
        (name = "teams", description = "Teams and captains"),
        (name = "matches", description = "Match schedule and results"),
        (name = "leaderboard", description = "Standings computed from finished matches"),
    )
)]
pub struct ApiDoc;
