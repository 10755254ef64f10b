/// Bulk collection loading and row decoding.
pub mod collection_service;
/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Standings computed from finished matches.
pub mod leaderboard_service;
/// Match listing and status updates.
pub mod match_service;
/// Team and captain listings.
pub mod team_service;
/// Tournament, stage and tour listings.
pub mod tournament_service;
