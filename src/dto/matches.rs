//! DTOs for the match schedule and the status update command.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::dao::models::{MatchEntity, MatchStatus, RowId};

use super::normalize_timestamp;

/// Filters accepted by `GET /matches`. Every filter is optional and they combine.
#[derive(Debug, Default, Deserialize, Validate, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct MatchesQuery {
    /// Only matches of this tournament.
    #[validate(range(min = 1))]
    pub tournament_id: Option<RowId>,
    /// Only matches of this stage.
    #[validate(range(min = 1))]
    pub stage_id: Option<RowId>,
    /// Only matches of this tour.
    #[validate(range(min = 1))]
    pub tour_id: Option<RowId>,
    /// Matches where this team plays home or away.
    #[validate(range(min = 1))]
    pub team_id: Option<RowId>,
    /// Only matches in this status.
    pub status: Option<MatchStatus>,
    /// Skip the snapshot cache.
    #[serde(default)]
    pub fresh: bool,
}

/// Match as exposed to the dashboard.
#[derive(Debug, Clone, Serialize, ToSchema, PartialEq, Eq)]
pub struct MatchSummary {
    /// Row id.
    pub id: RowId,
    /// Owning tournament.
    pub tournament_id: Option<RowId>,
    /// Owning stage.
    pub stage_id: Option<RowId>,
    /// Owning tour.
    pub tour_id: Option<RowId>,
    /// Home side.
    pub home_team_id: Option<RowId>,
    /// Away side.
    pub away_team_id: Option<RowId>,
    /// Goals of the home side.
    pub home_score: Option<i64>,
    /// Goals of the away side.
    pub away_score: Option<i64>,
    /// Lifecycle status.
    pub status: MatchStatus,
    /// RFC 3339 kick-off time, or the stored text when it does not parse.
    pub scheduled_at: Option<String>,
    /// Where the match is played.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub venue: Option<String>,
}

impl From<MatchEntity> for MatchSummary {
    fn from(entity: MatchEntity) -> Self {
        let status = entity.status();
        Self {
            id: entity.id,
            tournament_id: entity.tournament,
            stage_id: entity.stage,
            tour_id: entity.tour,
            home_team_id: entity.home_team,
            away_team_id: entity.away_team,
            home_score: entity.home_score,
            away_score: entity.away_score,
            status,
            scheduled_at: normalize_timestamp(entity.scheduled_at),
            venue: entity.venue,
        }
    }
}

/// Body of `PUT /matches/{id}/status`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateStatusRequest {
    /// New status.
    pub status: MatchStatus,
}
