use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::dao::models::{CaptainEntity, RowId, TeamEntity};

/// Filters accepted by `GET /teams`.
#[derive(Debug, Default, Deserialize, Validate, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TeamsQuery {
    /// Only teams registered in this tournament.
    #[validate(range(min = 1))]
    pub tournament_id: Option<RowId>,
    /// Case-insensitive substring of the team name.
    #[validate(length(min = 1, max = 64))]
    pub search: Option<String>,
    /// Skip the snapshot cache.
    #[serde(default)]
    pub fresh: bool,
}

/// Filters accepted by `GET /captains`.
#[derive(Debug, Default, Deserialize, Validate, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CaptainsQuery {
    /// Only the captain(s) of this team.
    #[validate(range(min = 1))]
    pub team_id: Option<RowId>,
    /// Skip the snapshot cache.
    #[serde(default)]
    pub fresh: bool,
}

/// Team as exposed to the dashboard.
#[derive(Debug, Clone, Serialize, ToSchema, PartialEq, Eq)]
pub struct TeamSummary {
    /// Row id.
    pub id: RowId,
    /// Display name.
    pub name: String,
    /// Tournament the team is registered in.
    pub tournament_id: Option<RowId>,
    /// Linked captain.
    pub captain_id: Option<RowId>,
    /// Home city.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
}

impl From<TeamEntity> for TeamSummary {
    fn from(entity: TeamEntity) -> Self {
        Self {
            id: entity.id,
            name: entity.name,
            tournament_id: entity.tournament,
            captain_id: entity.captain,
            city: entity.city,
        }
    }
}

/// Team captain.
#[derive(Debug, Clone, Serialize, ToSchema, PartialEq, Eq)]
pub struct CaptainSummary {
    /// Row id.
    pub id: RowId,
    /// Full name.
    pub name: String,
    /// Team the captain leads.
    pub team_id: Option<RowId>,
    /// Contact information.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact: Option<String>,
}

impl From<CaptainEntity> for CaptainSummary {
    fn from(entity: CaptainEntity) -> Self {
        Self {
            id: entity.id,
            name: entity.name,
            team_id: entity.team,
            contact: entity.contact,
        }
    }
}
