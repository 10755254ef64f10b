//! DTOs for tournaments and their structure (stages and tours).

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::dao::models::{RowId, StageEntity, TourEntity, TournamentEntity};

use super::normalize_timestamp;

/// Query shared by listings that take no filter.
#[derive(Debug, Default, Deserialize, Validate, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct FreshQuery {
    /// Skip the snapshot cache and ask the store for an uncached answer.
    #[serde(default)]
    pub fresh: bool,
}

/// Filters accepted by `GET /stages`.
#[derive(Debug, Default, Deserialize, Validate, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StagesQuery {
    /// Only stages of this tournament.
    #[validate(range(min = 1))]
    pub tournament_id: Option<RowId>,
    /// Skip the snapshot cache.
    #[serde(default)]
    pub fresh: bool,
}

/// Filters accepted by `GET /tours`.
#[derive(Debug, Default, Deserialize, Validate, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ToursQuery {
    /// Only tours of this stage.
    #[validate(range(min = 1))]
    pub stage_id: Option<RowId>,
    /// Skip the snapshot cache.
    #[serde(default)]
    pub fresh: bool,
}

/// Tournament as exposed to the dashboard.
#[derive(Debug, Clone, Serialize, ToSchema, PartialEq, Eq)]
pub struct TournamentSummary {
    /// Row id.
    pub id: RowId,
    /// Display name.
    pub name: String,
    /// Free-form status label.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// First day, RFC 3339 when it parses.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub starts_on: Option<String>,
    /// Last day, RFC 3339 when it parses.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ends_on: Option<String>,
}

impl From<TournamentEntity> for TournamentSummary {
    fn from(entity: TournamentEntity) -> Self {
        Self {
            id: entity.id,
            name: entity.name,
            status: entity.status,
            starts_on: normalize_timestamp(entity.starts_on),
            ends_on: normalize_timestamp(entity.ends_on),
        }
    }
}

/// Stage of a tournament.
#[derive(Debug, Clone, Serialize, ToSchema, PartialEq, Eq)]
pub struct StageSummary {
    /// Row id.
    pub id: RowId,
    /// Display name.
    pub name: String,
    /// Owning tournament.
    pub tournament_id: Option<RowId>,
    /// Display position inside the tournament.
    pub position: Option<i64>,
}

impl From<StageEntity> for StageSummary {
    fn from(entity: StageEntity) -> Self {
        Self {
            id: entity.id,
            name: entity.name,
            tournament_id: entity.tournament,
            position: entity.position,
        }
    }
}

/// Round inside a stage.
#[derive(Debug, Clone, Serialize, ToSchema, PartialEq, Eq)]
pub struct TourSummary {
    /// Row id.
    pub id: RowId,
    /// Display name.
    pub name: String,
    /// Owning stage.
    pub stage_id: Option<RowId>,
    /// Round number inside the stage.
    pub number: Option<i64>,
}

impl From<TourEntity> for TourSummary {
    fn from(entity: TourEntity) -> Self {
        Self {
            id: entity.id,
            name: entity.name,
            stage_id: entity.stage,
            number: entity.number,
        }
    }
}
