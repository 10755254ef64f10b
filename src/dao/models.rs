use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use time::{
    Date, OffsetDateTime,
    format_description::well_known::{Iso8601, Rfc3339},
};
use utoipa::ToSchema;

use crate::dao::fields;

/// Opaque record returned by the row store.
pub type Row = Map<String, Value>;
/// Primary key assigned by the row store.
pub type RowId = u64;

/// Pass-through directives attached to every read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadOptions {
    /// Ask the store (and any proxy in between) not to serve a cached answer.
    pub bypass_cache: bool,
    /// Key rows by their human-readable field names instead of `field_<id>`.
    pub user_field_names: bool,
}

impl ReadOptions {
    /// Options used by the listing endpoints.
    pub fn listing(fresh: bool) -> Self {
        Self {
            bypass_cache: fresh,
            user_field_names: true,
        }
    }
}

/// Collections the dashboard reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    /// Tournaments themselves.
    Tournaments,
    /// Stages of a tournament.
    Stages,
    /// Rounds inside a stage.
    Tours,
    /// Registered teams.
    Teams,
    /// Team captains.
    Captains,
    /// Match schedule and results.
    Matches,
}

impl Collection {
    /// Every known collection.
    pub const ALL: [Collection; 6] = [
        Collection::Tournaments,
        Collection::Stages,
        Collection::Tours,
        Collection::Teams,
        Collection::Captains,
        Collection::Matches,
    ];

    /// Stable name, also the default table identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Tournaments => "tournaments",
            Collection::Stages => "stages",
            Collection::Tours => "tours",
            Collection::Teams => "teams",
            Collection::Captains => "captains",
            Collection::Matches => "matches",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Read the primary key of a raw row, with the same leniency as [`fields::id`].
pub fn row_id(row: &Row) -> Option<RowId> {
    fields::link_id(row.get("id")?).ok().flatten()
}

/// Parse an RFC 3339 timestamp, or a bare ISO 8601 date taken as midnight UTC.
pub fn parse_timestamp(value: &str) -> Option<OffsetDateTime> {
    let value = value.trim();
    OffsetDateTime::parse(value, &Rfc3339).ok().or_else(|| {
        Date::parse(value, &Iso8601::DEFAULT)
            .ok()
            .map(|date| date.midnight().assume_utc())
    })
}

/// Lifecycle of a match as stored in its status select.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    /// Not played yet.
    #[default]
    Scheduled,
    /// Currently being played.
    Live,
    /// Played; the score is final.
    Finished,
    /// Moved to a later, not yet known date.
    Postponed,
    /// Will not be played.
    Cancelled,
}

impl MatchStatus {
    /// Label written to the status select.
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStatus::Scheduled => "scheduled",
            MatchStatus::Live => "live",
            MatchStatus::Finished => "finished",
            MatchStatus::Postponed => "postponed",
            MatchStatus::Cancelled => "cancelled",
        }
    }
}

impl FromStr for MatchStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "scheduled" | "planned" => Ok(MatchStatus::Scheduled),
            "live" | "in_progress" | "in progress" => Ok(MatchStatus::Live),
            "finished" | "played" | "done" => Ok(MatchStatus::Finished),
            "postponed" => Ok(MatchStatus::Postponed),
            "cancelled" | "canceled" => Ok(MatchStatus::Cancelled),
            other => Err(format!("unknown match status `{other}`")),
        }
    }
}

/// Tournament row.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct TournamentEntity {
    /// Row id.
    #[serde(deserialize_with = "fields::id")]
    pub id: RowId,
    /// Display name.
    #[serde(default, deserialize_with = "fields::text")]
    pub name: String,
    /// Free-form status label (e.g. "registration", "running").
    #[serde(default, deserialize_with = "fields::select")]
    pub status: Option<String>,
    /// First day as stored.
    #[serde(default)]
    pub starts_on: Option<String>,
    /// Last day as stored.
    #[serde(default)]
    pub ends_on: Option<String>,
}

/// Stage of a tournament (group stage, playoffs...).
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct StageEntity {
    /// Row id.
    #[serde(deserialize_with = "fields::id")]
    pub id: RowId,
    /// Display name.
    #[serde(default, deserialize_with = "fields::text")]
    pub name: String,
    /// Owning tournament.
    #[serde(default, deserialize_with = "fields::link")]
    pub tournament: Option<RowId>,
    /// Display position inside the tournament.
    #[serde(default, deserialize_with = "fields::number")]
    pub position: Option<i64>,
}

/// Round of matches inside a stage.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct TourEntity {
    /// Row id.
    #[serde(deserialize_with = "fields::id")]
    pub id: RowId,
    /// Display name.
    #[serde(default, deserialize_with = "fields::text")]
    pub name: String,
    /// Owning stage.
    #[serde(default, deserialize_with = "fields::link")]
    pub stage: Option<RowId>,
    /// Round number inside the stage.
    #[serde(default, deserialize_with = "fields::number")]
    pub number: Option<i64>,
}

/// Registered team.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct TeamEntity {
    /// Row id.
    #[serde(deserialize_with = "fields::id")]
    pub id: RowId,
    /// Display name.
    #[serde(default, deserialize_with = "fields::text")]
    pub name: String,
    /// Tournament the team is registered in.
    #[serde(default, deserialize_with = "fields::link")]
    pub tournament: Option<RowId>,
    /// Linked captain.
    #[serde(default, deserialize_with = "fields::link")]
    pub captain: Option<RowId>,
    /// Home city.
    #[serde(default)]
    pub city: Option<String>,
}

/// Team captain.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct CaptainEntity {
    /// Row id.
    #[serde(deserialize_with = "fields::id")]
    pub id: RowId,
    /// Full name.
    #[serde(default, deserialize_with = "fields::text")]
    pub name: String,
    /// Team the captain leads.
    #[serde(default, deserialize_with = "fields::link")]
    pub team: Option<RowId>,
    /// Contact information.
    #[serde(default)]
    pub contact: Option<String>,
}

/// Scheduled or played match between two teams.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct MatchEntity {
    /// Row id.
    #[serde(deserialize_with = "fields::id")]
    pub id: RowId,
    /// Owning tournament.
    #[serde(default, deserialize_with = "fields::link")]
    pub tournament: Option<RowId>,
    /// Owning stage.
    #[serde(default, deserialize_with = "fields::link")]
    pub stage: Option<RowId>,
    /// Owning tour.
    #[serde(default, deserialize_with = "fields::link")]
    pub tour: Option<RowId>,
    /// Home side.
    #[serde(default, deserialize_with = "fields::link")]
    pub home_team: Option<RowId>,
    /// Away side.
    #[serde(default, deserialize_with = "fields::link")]
    pub away_team: Option<RowId>,
    /// Goals of the home side.
    #[serde(default, deserialize_with = "fields::number")]
    pub home_score: Option<i64>,
    /// Goals of the away side.
    #[serde(default, deserialize_with = "fields::number")]
    pub away_score: Option<i64>,
    /// Status select; see [`MatchEntity::status`].
    #[serde(default, deserialize_with = "fields::select")]
    pub status: Option<MatchStatus>,
    /// Kick-off as stored.
    #[serde(default)]
    pub scheduled_at: Option<String>,
    /// Where the match is played.
    #[serde(default)]
    pub venue: Option<String>,
}

impl MatchEntity {
    /// Status, defaulting to scheduled when the select is empty or unknown.
    pub fn status(&self) -> MatchStatus {
        self.status.unwrap_or_default()
    }

    /// Kick-off time when it parses.
    pub fn kickoff(&self) -> Option<OffsetDateTime> {
        self.scheduled_at.as_deref().and_then(parse_timestamp)
    }

    /// Whether `team` plays in this match.
    pub fn involves(&self, team: RowId) -> bool {
        self.home_team == Some(team) || self.away_team == Some(team)
    }

    /// `(home team, home goals, away team, away goals)` of a finished, fully filled match.
    pub fn final_score(&self) -> Option<(RowId, i64, RowId, i64)> {
        if self.status() != MatchStatus::Finished {
            return None;
        }
        Some((
            self.home_team?,
            self.home_score?,
            self.away_team?,
            self.away_score?,
        ))
    }
}
