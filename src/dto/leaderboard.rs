use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::dao::models::RowId;

/// Filters accepted by `GET /leaderboard`.
#[derive(Debug, Default, Deserialize, Validate, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LeaderboardQuery {
    /// Restrict the table to one tournament; all finished matches otherwise.
    #[validate(range(min = 1))]
    pub tournament_id: Option<RowId>,
    /// Recompute from uncached rows.
    #[serde(default)]
    pub fresh: bool,
}

/// One line of the leaderboard.
#[derive(Debug, Clone, Serialize, ToSchema, PartialEq, Eq)]
pub struct TeamStanding {
    /// Team row id.
    pub team_id: RowId,
    /// Team display name.
    pub team_name: String,
    /// Finished matches.
    pub played: u32,
    /// Wins.
    pub won: u32,
    /// Draws.
    pub drawn: u32,
    /// Losses.
    pub lost: u32,
    /// Goals scored.
    pub goals_for: i64,
    /// Goals conceded.
    pub goals_against: i64,
    /// Scored minus conceded.
    pub goal_difference: i64,
    /// 3 per win, 1 per draw.
    pub points: u32,
}

impl TeamStanding {
    /// Empty line for a team that has not played yet.
    pub fn new(team_id: RowId, team_name: String) -> Self {
        Self {
            team_id,
            team_name,
            played: 0,
            won: 0,
            drawn: 0,
            lost: 0,
            goals_for: 0,
            goals_against: 0,
            goal_difference: 0,
            points: 0,
        }
    }

    /// Account for one finished match from this team's side.
    pub fn record(&mut self, scored: i64, conceded: i64) {
        self.played += 1;
        self.goals_for += scored;
        self.goals_against += conceded;
        self.goal_difference = self.goals_for - self.goals_against;
        match scored.cmp(&conceded) {
            std::cmp::Ordering::Greater => {
                self.won += 1;
                self.points += 3;
            }
            std::cmp::Ordering::Equal => {
                self.drawn += 1;
                self.points += 1;
            }
            std::cmp::Ordering::Less => self.lost += 1,
        }
    }
}
