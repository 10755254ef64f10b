use std::{cmp::Reverse, sync::Arc};

use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::{
    dao::models::{Collection, MatchEntity, RowId, TeamEntity},
    dto::leaderboard::TeamStanding,
    services::collection_service::{decode_rows, load_collection},
    state::{SharedState, Standings},
};

/// Leaderboard of `tournament` (or of every finished match), cached per tournament.
pub async fn leaderboard(state: &SharedState, tournament: Option<RowId>, fresh: bool) -> Standings {
    if !fresh {
        if let Some(standings) = state.team_stats().get(&tournament) {
            return standings;
        }
    }

    let teams = load_collection(state, Collection::Teams, fresh).await;
    let matches = load_collection(state, Collection::Matches, fresh).await;

    let standings = Arc::new(compute_standings(
        &decode_rows::<TeamEntity>(Collection::Teams, &teams.rows),
        &decode_rows::<MatchEntity>(Collection::Matches, &matches.rows),
        tournament,
    ));

    if teams.partial || matches.partial {
        warn!(?tournament, "leaderboard computed from partial rows; not cached");
    } else {
        debug!(?tournament, teams = standings.len(), "leaderboard cached");
        state.team_stats().insert(tournament, standings.clone());
    }
    standings
}

/// Aggregate finished matches into standings.
///
/// A win is worth 3 points, a draw 1. Lines are ordered by points, goal
/// difference, goals scored, then name. Registered teams without a finished
/// match still get a line.
pub fn compute_standings(
    teams: &[TeamEntity],
    matches: &[MatchEntity],
    tournament: Option<RowId>,
) -> Vec<TeamStanding> {
    let in_scope = |scope: Option<RowId>| tournament.is_none() || scope == tournament;

    let mut table: IndexMap<RowId, TeamStanding> = teams
        .iter()
        .filter(|team| in_scope(team.tournament))
        .map(|team| (team.id, TeamStanding::new(team.id, team.name.clone())))
        .collect();

    for entity in matches.iter().filter(|entity| in_scope(entity.tournament)) {
        let Some((home, home_goals, away, away_goals)) = entity.final_score() else {
            continue;
        };
        line(&mut table, home).record(home_goals, away_goals);
        line(&mut table, away).record(away_goals, home_goals);
    }

    let mut standings: Vec<TeamStanding> = table.into_values().collect();
    standings.sort_by(|a, b| {
        (Reverse(a.points), Reverse(a.goal_difference), Reverse(a.goals_for))
            .cmp(&(Reverse(b.points), Reverse(b.goal_difference), Reverse(b.goals_for)))
            .then_with(|| a.team_name.to_lowercase().cmp(&b.team_name.to_lowercase()))
            .then(a.team_id.cmp(&b.team_id))
    });
    standings
}

fn line(table: &mut IndexMap<RowId, TeamStanding>, team: RowId) -> &mut TeamStanding {
    // Linked from a match but missing from the teams table.
    table
        .entry(team)
        .or_insert_with(|| TeamStanding::new(team, format!("team #{team}")))
}

#[cfg(test)]
mod tests {
    use crate::dao::models::MatchStatus;

    use super::*;

    fn team(id: RowId, name: &str, tournament: RowId) -> TeamEntity {
        TeamEntity {
            id,
            name: name.to_string(),
            tournament: Some(tournament),
            captain: None,
            city: None,
        }
    }

    fn played(id: RowId, home: RowId, home_goals: i64, away: RowId, away_goals: i64) -> MatchEntity {
        MatchEntity {
            id,
            tournament: Some(1),
            stage: None,
            tour: None,
            home_team: Some(home),
            away_team: Some(away),
            home_score: Some(home_goals),
            away_score: Some(away_goals),
            status: Some(MatchStatus::Finished),
            scheduled_at: None,
            venue: None,
        }
    }

    #[test]
    fn points_then_goal_difference_then_goals_then_name() {
        let teams = [
            team(1, "Otters", 1),
            team(2, "Falcons", 1),
            team(3, "Badgers", 1),
            team(4, "Zebras", 1),
            team(5, "Alpacas", 1),
        ];
        let matches = [
            played(10, 1, 3, 2, 0),
            played(11, 3, 1, 2, 0),
            played(12, 1, 0, 3, 0),
        ];

        let standings = compute_standings(&teams, &matches, Some(1));
        let order: Vec<&str> = standings.iter().map(|s| s.team_name.as_str()).collect();
        assert_eq!(order, vec!["Otters", "Badgers", "Alpacas", "Zebras", "Falcons"]);

        let otters = &standings[0];
        assert_eq!(
            (otters.played, otters.won, otters.drawn, otters.lost, otters.points),
            (2, 1, 1, 0, 4)
        );
        assert_eq!(otters.goal_difference, 3);
        assert_eq!(standings[1].goal_difference, 1);
        assert_eq!(standings[4].goal_difference, -4);
        assert_eq!(standings[2].played, 0);
    }

    #[test]
    fn unfinished_and_out_of_scope_matches_are_ignored() {
        let teams = [team(1, "Otters", 1), team(2, "Falcons", 1), team(5, "Elsewhere", 2)];
        let mut live = played(10, 1, 5, 2, 0);
        live.status = Some(MatchStatus::Live);
        let mut other = played(11, 5, 1, 6, 0);
        other.tournament = Some(2);

        let standings = compute_standings(&teams, &[live, other], Some(1));
        assert_eq!(standings.len(), 2);
        assert!(standings.iter().all(|s| s.played == 0));
    }

    #[test]
    fn unknown_linked_teams_get_a_placeholder_line() {
        let standings = compute_standings(&[], &[played(10, 1, 2, 9, 1)], None);
        assert_eq!(standings[0].team_name, "team #1");
        assert_eq!(standings[1].team_name, "team #9");
    }
}
