use crate::{
    dao::models::{CaptainEntity, Collection, RowId, TeamEntity},
    dto::team::{CaptainSummary, TeamSummary},
    services::collection_service::{decode_rows, load_rows},
    state::SharedState,
};

/// Teams matching the optional tournament and name filters, sorted by name.
pub async fn list_teams(
    state: &SharedState,
    tournament: Option<RowId>,
    search: Option<&str>,
    fresh: bool,
) -> Vec<TeamSummary> {
    let needle = search
        .map(str::trim)
        .filter(|needle| !needle.is_empty())
        .map(str::to_lowercase);

    let rows = load_rows(state, Collection::Teams, fresh).await;
    let mut teams: Vec<TeamEntity> = decode_rows::<TeamEntity>(Collection::Teams, &rows)
        .into_iter()
        .filter(|team| tournament.is_none() || team.tournament == tournament)
        .filter(|team| match needle {
            Some(ref needle) => team.name.to_lowercase().contains(needle.as_str()),
            None => true,
        })
        .collect();
    teams.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()).then(a.id.cmp(&b.id)));
    teams.into_iter().map(TeamSummary::from).collect()
}

/// Captains, optionally of one team.
pub async fn list_captains(
    state: &SharedState,
    team: Option<RowId>,
    fresh: bool,
) -> Vec<CaptainSummary> {
    let rows = load_rows(state, Collection::Captains, fresh).await;
    decode_rows::<CaptainEntity>(Collection::Captains, &rows)
        .into_iter()
        .filter(|captain| team.is_none() || captain.team == team)
        .map(CaptainSummary::from)
        .collect()
}
