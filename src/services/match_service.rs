use std::sync::Arc;

use serde_json::Value;
use tracing::{info, warn};

use crate::{
    dao::models::{Collection, MatchEntity, MatchStatus, Row, RowId, row_id},
    dto::matches::{MatchSummary, MatchesQuery},
    error::ServiceError,
    services::collection_service::{decode_row, decode_rows, load_rows},
    state::{AppState, OptimisticCommand, SharedState},
};

const STATUS_FIELD: &str = "status";

/// Matches passing every filter of `query`, ordered by kick-off.
///
/// Matches without a parseable kick-off come last, by id.
pub async fn list_matches(state: &SharedState, query: &MatchesQuery) -> Vec<MatchSummary> {
    let rows = load_rows(state, Collection::Matches, query.fresh).await;
    let mut matches: Vec<MatchEntity> = decode_rows::<MatchEntity>(Collection::Matches, &rows)
        .into_iter()
        .filter(|entity| matches_query(entity, query))
        .collect();
    matches.sort_by_key(|entity| (entity.kickoff().is_none(), entity.kickoff(), entity.id));
    matches.into_iter().map(MatchSummary::from).collect()
}

fn matches_query(entity: &MatchEntity, query: &MatchesQuery) -> bool {
    fn keep(filter: Option<RowId>, value: Option<RowId>) -> bool {
        filter.is_none() || filter == value
    }

    keep(query.tournament_id, entity.tournament)
        && keep(query.stage_id, entity.stage)
        && keep(query.tour_id, entity.tour)
        && query.team_id.is_none_or(|team| entity.involves(team))
        && query.status.is_none_or(|status| entity.status() == status)
}

/// Set the status of a match.
///
/// The cached schedule shows the new status while the store is being
/// written; it is put back if the write fails or times out.
pub async fn update_match_status(
    state: &SharedState,
    id: RowId,
    status: MatchStatus,
) -> Result<MatchSummary, ServiceError> {
    let table = state.config().collection(Collection::Matches).table.clone();
    let next = Value::String(status.as_str().to_string());
    let previous = cached_field(state, id, STATUS_FIELD);

    let mut patch = Row::new();
    patch.insert(STATUS_FIELD.to_string(), next.clone());

    let command = OptimisticCommand::new(
        || set_cached_field(state, id, STATUS_FIELD, Some(next.clone())),
        || set_cached_field(state, id, STATUS_FIELD, previous.clone()),
    );
    let remote = async {
        state
            .store()
            .update_row(&table, id, patch)
            .await
            .map_err(ServiceError::from)
    };

    let stored = match state.run_optimistic(command, remote).await {
        Ok(row) => row,
        Err(err) => {
            warn!(match_id = id, status = status.as_str(), error = %err, "match status update reverted");
            return Err(err);
        }
    };

    replace_cached_row(state, id, &stored);
    state.team_stats().invalidate_all();
    info!(match_id = id, status = status.as_str(), "match status updated");

    decode_row::<MatchEntity>(Collection::Matches, &stored)
        .map(MatchSummary::from)
        .ok_or_else(|| ServiceError::Malformed(format!("match `{id}`")))
}

fn cached_field(state: &AppState, id: RowId, field: &str) -> Option<Value> {
    let rows = state.collections().get(&Collection::Matches)?;
    rows.iter()
        .find(|row| row_id(row) == Some(id))
        .and_then(|row| row.get(field).cloned())
}

fn set_cached_field(state: &AppState, id: RowId, field: &str, value: Option<Value>) {
    state.collections().update(&Collection::Matches, |rows| {
        let rows = Arc::make_mut(rows);
        if let Some(row) = rows.iter_mut().find(|row| row_id(row) == Some(id)) {
            match value {
                Some(value) => row.insert(field.to_string(), value),
                None => row.remove(field),
            };
        }
    });
}

fn replace_cached_row(state: &AppState, id: RowId, stored: &Row) {
    state.collections().update(&Collection::Matches, |rows| {
        let rows = Arc::make_mut(rows);
        if let Some(row) = rows.iter_mut().find(|row| row_id(row) == Some(id)) {
            *row = stored.clone();
        }
    });
}
