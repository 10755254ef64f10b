use crate::{
    dao::models::{Collection, ReadOptions, RowId, StageEntity, TourEntity, TournamentEntity},
    dto::tournament::{StageSummary, TourSummary, TournamentSummary},
    error::ServiceError,
    services::collection_service::{decode_row, decode_rows, load_rows},
    state::SharedState,
};

/// Every tournament, in store order.
pub async fn list_tournaments(state: &SharedState, fresh: bool) -> Vec<TournamentSummary> {
    let rows = load_rows(state, Collection::Tournaments, fresh).await;
    decode_rows::<TournamentEntity>(Collection::Tournaments, &rows)
        .into_iter()
        .map(TournamentSummary::from)
        .collect()
}

/// One tournament, read straight from the store.
pub async fn get_tournament(
    state: &SharedState,
    id: RowId,
    fresh: bool,
) -> Result<TournamentSummary, ServiceError> {
    let table = &state.config().collection(Collection::Tournaments).table;
    let row = state
        .store()
        .get_row(table, id, ReadOptions::listing(fresh))
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("tournament `{id}`")))?;

    decode_row::<TournamentEntity>(Collection::Tournaments, &row)
        .map(TournamentSummary::from)
        .ok_or_else(|| ServiceError::Malformed(format!("tournament `{id}`")))
}

/// Stages, optionally of one tournament, ordered by position.
pub async fn list_stages(
    state: &SharedState,
    tournament: Option<RowId>,
    fresh: bool,
) -> Vec<StageSummary> {
    let rows = load_rows(state, Collection::Stages, fresh).await;
    let mut stages: Vec<StageEntity> = decode_rows::<StageEntity>(Collection::Stages, &rows)
        .into_iter()
        .filter(|stage| tournament.is_none() || stage.tournament == tournament)
        .collect();
    // Stages without a position go last.
    stages.sort_by_key(|stage| (stage.position.is_none(), stage.position, stage.id));
    stages.into_iter().map(StageSummary::from).collect()
}

/// Tours, optionally of one stage, ordered by number.
pub async fn list_tours(state: &SharedState, stage: Option<RowId>, fresh: bool) -> Vec<TourSummary> {
    let rows = load_rows(state, Collection::Tours, fresh).await;
    let mut tours: Vec<TourEntity> = decode_rows::<TourEntity>(Collection::Tours, &rows)
        .into_iter()
        .filter(|tour| stage.is_none() || tour.stage == stage)
        .collect();
    tours.sort_by_key(|tour| (tour.number.is_none(), tour.number, tour.id));
    tours.into_iter().map(TourSummary::from).collect()
}
