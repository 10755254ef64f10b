use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{Instrument, info_span, warn};

use crate::{
    dao::models::{Collection, ReadOptions, Row, row_id},
    fetcher::StopReason,
    state::{RowSnapshot, SharedState},
};

/// Rows of one collection and whether the walk that produced them was cut short.
#[derive(Debug, Clone)]
pub struct CollectionSnapshot {
    /// Raw rows in page order.
    pub rows: RowSnapshot,
    /// Set when more than half of a batch failed; such snapshots are never cached.
    ///
    /// A walk cut at the page ceiling is not partial in this sense: asking
    /// again stops at the same ceiling, so it is cached like a drained one.
    pub partial: bool,
}

/// Rows of `collection`, from the snapshot cache unless `fresh` is set.
pub async fn load_rows(state: &SharedState, collection: Collection, fresh: bool) -> RowSnapshot {
    load_collection(state, collection, fresh).await.rows
}

/// Same as [`load_rows`], also telling whether the rows are partial.
///
/// A degraded walk is returned as-is but never cached, so the next reader
/// tries again.
pub async fn load_collection(
    state: &SharedState,
    collection: Collection,
    fresh: bool,
) -> CollectionSnapshot {
    if !fresh {
        if let Some(rows) = state.collections().get(&collection) {
            return CollectionSnapshot {
                rows,
                partial: false,
            };
        }
    }

    let table = state.config().collection(collection).table.clone();
    let store = state.store().clone();
    let options = ReadOptions::listing(fresh);
    let fetcher = state.fetcher(collection);

    let report = fetcher
        .fetch_all_with_report(|page, page_size| store.get_rows(&table, page, page_size, options))
        .instrument(info_span!("load_collection", %collection, table = %table, fresh))
        .await;

    let rows: RowSnapshot = Arc::new(report.rows);
    let partial = report.stop == StopReason::Degraded;
    if partial {
        warn!(
            %collection,
            stop = report.stop.as_str(),
            rows = rows.len(),
            "partial collection not cached"
        );
    } else {
        state.collections().insert(collection, rows.clone());
    }
    CollectionSnapshot { rows, partial }
}

/// Decode every row into `T`, skipping (and logging) the ones that do not fit.
pub fn decode_rows<T: DeserializeOwned>(collection: Collection, rows: &[Row]) -> Vec<T> {
    rows.iter()
        .filter_map(|row| decode_row(collection, row))
        .collect()
}

/// Decode a single row, logging it when it does not fit.
pub fn decode_row<T: DeserializeOwned>(collection: Collection, row: &Row) -> Option<T> {
    match serde_json::from_value::<T>(Value::Object(row.clone())) {
        Ok(entity) => Some(entity),
        Err(err) => {
            warn!(
                %collection,
                row_id = ?row_id(row),
                error = %err,
                "skipping row that does not decode"
            );
            None
        }
    }
}
