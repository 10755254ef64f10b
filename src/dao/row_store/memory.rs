//! In-process row store used for local runs without a backend and in tests.

use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
};

use dashmap::DashMap;
use futures::future::BoxFuture;

use crate::dao::{
    models::{ReadOptions, Row, RowId, row_id},
    row_store::RowStore,
    storage::{StorageError, StorageResult},
};

/// Marks a table whose reads keep failing until healed.
pub const ALWAYS_FAIL: u32 = u32::MAX;

#[derive(Default)]
struct MemoryTables {
    tables: DashMap<String, Vec<Row>>,
    failing_reads: DashMap<String, u32>,
    failing_updates: AtomicBool,
    page_reads: AtomicUsize,
}

/// Row store keeping every table in memory. Clones share the same tables.
#[derive(Clone, Default)]
pub struct MemoryRowStore {
    inner: Arc<MemoryTables>,
}

impl MemoryRowStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from a `{ "<table>": [row, ...] }` document.
    pub fn from_json(contents: &str) -> serde_json::Result<Self> {
        let tables: HashMap<String, Vec<Row>> = serde_json::from_str(contents)?;
        let store = Self::new();
        for (table, rows) in tables {
            store.insert_rows(&table, rows);
        }
        Ok(store)
    }

    /// Append rows to a table, creating it when needed. Rows should carry an `id`.
    pub fn insert_rows(&self, table: &str, rows: impl IntoIterator<Item = Row>) {
        self.inner
            .tables
            .entry(table.to_string())
            .or_default()
            .extend(rows);
    }

    /// Make the next `times` reads of `table` fail ([`ALWAYS_FAIL`] for every read).
    pub fn fail_reads(&self, table: &str, times: u32) {
        self.inner.failing_reads.insert(table.to_string(), times);
    }

    /// Stop injecting read failures for `table`.
    pub fn heal_reads(&self, table: &str) {
        self.inner.failing_reads.remove(table);
    }

    /// Toggle failure injection for every update.
    pub fn fail_updates(&self, failing: bool) {
        self.inner.failing_updates.store(failing, Ordering::SeqCst);
    }

    /// Number of page reads served or failed so far.
    pub fn page_reads(&self) -> usize {
        self.inner.page_reads.load(Ordering::SeqCst)
    }

    /// Current content of a row, bypassing failure injection.
    pub fn row(&self, table: &str, id: RowId) -> Option<Row> {
        let rows = self.inner.tables.get(table)?;
        rows.iter().find(|row| row_id(row) == Some(id)).cloned()
    }

    fn take_read_failure(&self, table: &str) -> bool {
        let Some(mut remaining) = self.inner.failing_reads.get_mut(table) else {
            return false;
        };
        match *remaining {
            0 => false,
            ALWAYS_FAIL => true,
            _ => {
                *remaining -= 1;
                true
            }
        }
    }

    fn page(&self, table: &str, page: u32, page_size: u32) -> StorageResult<Vec<Row>> {
        self.inner.page_reads.fetch_add(1, Ordering::SeqCst);
        if self.take_read_failure(table) {
            return Err(StorageError::rejected(format!(
                "injected read failure for table `{table}`"
            )));
        }

        let Some(rows) = self.inner.tables.get(table) else {
            return Ok(Vec::new());
        };
        let start = (page as usize).saturating_mul(page_size as usize);
        Ok(rows
            .iter()
            .skip(start)
            .take(page_size as usize)
            .cloned()
            .collect())
    }

    fn patch(&self, table: &str, id: RowId, patch: Row) -> StorageResult<Row> {
        if self.inner.failing_updates.load(Ordering::SeqCst) {
            return Err(StorageError::rejected(format!(
                "injected update failure for row `{id}` of table `{table}`"
            )));
        }

        let missing = || StorageError::Missing {
            table: table.to_string(),
            id,
        };
        let mut rows = self.inner.tables.get_mut(table).ok_or_else(missing)?;
        let row = rows
            .iter_mut()
            .find(|row| row_id(row) == Some(id))
            .ok_or_else(missing)?;
        row.extend(patch);
        Ok(row.clone())
    }
}

impl RowStore for MemoryRowStore {
    fn get_rows(
        &self,
        table: &str,
        page: u32,
        page_size: u32,
        _options: ReadOptions,
    ) -> BoxFuture<'static, StorageResult<Vec<Row>>> {
        let result = self.page(table, page, page_size);
        Box::pin(async move { result })
    }

    fn get_row(
        &self,
        table: &str,
        id: RowId,
        _options: ReadOptions,
    ) -> BoxFuture<'static, StorageResult<Option<Row>>> {
        let result = if self.take_read_failure(table) {
            Err(StorageError::rejected(format!(
                "injected read failure for table `{table}`"
            )))
        } else {
            Ok(self.row(table, id))
        };
        Box::pin(async move { result })
    }

    fn update_row(
        &self,
        table: &str,
        id: RowId,
        patch: Row,
    ) -> BoxFuture<'static, StorageResult<Row>> {
        let result = self.patch(table, id, patch);
        Box::pin(async move { result })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn row(value: serde_json::Value) -> Row {
        value.as_object().cloned().unwrap()
    }

    fn seeded(count: u64) -> MemoryRowStore {
        let store = MemoryRowStore::new();
        store.insert_rows("teams", (1..=count).map(|id| row(json!({"id": id}))));
        store
    }

    #[tokio::test]
    async fn pages_slice_rows_in_insertion_order() {
        let store = seeded(25);

        let second = store
            .get_rows("teams", 1, 10, ReadOptions::default())
            .await
            .unwrap();
        let ids: Vec<_> = second.iter().filter_map(row_id).collect();
        assert_eq!(ids, (11..=20).collect::<Vec<_>>());

        let last = store
            .get_rows("teams", 2, 10, ReadOptions::default())
            .await
            .unwrap();
        assert_eq!(last.len(), 5);

        let past_end = store
            .get_rows("teams", 7, 10, ReadOptions::default())
            .await
            .unwrap();
        assert!(past_end.is_empty());
        assert_eq!(store.page_reads(), 3);
    }

    #[tokio::test]
    async fn injected_read_failures_are_consumed() {
        let store = seeded(3);
        store.fail_reads("teams", 1);

        assert!(store.get_rows("teams", 0, 10, ReadOptions::default()).await.is_err());
        assert!(store.get_rows("teams", 0, 10, ReadOptions::default()).await.is_ok());
    }

    #[tokio::test]
    async fn update_merges_patch_into_row() {
        let store = seeded(2);

        let updated = store
            .update_row("teams", 2, row(json!({"name": "Otters"})))
            .await
            .unwrap();
        assert_eq!(updated.get("name"), Some(&json!("Otters")));
        assert_eq!(store.row("teams", 2), Some(updated));

        let missing = store.update_row("teams", 9, Row::new()).await;
        assert!(matches!(missing, Err(StorageError::Missing { id: 9, .. })));

        store.fail_updates(true);
        assert!(store.update_row("teams", 1, Row::new()).await.is_err());
    }

    #[test]
    fn seed_document_fills_tables() {
        let store = MemoryRowStore::from_json(
            r#"{ "teams": [{"id": 1, "name": "Falcons"}], "matches": [] }"#,
        )
        .unwrap();
        assert_eq!(store.row("teams", 1).unwrap()["name"], json!("Falcons"));
        assert!(MemoryRowStore::from_json("[1, 2]").is_err());
    }
}
