/// In-process row store used by tests and local runs.
pub mod memory;
/// Hosted REST row store.
#[cfg(feature = "rest-store")]
pub mod rest;

use futures::future::BoxFuture;

use crate::dao::models::{ReadOptions, Row, RowId};
use crate::dao::storage::StorageResult;

pub use memory::MemoryRowStore;

/// Page-at-a-time access to the hosted row store.
///
/// `page` is 0-based. Implementations normalize the store's error markers into
/// [`crate::dao::storage::StorageError`] so callers only see one failure path.
pub trait RowStore: Send + Sync {
    /// Read page `page` of `table`; a short or empty page is the last one.
    fn get_rows(
        &self,
        table: &str,
        page: u32,
        page_size: u32,
        options: ReadOptions,
    ) -> BoxFuture<'static, StorageResult<Vec<Row>>>;
    /// Read one row, `None` when it does not exist.
    fn get_row(
        &self,
        table: &str,
        id: RowId,
        options: ReadOptions,
    ) -> BoxFuture<'static, StorageResult<Option<Row>>>;
    /// Merge `patch` into a row and return the row as stored.
    fn update_row(
        &self,
        table: &str,
        id: RowId,
        patch: Row,
    ) -> BoxFuture<'static, StorageResult<Row>>;
    /// Cheap connectivity probe.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
}
