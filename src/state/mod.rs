/// Local changes mirrored by a remote effect.
pub mod optimistic;

use std::{future::Future, sync::Arc, time::Duration};

use tokio::time::timeout;
use tracing::warn;

use crate::{
    cache::{Clock, TtlCache},
    config::AppConfig,
    dao::{
        models::{Collection, Row, RowId},
        row_store::RowStore,
    },
    dto::leaderboard::TeamStanding,
    error::ServiceError,
    fetcher::BulkCollectionFetcher,
};

pub use self::optimistic::OptimisticCommand;

/// Handle shared by every handler.
pub type SharedState = Arc<AppState>;
/// Cached raw rows of one collection.
pub type RowSnapshot = Arc<Vec<Row>>;
/// Cached leaderboard, keyed by the tournament it was computed for.
pub type Standings = Arc<Vec<TeamStanding>>;

/// Central application state: the row store handle, configuration and caches.
///
/// Constructed once per process; the caches live exactly as long as the state.
pub struct AppState {
    store: Arc<dyn RowStore>,
    config: AppConfig,
    collections: TtlCache<Collection, RowSnapshot>,
    team_stats: TtlCache<Option<RowId>, Standings>,
    command_timeout: Option<Duration>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    pub fn new(store: Arc<dyn RowStore>, config: AppConfig, clock: Arc<dyn Clock>) -> SharedState {
        Arc::new(Self {
            store,
            collections: TtlCache::new(config.collection_ttl(), clock.clone()),
            team_stats: TtlCache::new(config.team_stats_ttl(), clock),
            command_timeout: config.command_timeout(),
            config,
        })
    }

    /// Handle to the row store.
    pub fn store(&self) -> &Arc<dyn RowStore> {
        &self.store
    }

    /// Runtime configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Snapshot cache of whole collections.
    pub fn collections(&self) -> &TtlCache<Collection, RowSnapshot> {
        &self.collections
    }

    /// Leaderboard cache.
    pub fn team_stats(&self) -> &TtlCache<Option<RowId>, Standings> {
        &self.team_stats
    }

    /// Bulk fetcher configured with the profile of `collection`.
    pub fn fetcher(&self, collection: Collection) -> BulkCollectionFetcher {
        BulkCollectionFetcher::new(
            self.config.collection(collection).fetch,
            self.config.retry(),
        )
    }

    /// Run an optimistic command whose remote half is bounded by the command timeout.
    ///
    /// A timeout counts as a failure: the local change is reverted.
    pub async fn run_optimistic<A, R, Fut, T>(
        &self,
        command: OptimisticCommand<A, R>,
        remote: Fut,
    ) -> Result<T, ServiceError>
    where
        A: FnOnce(),
        R: FnOnce(),
        Fut: Future<Output = Result<T, ServiceError>>,
    {
        let limit = self.command_timeout;
        let bounded = async move {
            match limit {
                Some(limit) => match timeout(limit, remote).await {
                    Ok(result) => result,
                    Err(_) => {
                        warn!(
                            timeout_ms = limit.as_millis() as u64,
                            "remote effect timed out; reverting local change"
                        );
                        Err(ServiceError::Timeout)
                    }
                },
                None => remote.await,
            }
        };
        command.run(bounded).await
    }
}
