//! Application-level configuration loading: table identifiers, fetch profiles and cache TTLs.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

use crate::{
    dao::models::Collection,
    fetcher::{FetchOptions, RetryPolicy},
};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "TOURNEY_BACK_CONFIG_PATH";
/// Pause between batches for the collections read with the throttled profile.
const THROTTLED_BATCH_PAUSE: Duration = Duration::from_millis(500);
const DEFAULT_COLLECTION_TTL: Duration = Duration::from_secs(60);
const DEFAULT_TEAM_STATS_TTL: Duration = Duration::from_secs(300);
const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(10);

/// Where a collection lives and how it is read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionConfig {
    /// Table identifier in the row store.
    pub table: String,
    /// Fetch profile used by the bulk fetcher.
    pub fetch: FetchOptions,
}

impl CollectionConfig {
    fn default_for(collection: Collection) -> Self {
        let batch_pause = match collection {
            // Teams and captains are large, hand-maintained tables; go easy on them.
            Collection::Teams | Collection::Captains => Some(THROTTLED_BATCH_PAUSE),
            _ => None,
        };
        Self {
            table: collection.as_str().to_string(),
            fetch: FetchOptions {
                batch_pause,
                ..FetchOptions::default()
            },
        }
    }
}

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    tournaments: CollectionConfig,
    stages: CollectionConfig,
    tours: CollectionConfig,
    teams: CollectionConfig,
    captains: CollectionConfig,
    matches: CollectionConfig,
    retry: RetryPolicy,
    collection_ttl: Duration,
    team_stats_ttl: Duration,
    command_timeout: Option<Duration>,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let app_config: Self = raw.into();
                    info!(
                        path = %path.display(),
                        teams_table = %app_config.teams.table,
                        matches_table = %app_config.matches.table,
                        "loaded configuration"
                    );
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Parse a configuration document, filling the gaps with defaults.
    pub fn from_json(contents: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str::<RawConfig>(contents).map(Into::into)
    }

    /// Table and fetch profile of `collection`.
    pub fn collection(&self, collection: Collection) -> &CollectionConfig {
        match collection {
            Collection::Tournaments => &self.tournaments,
            Collection::Stages => &self.stages,
            Collection::Tours => &self.tours,
            Collection::Teams => &self.teams,
            Collection::Captains => &self.captains,
            Collection::Matches => &self.matches,
        }
    }

    fn collection_mut(&mut self, collection: Collection) -> &mut CollectionConfig {
        match collection {
            Collection::Tournaments => &mut self.tournaments,
            Collection::Stages => &mut self.stages,
            Collection::Tours => &mut self.tours,
            Collection::Teams => &mut self.teams,
            Collection::Captains => &mut self.captains,
            Collection::Matches => &mut self.matches,
        }
    }

    /// Retry policy applied to every page read.
    pub fn retry(&self) -> RetryPolicy {
        self.retry
    }

    /// Lifetime of a cached collection snapshot.
    pub fn collection_ttl(&self) -> Duration {
        self.collection_ttl
    }

    /// Lifetime of a cached leaderboard.
    pub fn team_stats_ttl(&self) -> Duration {
        self.team_stats_ttl
    }

    /// Upper bound on the remote half of an optimistic command.
    pub fn command_timeout(&self) -> Option<Duration> {
        self.command_timeout
    }

    /// Replace the retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Replace the fetch profile of one collection.
    pub fn with_fetch(mut self, collection: Collection, fetch: FetchOptions) -> Self {
        self.collection_mut(collection).fetch = fetch;
        self
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            tournaments: CollectionConfig::default_for(Collection::Tournaments),
            stages: CollectionConfig::default_for(Collection::Stages),
            tours: CollectionConfig::default_for(Collection::Tours),
            teams: CollectionConfig::default_for(Collection::Teams),
            captains: CollectionConfig::default_for(Collection::Captains),
            matches: CollectionConfig::default_for(Collection::Matches),
            retry: RetryPolicy::default(),
            collection_ttl: DEFAULT_COLLECTION_TTL,
            team_stats_ttl: DEFAULT_TEAM_STATS_TTL,
            command_timeout: Some(DEFAULT_COMMAND_TIMEOUT),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    #[serde(default)]
    collections: RawCollections,
    #[serde(default)]
    retry: Option<RawRetry>,
    #[serde(default)]
    cache: Option<RawCache>,
    #[serde(default)]
    command_timeout_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawCollections {
    tournaments: Option<RawCollection>,
    stages: Option<RawCollection>,
    tours: Option<RawCollection>,
    teams: Option<RawCollection>,
    captains: Option<RawCollection>,
    matches: Option<RawCollection>,
}

impl RawCollections {
    fn take(&mut self, collection: Collection) -> Option<RawCollection> {
        match collection {
            Collection::Tournaments => self.tournaments.take(),
            Collection::Stages => self.stages.take(),
            Collection::Tours => self.tours.take(),
            Collection::Teams => self.teams.take(),
            Collection::Captains => self.captains.take(),
            Collection::Matches => self.matches.take(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
/// JSON representation of one collection entry; omitted fields keep their default.
struct RawCollection {
    table: Option<String>,
    page_size: Option<u32>,
    parallelism: Option<u32>,
    max_pages: Option<u32>,
    /// `0` disables the pause.
    batch_pause_ms: Option<u64>,
}

impl RawCollection {
    fn apply(self, target: &mut CollectionConfig) {
        if let Some(table) = self.table.filter(|table| !table.is_empty()) {
            target.table = table;
        }
        if let Some(page_size) = self.page_size {
            target.fetch.page_size = page_size.max(1);
        }
        if let Some(parallelism) = self.parallelism {
            target.fetch.parallelism = parallelism;
        }
        if let Some(max_pages) = self.max_pages {
            target.fetch.max_pages = max_pages;
        }
        if let Some(pause) = self.batch_pause_ms {
            target.fetch.batch_pause = (pause > 0).then(|| Duration::from_millis(pause));
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawRetry {
    max_attempts: u32,
    base_delay_ms: u64,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawCache {
    collections_ttl_secs: Option<u64>,
    team_stats_ttl_secs: Option<u64>,
}

impl From<RawConfig> for AppConfig {
    fn from(mut value: RawConfig) -> Self {
        let mut config = Self::default();

        for collection in Collection::ALL {
            if let Some(raw) = value.collections.take(collection) {
                raw.apply(config.collection_mut(collection));
            }
        }

        if let Some(retry) = value.retry {
            config.retry = RetryPolicy::new(
                retry.max_attempts,
                Duration::from_millis(retry.base_delay_ms),
            );
        }

        if let Some(cache) = value.cache {
            if let Some(secs) = cache.collections_ttl_secs {
                config.collection_ttl = Duration::from_secs(secs);
            }
            if let Some(secs) = cache.team_stats_ttl_secs {
                config.team_stats_ttl = Duration::from_secs(secs);
            }
        }

        if let Some(ms) = value.command_timeout_ms {
            config.command_timeout = (ms > 0).then(|| Duration::from_millis(ms));
        }

        config
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}
