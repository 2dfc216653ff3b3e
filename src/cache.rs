use async_trait::async_trait;
use redis::{AsyncCommands, aio::ConnectionManager};
use serde::Deserialize;
use serde_json::Value;
use std::{collections::HashMap, sync::Arc};

/// StatsKey
///
/// The precomputed statistics blobs this service can read. The blobs are
/// written by periodic jobs elsewhere; the path segment is what the dashboard
/// requests, `cache_key` is where the blob lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StatsKey {
    Tags,
    Sounds,
    ActiveUsers,
    Users,
    Downloads,
    Donations,
    Totals,
}

impl StatsKey {
    pub const ALL: [StatsKey; 7] = [
        StatsKey::Tags,
        StatsKey::Sounds,
        StatsKey::ActiveUsers,
        StatsKey::Users,
        StatsKey::Downloads,
        StatsKey::Donations,
        StatsKey::Totals,
    ];

    pub fn cache_key(self) -> &'static str {
        match self {
            StatsKey::Tags => "tags_stats",
            StatsKey::Sounds => "sounds_stats",
            StatsKey::ActiveUsers => "active_users_stats",
            StatsKey::Users => "users_stats",
            StatsKey::Downloads => "downloads_stats",
            StatsKey::Donations => "donations_stats",
            StatsKey::Totals => "totals_stats",
        }
    }

    /// Path segment under `/monitor/stats/`.
    pub fn slug(self) -> &'static str {
        match self {
            StatsKey::Tags => "tags",
            StatsKey::Sounds => "sounds",
            StatsKey::ActiveUsers => "active-users",
            StatsKey::Users => "users",
            StatsKey::Downloads => "downloads",
            StatsKey::Donations => "donations",
            StatsKey::Totals => "totals",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),
    #[error("cached value under {key} is not valid JSON: {source}")]
    Decode {
        key: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// StatsStore
///
/// Read-only view of the shared statistics cache. `Ok(None)` is a plain miss.
#[async_trait]
pub trait StatsStore: Send + Sync {
    async fn get(&self, key: StatsKey) -> Result<Option<Value>, CacheError>;
}

/// StatsState
///
/// The concrete type used to share the statistics cache across the application state.
pub type StatsState = Arc<dyn StatsStore>;

/// RedisStatsStore
///
/// Blobs are stored as JSON strings under their cache key.
#[derive(Clone)]
pub struct RedisStatsStore {
    conn: ConnectionManager,
}

impl RedisStatsStore {
    pub async fn connect(url: &str) -> Result<Self, redis::RedisError> {
        let client = redis::Client::open(url)?;
        let conn = ConnectionManager::new(client).await?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl StatsStore for RedisStatsStore {
    async fn get(&self, key: StatsKey) -> Result<Option<Value>, CacheError> {
        // ConnectionManager is a cheap handle; commands need it mutably.
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn.get(key.cache_key()).await?;

        match raw {
            Some(raw) => serde_json::from_str(&raw)
                .map(Some)
                .map_err(|source| CacheError::Decode {
                    key: key.cache_key(),
                    source,
                }),
            None => {
                tracing::debug!(key = key.cache_key(), "statistics cache miss");
                Ok(None)
            }
        }
    }
}

/// InMemoryStatsStore
///
/// A fixed map of blobs, for tests and for running the dashboard without Redis.
#[derive(Clone, Default)]
pub struct InMemoryStatsStore {
    values: HashMap<StatsKey, Value>,
}

impl InMemoryStatsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: StatsKey, value: Value) -> Self {
        self.values.insert(key, value);
        self
    }
}

#[async_trait]
impl StatsStore for InMemoryStatsStore {
    async fn get(&self, key: StatsKey) -> Result<Option<Value>, CacheError> {
        Ok(self.values.get(&key).cloned())
    }
}
