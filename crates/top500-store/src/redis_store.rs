//! Redis-backed coordination store shared by every worker process.

use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::MultiplexedConnection;
use top500_core::{Record, SystemId};
use tracing::info;

use crate::{ShardStore, StoreError, marker_key, record_key};

/// Markers are `top500-done-<id> = 1` and cached records
/// `top500-sys-<id> = <json>`, neither with a TTL.
pub struct RedisStore {
    conn: MultiplexedConnection,
}

impl RedisStore {
    /// Connect to a Redis server, e.g. `redis://localhost:6379/0`.
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let client = redis::Client::open(url)?;
        let conn = client.get_multiplexed_async_connection().await?;
        info!(url, "connected to coordination store");
        Ok(Self { conn })
    }
}

#[async_trait]
impl ShardStore for RedisStore {
    async fn is_processed(&self, id: SystemId) -> Result<bool, StoreError> {
        let mut conn = self.conn.clone();
        let exists: bool = conn.exists(marker_key(id)).await?;
        Ok(exists)
    }

    async fn mark_processed(&self, id: SystemId) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        conn.set::<_, _, ()>(marker_key(id), 1).await?;
        Ok(())
    }

    async fn cached_record(&self, id: SystemId) -> Result<Option<Record>, StoreError> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn.get(record_key(id)).await?;
        Ok(raw.map(|r| serde_json::from_str(&r)).transpose()?)
    }

    async fn cache_record(&self, record: &Record) -> Result<(), StoreError> {
        let json = serde_json::to_string(record)?;
        let mut conn = self.conn.clone();
        conn.set::<_, _, ()>(record_key(record.id), json).await?;
        Ok(())
    }
}
