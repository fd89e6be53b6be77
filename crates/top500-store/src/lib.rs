//! Coordination layer: static shard partition plus an advisory store of
//! processed ids and cached records shared between workers.

mod error;
pub use error::StoreError;

mod memory;
pub use memory::MemoryStore;

pub mod shard;
pub use shard::{ShardCoordinator, ShardPlan};

#[cfg(feature = "redis")]
mod redis_store;
#[cfg(feature = "redis")]
pub use redis_store::RedisStore;

use async_trait::async_trait;
use top500_core::{Record, SystemId};

/// Key marking a system id as processed.
pub fn marker_key(id: SystemId) -> String {
    format!("top500-done-{id}")
}

/// Key holding the cached record JSON of a system id.
pub fn record_key(id: SystemId) -> String {
    format!("top500-sys-{id}")
}

/// Best-effort state shared across workers.
///
/// Nothing here is a correctness guarantee: two workers may race on the same
/// id, and callers treat every error as "no information".
#[async_trait]
pub trait ShardStore: Send + Sync {
    async fn is_processed(&self, id: SystemId) -> Result<bool, StoreError>;
    async fn mark_processed(&self, id: SystemId) -> Result<(), StoreError>;
    async fn cached_record(&self, id: SystemId) -> Result<Option<Record>, StoreError>;
    async fn cache_record(&self, record: &Record) -> Result<(), StoreError>;
}
