use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid shard: offset {offset} with modulus {modulus}")]
    InvalidShard { modulus: u32, offset: u32 },

    #[cfg(feature = "redis")]
    #[error("redis error: {0}")]
    Redis(#[from] ::redis::RedisError),

    #[error("cached record is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}
