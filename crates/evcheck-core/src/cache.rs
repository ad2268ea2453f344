//! Narrow cache port abstracting any backing store (C4).

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("cache backend error: {0}")]
    Backend(String),
    #[error("serialization error: {0}")]
    Codec(#[from] crate::codec::CodecError),
}

/// `Get`/`Set` over an opaque key. `get` distinguishes a miss (`Ok(None)`)
/// from a backend error; there is no TTL or invalidation surface here, and
/// implementations may serialize values however they like as long as they
/// round-trip (see [`crate::codec`]).
#[async_trait]
pub trait Cache<V>: Send + Sync
where
    V: Serialize + DeserializeOwned + Send + Sync,
{
    async fn get(&self, key: &str) -> Result<Option<V>, CacheError>;
    async fn set(&self, key: &str, value: &V) -> Result<(), CacheError>;
}
