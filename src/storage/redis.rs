//! Read-only Redis client backing the registry view (C1).
//!
//! The registry backing store is owned by an external producer;
//! this crate only ever reads it — `KEYS service:*` to discover instance
//! records, then `MGET` to pull their JSON payloads.

#![allow(dead_code)]

use crate::utils::error::{GatewayError, Result};
use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use tracing::{debug, info};

/// A lightweight, read-only Redis client.
///
/// Wraps a `ConnectionManager`, which reconnects transparently and is cheap
/// to clone, so every poll cycle of the registry poller can `.clone()` it
/// without holding a lock.
#[derive(Clone)]
pub struct RedisRegistryStore {
    conn: ConnectionManager,
    key_prefix: String,
}

impl RedisRegistryStore {
    /// Connect to Redis. `key_prefix` is the producer-side key namespace
    /// (`service:` by default); callers pass `<prefix>*` to `scan_keys`.
    pub async fn connect(redis_url: &str, key_prefix: &str) -> Result<Self> {
        info!("Connecting to registry backing store");
        let client = redis::Client::open(redis_url).map_err(GatewayError::Redis)?;
        let conn = client
            .get_connection_manager()
            .await
            .map_err(GatewayError::Redis)?;
        Ok(Self {
            conn,
            key_prefix: key_prefix.to_string(),
        })
    }

    /// List every key matching `<key_prefix>*`.
    pub async fn scan_keys(&self) -> Result<Vec<String>> {
        let pattern = format!("{}*", self.key_prefix);
        let mut conn = self.conn.clone();
        let keys: Vec<String> = conn.keys(&pattern).await.map_err(GatewayError::Redis)?;
        debug!("registry scan found {} keys matching {}", keys.len(), pattern);
        Ok(keys)
    }

    /// Fetch the raw JSON payload for each key, preserving order. Missing
    /// keys (deleted between `scan_keys` and this call) surface as `None`.
    pub async fn mget(&self, keys: &[String]) -> Result<Vec<Option<String>>> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        let mut conn = self.conn.clone();
        if keys.len() == 1 {
            let value: Option<String> = conn.get(&keys[0]).await.map_err(GatewayError::Redis)?;
            return Ok(vec![value]);
        }
        let values: Vec<Option<String>> = conn.mget(keys).await.map_err(GatewayError::Redis)?;
        Ok(values)
    }

    /// Cheap liveness check (`PING`).
    pub async fn health_check(&self) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(GatewayError::Redis)?;
        Ok(())
    }
}
