//! Registry view (C1) configuration: the Redis-backed key-value store the
//! proxy polls for `service:*` instance records.

use serde::{Deserialize, Serialize};

fn default_redis_url() -> String {
    "redis://127.0.0.1:6379".to_string()
}

fn default_key_prefix() -> String {
    "service:".to_string()
}

fn default_poll_ms() -> u64 {
    15_000
}

fn default_staleness_multiplier() -> u32 {
    3
}

/// Registry backing-store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Redis connection URL for the registry backing store.
    #[serde(default = "default_redis_url")]
    pub redis_url: String,
    /// Key prefix matched by the poller (`service:*` by default).
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
    /// Poll period for the registry snapshot.
    #[serde(default = "default_poll_ms")]
    pub poll_ms: u64,
    /// A snapshot older than `poll_ms * staleness_multiplier` is flagged
    /// `REGISTRY_STALE`.
    #[serde(default = "default_staleness_multiplier")]
    pub staleness_multiplier: u32,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            redis_url: default_redis_url(),
            key_prefix: default_key_prefix(),
            poll_ms: default_poll_ms(),
            staleness_multiplier: default_staleness_multiplier(),
        }
    }
}

impl RegistryConfig {
    pub fn merge(mut self, other: Self) -> Self {
        if other.redis_url != default_redis_url() {
            self.redis_url = other.redis_url;
        }
        if other.key_prefix != default_key_prefix() {
            self.key_prefix = other.key_prefix;
        }
        if other.poll_ms != default_poll_ms() {
            self.poll_ms = other.poll_ms;
        }
        if other.staleness_multiplier != default_staleness_multiplier() {
            self.staleness_multiplier = other.staleness_multiplier;
        }
        self
    }
}
