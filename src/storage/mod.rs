//! Storage layer.
//!
//! The only persistent backing store the gateway talks to is the registry's
//! Redis instance, and only read-only. Q-table persistence
//! is a local file, handled by `core::q_table` directly.

pub mod redis;

pub use redis::RedisRegistryStore;
