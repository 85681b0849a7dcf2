//! Network utilities: the shared HTTP client used for upstream forwards,
//! PromQL instant queries and health probes.

pub mod http;

pub use http::get_shared_client;
