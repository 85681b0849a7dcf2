//! Global `tracing` subscriber setup.
//!
//! The gateway logs through `tracing`; `main.rs` and the integration test
//! harness both call `init_tracing` so format and filtering stay in one
//! place.

use tracing_subscriber::EnvFilter;

/// Initialize the global `tracing` subscriber.
///
/// Honors `RUST_LOG` if set (default `info`), logs JSON when
/// `GATEWAY_LOG_FORMAT=json` is set in the environment, otherwise a
/// human-readable compact format suitable for a terminal.
pub fn init_tracing() {
    let json_format = std::env::var("GATEWAY_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    // `.json()` and `.compact()` return distinct builder types, so each
    // branch has to finish its own chain rather than share one `subscriber`
    // binding.
    if json_format {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_thread_ids(false)
            .json()
            .try_init();
    } else {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_thread_ids(false)
            .compact()
            .try_init();
    }
}
