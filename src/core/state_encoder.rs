//! State Encoder (C3): maps one instance's raw telemetry onto the fixed-width
//! binned tuple the Q-table keys on.
//!
//! Binning is pure and total: every `f64` maps to some `State`, including
//! NaN and negative inputs (bin 0, counted as invalid for observability).

use crate::config::models::{BinConfig, BinWidthsConfig};
use crate::core::types::{InstanceMetrics, State, ZERO_STATE};
use parking_lot::Mutex;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

const CACHE_CAPACITY: usize = 4096;
const CACHE_TTL: Duration = Duration::from_secs(5);

/// Rounds a metric tuple to four decimal places and hashes it into a cache
/// key, so near-identical repeated polls of the same instance hit the cache
/// instead of re-binning.
fn cache_key(m: &InstanceMetrics) -> u64 {
    let mut hasher = DefaultHasher::new();
    for v in [
        m.cpu_pct,
        m.mem_pct,
        m.avg_latency_ms,
        m.error_rate_pct,
        m.reqs_per_sec,
    ] {
        let rounded = (v * 10_000.0).round() as i64;
        rounded.hash(&mut hasher);
    }
    hasher.finish()
}

/// `bin = min(maxBin, max(0, floor(x / width)))`. NaN or negative `x` is
/// out of range: it maps to bin 0 and the caller is told so it can bump the
/// invalid-input counter.
fn bin_one(x: f64, cfg: BinConfig) -> (u8, bool) {
    if !x.is_finite() || x < 0.0 {
        return (0, true);
    }
    let raw = (x / cfg.width).floor();
    let clamped = raw.clamp(0.0, cfg.max_bin as f64);
    (clamped as u8, false)
}

/// Pure binning function, state-free. Exposed separately from
/// `StateEncoder::encode` so callers that don't need caching (tests, the
/// benchmark harness) can call it directly.
pub fn encode_metrics(m: &InstanceMetrics, widths: &BinWidthsConfig) -> (State, u32) {
    let (cpu, cpu_bad) = bin_one(m.cpu_pct, widths.cpu);
    let (mem, mem_bad) = bin_one(m.mem_pct, widths.mem);
    let (lat, lat_bad) = bin_one(m.avg_latency_ms, widths.latency_ms);
    let (err, err_bad) = bin_one(m.error_rate_pct, widths.error_rate);
    let (rps, rps_bad) = bin_one(m.reqs_per_sec, widths.reqs_per_sec);
    let invalid = [cpu_bad, mem_bad, lat_bad, err_bad, rps_bad]
        .iter()
        .filter(|b| **b)
        .count() as u32;
    ((cpu, mem, lat, err, rps), invalid)
}

struct CacheEntry {
    state: State,
    stamped: Instant,
}

/// Binning cache keyed on the rounded metric tuple, TTL 5s.
///
/// The metrics view (C2) already caches the raw telemetry for ~1s; this
/// cache sits above it and absorbs repeated encodes of the same values
/// across a burst of `/decide` calls (§4.3 "a short-lived cache avoids
/// re-binning identical metric tuples").
pub struct StateEncoder {
    widths: BinWidthsConfig,
    cache: Mutex<lru::LruCache<u64, CacheEntry>>,
    invalid_inputs_total: AtomicU64,
}

impl StateEncoder {
    pub fn new(widths: BinWidthsConfig) -> Self {
        Self {
            widths,
            cache: Mutex::new(lru::LruCache::new(
                NonZeroUsize::new(CACHE_CAPACITY).expect("nonzero cache capacity"),
            )),
            invalid_inputs_total: AtomicU64::new(0),
        }
    }

    /// If the metrics view is circuit-broken, the caller should skip the
    /// encoder entirely and use `ZERO_STATE` ("unknown -> explore").
    pub fn unknown_state() -> State {
        ZERO_STATE
    }

    pub fn encode(&self, metrics: &InstanceMetrics) -> State {
        let key = cache_key(metrics);

        {
            let mut cache = self.cache.lock();
            if let Some(entry) = cache.get(&key) {
                if entry.stamped.elapsed() < CACHE_TTL {
                    return entry.state;
                }
            }
        }

        let (state, invalid) = encode_metrics(metrics, &self.widths);
        if invalid > 0 {
            self.invalid_inputs_total
                .fetch_add(invalid as u64, Ordering::Relaxed);
        }

        self.cache.lock().put(
            key,
            CacheEntry {
                state,
                stamped: Instant::now(),
            },
        );
        state
    }

    pub fn invalid_inputs_total(&self) -> u64 {
        self.invalid_inputs_total.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn widths() -> BinWidthsConfig {
        BinWidthsConfig::default()
    }

    fn metrics(cpu: f64, mem: f64, lat: f64, err: f64, rps: f64) -> InstanceMetrics {
        InstanceMetrics {
            cpu_pct: cpu,
            mem_pct: mem,
            avg_latency_ms: lat,
            error_rate_pct: err,
            reqs_per_sec: rps,
            uptime_sec: 0.0,
            unavailable: false,
        }
    }

    #[test]
    fn bins_mid_range_values() {
        let (state, invalid) = encode_metrics(&metrics(30.0, 40.0, 60.0, 0.0, 20.0), &widths());
        assert_eq!(state, (1, 1, 0, 0, 0));
        assert_eq!(invalid, 0);
    }

    #[test]
    fn clamps_at_the_boundary() {
        // latency=400.0 with width 100 -> floor(4.0) -> bin 4, the max bin.
        let (state, _) = encode_metrics(&metrics(0.0, 0.0, 400.0, 0.0, 0.0), &widths());
        assert_eq!(state.2, 4);
    }

    #[test]
    fn saturates_above_the_max_bin() {
        let (state, _) = encode_metrics(&metrics(1_000.0, 0.0, 0.0, 0.0, 0.0), &widths());
        assert_eq!(state.0, 4);
    }

    #[test]
    fn nan_and_negative_inputs_are_invalid_and_map_to_bin_zero() {
        let (state, invalid) = encode_metrics(&metrics(f64::NAN, -5.0, 0.0, 0.0, 0.0), &widths());
        assert_eq!(state.0, 0);
        assert_eq!(state.1, 0);
        assert_eq!(invalid, 2);
    }

    #[test]
    fn caches_repeated_encodes() {
        let encoder = StateEncoder::new(widths());
        let m = metrics(30.0, 40.0, 60.0, 0.0, 20.0);
        let first = encoder.encode(&m);
        let second = encoder.encode(&m);
        assert_eq!(first, second);
    }

    #[test]
    fn invalid_counter_accumulates_across_encodes() {
        let encoder = StateEncoder::new(widths());
        encoder.encode(&metrics(f64::NAN, 0.0, 0.0, 0.0, 0.0));
        encoder.encode(&metrics(f64::NAN, 0.001, 0.0, 0.0, 0.0));
        assert!(encoder.invalid_inputs_total() >= 2);
    }
}
