//! Prometheus metrics for tiered source caches

use prometheus::{register_int_counter_with_registry, IntCounter, Opts, Registry};

/// Multi-tier lookup counters
///
/// Shared by every view of one [`crate::infrastructure::MultiTierCache`].
#[derive(Clone)]
pub struct TierMetrics {
    pub fast_hits: IntCounter,
    pub slow_hits: IntCounter,
    pub misses: IntCounter,
    pub read_repairs: IntCounter,
}

impl TierMetrics {
    pub fn new(registry: &Registry) -> prometheus::Result<Self> {
        Ok(Self {
            fast_hits: register_int_counter_with_registry!(
                Opts::new("source_cache_fast_hits_total", "Fast tier hits"),
                registry
            )?,
            slow_hits: register_int_counter_with_registry!(
                Opts::new("source_cache_slow_hits_total", "Slow tier hits"),
                registry
            )?,
            misses: register_int_counter_with_registry!(
                Opts::new("source_cache_misses_total", "Misses in both tiers"),
                registry
            )?,
            read_repairs: register_int_counter_with_registry!(
                Opts::new(
                    "source_cache_read_repairs_total",
                    "Slow tier hits copied into the fast tier"
                ),
                registry
            )?,
        })
    }

    pub fn hit_rate(&self) -> f64 {
        let hits = (self.fast_hits.get() + self.slow_hits.get()) as f64;
        let total = hits + self.misses.get() as f64;
        if total > 0.0 {
            hits / total
        } else {
            0.0
        }
    }
}
