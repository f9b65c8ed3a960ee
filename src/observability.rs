use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::info;

/// Relationship resolver counters
#[derive(Debug, Default)]
pub struct ResolverMetrics {
    pub links_created: AtomicU64,
    pub links_removed: AtomicU64,
    pub pivot_clears: AtomicU64,
    pub not_found: AtomicU64,
}

impl ResolverMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_link_created(&self) {
        self.links_created.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_links_removed(&self, count: u64) {
        self.links_removed.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_pivot_clear(&self) {
        self.pivot_clears.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_not_found(&self) {
        self.not_found.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_stats(&self) -> ResolverStats {
        ResolverStats {
            links_created: self.links_created.load(Ordering::Relaxed),
            links_removed: self.links_removed.load(Ordering::Relaxed),
            pivot_clears: self.pivot_clears.load(Ordering::Relaxed),
            not_found: self.not_found.load(Ordering::Relaxed),
        }
    }

    pub fn log_stats(&self) {
        let stats = self.get_stats();
        info!(
            "Resolver metrics: links_created={}, links_removed={}, pivot_clears={}, not_found={}",
            stats.links_created, stats.links_removed, stats.pivot_clears, stats.not_found
        );
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolverStats {
    pub links_created: u64,
    pub links_removed: u64,
    pub pivot_clears: u64,
    pub not_found: u64,
}

/// Global metrics instance
static RESOLVER_METRICS: std::sync::LazyLock<ResolverMetrics> =
    std::sync::LazyLock::new(ResolverMetrics::new);

pub fn resolver_metrics() -> &'static ResolverMetrics {
    &RESOLVER_METRICS
}

/// Time an operation and log its duration when finished
pub struct OperationTimer {
    operation: String,
    start: Instant,
}

impl OperationTimer {
    pub fn new(operation: &str) -> Self {
        Self {
            operation: operation.to_string(),
            start: Instant::now(),
        }
    }

    pub fn finish(self) {
        let duration = self.start.elapsed();
        info!(
            operation = %self.operation,
            duration_ms = duration.as_millis(),
            "Operation completed"
        );
    }
}
