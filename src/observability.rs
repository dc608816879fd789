//! Tracing setup and listing counters

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing_subscriber::EnvFilter;

/// Install the global fmt subscriber, filtered by `RUST_LOG` (default `info`)
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Metrics handle for recording counters
#[derive(Debug, Default)]
pub struct Metrics {
    pages_served: AtomicU64,
    items_returned: AtomicU64,
    partition_failures: AtomicU64,
    cursor_resets: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page_served(&self, items: usize) {
        self.pages_served.fetch_add(1, Ordering::Relaxed);
        self.items_returned.fetch_add(items as u64, Ordering::Relaxed);
        tracing::debug!(counter = "pages_served", items, "Metric incremented");
    }

    pub fn partition_failed(&self) {
        self.partition_failures.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "partition_failures", "Metric incremented");
    }

    pub fn cursor_reset(&self) {
        self.cursor_resets.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "cursor_resets", "Metric incremented");
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            pages_served: self.pages_served.load(Ordering::Relaxed),
            items_returned: self.items_returned.load(Ordering::Relaxed),
            partition_failures: self.partition_failures.load(Ordering::Relaxed),
            cursor_resets: self.cursor_resets.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub pages_served: u64,
    pub items_returned: u64,
    pub partition_failures: u64,
    pub cursor_resets: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_accumulate() {
        let metrics = Metrics::new();
        metrics.page_served(18);
        metrics.page_served(2);
        metrics.partition_failed();
        metrics.cursor_reset();

        assert_eq!(
            metrics.snapshot(),
            MetricsSnapshot {
                pages_served: 2,
                items_returned: 20,
                partition_failures: 1,
                cursor_resets: 1,
            }
        );
    }
}
