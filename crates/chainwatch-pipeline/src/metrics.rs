//! Pipeline counters.

use std::sync::atomic::{AtomicU64, Ordering};

/// Point-in-time copy of [`PipelineMetrics`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub received: u64,
    pub unmatched: u64,
    pub duplicates: u64,
    pub decode_errors: u64,
    pub enrichment_errors: u64,
    pub suppressed: u64,
    pub notified: u64,
    pub dispatch_failures: u64,
}

#[derive(Debug, Default)]
pub struct PipelineMetrics {
    pub(crate) received: AtomicU64,
    pub(crate) unmatched: AtomicU64,
    pub(crate) duplicates: AtomicU64,
    pub(crate) decode_errors: AtomicU64,
    pub(crate) enrichment_errors: AtomicU64,
    pub(crate) suppressed: AtomicU64,
    pub(crate) notified: AtomicU64,
    pub(crate) dispatch_failures: AtomicU64,
}

impl PipelineMetrics {
    pub(crate) fn incr(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let load = |c: &AtomicU64| c.load(Ordering::Relaxed);
        MetricsSnapshot {
            received: load(&self.received),
            unmatched: load(&self.unmatched),
            duplicates: load(&self.duplicates),
            decode_errors: load(&self.decode_errors),
            enrichment_errors: load(&self.enrichment_errors),
            suppressed: load(&self.suppressed),
            notified: load(&self.notified),
            dispatch_failures: load(&self.dispatch_failures),
        }
    }
}
