//! Per-fact delivery results and running totals.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::transport::TransportError;
use crate::types::Fact;

/// Result of one delivery attempt, published by the worker.
#[derive(Debug)]
pub struct DeliveryOutcome {
    pub fact: Fact,
    pub result: Result<(), TransportError>,
}

impl DeliveryOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Snapshot of pipeline counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryStats {
    /// Facts accepted by `enqueue`
    pub enqueued: u64,
    /// Facts the remote service acknowledged with 200
    pub delivered: u64,
    /// Facts whose single attempt failed
    pub failed: u64,
}

impl DeliveryStats {
    /// Facts attempted so far, successful or not.
    pub const fn attempted(&self) -> u64 {
        self.delivered + self.failed
    }
}

impl std::fmt::Display for DeliveryStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Delivery: {} enqueued, {} delivered, {} failed",
            self.enqueued, self.delivered, self.failed
        )
    }
}

#[derive(Debug, Default)]
pub(crate) struct DeliveryCounters {
    enqueued: AtomicU64,
    delivered: AtomicU64,
    failed: AtomicU64,
}

impl DeliveryCounters {
    pub(crate) fn record_enqueued(&self, n: u64) {
        self.enqueued.fetch_add(n, Ordering::Relaxed);
    }

    /// Take back facts that were counted but never reached the worker.
    pub(crate) fn retract_enqueued(&self, n: u64) {
        self.enqueued.fetch_sub(n, Ordering::Relaxed);
    }

    pub(crate) fn record_result(&self, result: &Result<(), TransportError>) {
        let counter = if result.is_ok() { &self.delivered } else { &self.failed };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> DeliveryStats {
        DeliveryStats {
            enqueued: self.enqueued.load(Ordering::Relaxed),
            delivered: self.delivered.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_snapshot() {
        let counters = DeliveryCounters::default();
        counters.record_enqueued(3);
        counters.record_result(&Ok(()));
        counters.record_result(&Ok(()));
        counters.record_result(&Err(TransportError::Rejected(
            reqwest::StatusCode::SERVICE_UNAVAILABLE,
        )));

        let stats = counters.snapshot();
        assert_eq!(stats, DeliveryStats { enqueued: 3, delivered: 2, failed: 1 });
        assert_eq!(stats.attempted(), 3);
        assert_eq!(stats.to_string(), "Delivery: 3 enqueued, 2 delivered, 1 failed");
    }

    #[test]
    fn test_retract_enqueued() {
        let counters = DeliveryCounters::default();
        counters.record_enqueued(5);
        counters.retract_enqueued(2);
        assert_eq!(counters.snapshot().enqueued, 3);
    }
}
