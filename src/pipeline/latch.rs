//! Completion latch - counts facts that were enqueued but not yet attempted.
//!
//! `add(n)` registers a batch before any of it is pushed, the worker calls
//! `done()` once per attempted fact, and `wait()` resolves when the count
//! is back to zero.

use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Notify;
use tracing::error;

#[derive(Debug, Default)]
pub struct CompletionLatch {
    outstanding: AtomicUsize,
    zero: Notify,
}

impl CompletionLatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `n` more outstanding items.
    pub fn add(&self, n: usize) {
        if n > 0 {
            self.outstanding.fetch_add(n, Ordering::AcqRel);
        }
    }

    /// Mark one item as attempted.
    pub fn done(&self) {
        self.release(1);
    }

    /// Mark `n` items as finished at once.
    ///
    /// Releasing more than is outstanding is a caller bug; it is logged and
    /// the counter is left untouched instead of wrapping.
    pub fn release(&self, n: usize) {
        if n == 0 {
            return;
        }
        let result = self
            .outstanding
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                current.checked_sub(n)
            });
        match result {
            Ok(previous) if previous == n => self.zero.notify_waiters(),
            Ok(_) => {}
            Err(current) => {
                error!(outstanding = current, released = n, "Completion latch released below zero");
            }
        }
    }

    /// Items registered but not yet attempted.
    pub fn outstanding(&self) -> usize {
        self.outstanding.load(Ordering::Acquire)
    }

    /// Wait until every registered item has been attempted.
    ///
    /// Returns immediately when nothing is outstanding.
    pub async fn wait(&self) {
        loop {
            let notified = self.zero.notified();
            tokio::pin!(notified);
            // Register before checking so a release in between still wakes us.
            notified.as_mut().enable();
            if self.outstanding() == 0 {
                return;
            }
            notified.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tokio_test::{assert_pending, assert_ready, task};

    #[test]
    fn test_wait_ready_when_empty() {
        let latch = CompletionLatch::new();
        let mut waiter = task::spawn(latch.wait());
        assert_ready!(waiter.poll());
    }

    #[test]
    fn test_wait_pending_until_all_done() {
        let latch = CompletionLatch::new();
        latch.add(2);

        let mut waiter = task::spawn(latch.wait());
        assert_pending!(waiter.poll());

        latch.done();
        assert_pending!(waiter.poll());
        assert_eq!(latch.outstanding(), 1);

        latch.done();
        assert!(waiter.is_woken());
        assert_ready!(waiter.poll());
        assert_eq!(latch.outstanding(), 0);
    }

    #[test]
    fn test_batches_accumulate() {
        let latch = CompletionLatch::new();
        latch.add(5);
        latch.add(3);
        assert_eq!(latch.outstanding(), 8);

        let mut waiter = task::spawn(latch.wait());
        for _ in 0..7 {
            latch.done();
        }
        assert_pending!(waiter.poll());
        latch.done();
        assert_ready!(waiter.poll());
    }

    #[test]
    fn test_release_below_zero_is_ignored() {
        let latch = CompletionLatch::new();
        latch.add(1);
        latch.release(3);
        assert_eq!(latch.outstanding(), 1);
        latch.done();
        latch.done();
        assert_eq!(latch.outstanding(), 0);
    }

    #[test]
    fn test_release_many_wakes_waiter() {
        let latch = CompletionLatch::new();
        latch.add(4);
        let mut waiter = task::spawn(latch.wait());
        assert_pending!(waiter.poll());
        latch.release(4);
        assert!(waiter.is_woken());
        assert_ready!(waiter.poll());
    }

    #[tokio::test]
    async fn test_wait_across_tasks() {
        let latch = Arc::new(CompletionLatch::new());
        latch.add(10);

        let worker = {
            let latch = Arc::clone(&latch);
            tokio::spawn(async move {
                for _ in 0..10 {
                    tokio::task::yield_now().await;
                    latch.done();
                }
            })
        };

        latch.wait().await;
        assert_eq!(latch.outstanding(), 0);
        worker.await.unwrap();
    }
}
