//! Delivery Pipeline Module
//!
//! ```text
//! producer ──enqueue(batch)──▶ [ bounded queue ] ──▶ worker ──▶ FactSink
//!     │                                                  │
//!     └── latch.add(len) ── CompletionLatch ◀── done() ──┘
//! ```
//!
//! One pipeline owns one queue, one worker and one completion latch. The
//! latch is counted up before a batch is pushed and down after each attempt,
//! so `wait()` returns only once everything enqueued so far was tried.

mod delivery;
mod latch;
mod outcome;

pub use delivery::{DeliveryPipeline, PipelineError};
pub use latch::CompletionLatch;
pub use outcome::{DeliveryOutcome, DeliveryStats};
