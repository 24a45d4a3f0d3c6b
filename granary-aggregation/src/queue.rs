//! Concurrency-safe handoff buffer between expiry and export.

use std::mem;
use std::sync::Mutex;

use crate::collect::TimeBucket;

/// A FIFO buffer of flushed buckets, decoupling the periodic expiry scan
/// from the periodic export cycle and absorbing bursts from either side.
///
/// Unlike the collector, the queue is internally synchronized: `push` and
/// `pop_all` hold an exclusive lock for their whole critical section and
/// are safe to call from arbitrary threads.
///
/// The buffer is unbounded. The expectation is that an exporter drains it
/// frequently enough that it never grows meaningfully; a bounded buffer
/// with a drop-oldest policy would be the production hardening if that
/// expectation ever breaks.
#[derive(Debug, Default)]
pub struct BucketQueue {
    buckets: Mutex<Vec<TimeBucket>>,
}

impl BucketQueue {
    /// Create an empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Append flushed buckets to the buffer, preserving their order
    pub fn push(&self, buckets: Vec<TimeBucket>) {
        self.buckets.lock().unwrap().extend(buckets);
    }

    /// Take every buffered bucket, leaving the queue empty.
    ///
    /// The internal buffer is swapped out rather than copied, so draining
    /// is O(1) regardless of queue size, and the replacement buffer is
    /// ready for the next `push`. The returned buckets are owned
    /// exclusively by the caller.
    pub fn pop_all(&self) -> Vec<TimeBucket> {
        mem::take(&mut *self.buckets.lock().unwrap())
    }
}
