//! Worker-to-consumer progress plumbing
//!
//! The only data-carrying paths from the training worker to its consumer:
//! [`ProgressChannel`] streams per-epoch snapshots, [`CompletionSlot`]
//! carries the single terminal outcome. The worker never mutates consumer
//! state directly.

use crate::training::EpochMetrics;
use parking_lot::Mutex;
use std::collections::VecDeque;

/// Single-producer / single-consumer queue of epoch snapshots.
///
/// `publish` never blocks the worker; the queue is unbounded, which is
/// acceptable because the epoch count is capped by `max_epochs`. `drain`
/// empties the queue in publish order on the consumer's own cadence.
#[derive(Debug, Default)]
pub struct ProgressChannel {
    queue: Mutex<VecDeque<EpochMetrics>>,
}

impl ProgressChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push one snapshot. Ownership transfers to the channel.
    pub fn publish(&self, metrics: EpochMetrics) {
        self.queue.lock().push_back(metrics);
    }

    /// Remove and return all queued snapshots in publish order.
    pub fn drain(&self) -> Vec<EpochMetrics> {
        self.queue.lock().drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.queue.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One-shot terminal signal from the worker.
///
/// The worker posts exactly once as its last act; the consumer takes the
/// value during polling (or discards it on stop).
#[derive(Debug, Default)]
pub struct CompletionSlot<T> {
    inner: Mutex<Option<T>>,
}

impl<T> CompletionSlot<T> {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(None),
        }
    }

    /// Post the terminal value. The first post wins.
    pub fn post(&self, value: T) {
        let mut slot = self.inner.lock();
        if slot.is_none() {
            *slot = Some(value);
        }
    }

    /// Take the value, leaving the slot empty.
    pub fn take(&self) -> Option<T> {
        self.inner.lock().take()
    }

    pub fn is_set(&self) -> bool {
        self.inner.lock().is_some()
    }
}
