//! Single-producer single-consumer sample queue
//!
//! The receiver thread pushes, the consumer pops. Each queue has its own lock
//! so parameters and constants never contend with each other.

use parking_lot::Mutex;
use std::collections::VecDeque;

/// FIFO guarded by a `parking_lot::Mutex`
#[derive(Debug)]
pub struct SampleQueue<T> {
    inner: Mutex<VecDeque<T>>,
}

impl<T> SampleQueue<T> {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(VecDeque::new()),
        }
    }

    /// Append to the back
    pub fn push(&self, sample: T) {
        self.inner.lock().push_back(sample);
    }

    /// Remove from the front
    pub fn pop(&self) -> Option<T> {
        self.inner.lock().pop_front()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// Drop everything queued
    pub fn clear(&self) {
        self.inner.lock().clear();
    }
}

impl<T> Default for SampleQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}
