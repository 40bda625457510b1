//! The bounded handoff between the connection layer and command dispatch.

use std::sync::{Condvar, Mutex};

use concurrent_queue::{ConcurrentQueue, PushError};

/// A bounded multi-producer/multi-consumer queue.
///
/// Producers never block: adding to a full queue is a reported failure,
/// not backpressure. Consumers block until an item is available or the
/// queue has been shut down, at which point they drain whatever remains
/// and then observe `None`.
#[derive(Debug)]
pub struct DispatchQueue<T> {
    pending: ConcurrentQueue<T>,
    running: Mutex<bool>,
    available: Condvar,
}

impl<T> DispatchQueue<T> {
    /// Construct a queue with the given maximum number of pending items.
    pub fn new(max_len: usize) -> Self {
        Self {
            pending: ConcurrentQueue::bounded(max_len),
            running: Mutex::new(true),
            available: Condvar::new(),
        }
    }

    /// Add an item to the queue, if doing so does not exceed the maximum
    /// capacity.
    ///
    /// Returns `Ok(())` on success, and `Err(_)` containing the provided
    /// item if the queue is full.
    pub fn add(&self, item: T) -> Result<(), T> {
        match self.pending.push(item) {
            Ok(()) => {
                // Take the lock briefly so the wakeup cannot slip between a
                // consumer's empty check and its wait.
                drop(self.running.lock().unwrap());
                self.available.notify_one();
                Ok(())
            }
            Err(e) => Err(PushError::into_inner(e)),
        }
    }

    /// Retrieve an item, blocking while the queue is empty and running.
    ///
    /// Returns `None` only once the queue has been shut down and fully
    /// drained.
    pub fn next(&self) -> Option<T> {
        let mut running = self.running.lock().unwrap();
        loop {
            if let Ok(item) = self.pending.pop() {
                return Some(item);
            }
            if !*running {
                return None;
            }
            running = self.available.wait(running).unwrap();
        }
    }

    /// Clear the running flag and wake every blocked consumer so it drains
    /// and exits.
    pub fn shutdown(&self) {
        *self.running.lock().unwrap() = false;
        self.available.notify_all();
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
