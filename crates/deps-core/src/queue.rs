//! FIFO request queue with a single in-flight slot
//!
//! The queue never runs anything itself. [`RequestQueue::enqueue`] and
//! [`RequestQueue::complete`] hand back the item the caller must start next,
//! if any, so exactly one item is being serviced at a time.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug)]
struct QueueState<T> {
    pending: VecDeque<T>,
    in_flight: bool,
}

/// Serializes work items: one in flight, the rest waiting in order.
#[derive(Debug)]
pub struct RequestQueue<T> {
    state: Mutex<QueueState<T>>,
}

impl<T> RequestQueue<T> {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(QueueState {
                pending: VecDeque::new(),
                in_flight: false,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, QueueState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append `item`; returns the head to start if the queue was idle.
    pub fn enqueue(&self, item: T) -> Option<T> {
        let mut state = self.lock();
        state.pending.push_back(item);
        Self::process_next(&mut state)
    }

    /// Mark the in-flight item as finished; returns the next one to start.
    ///
    /// Call only after the finished item's completion continuation has run.
    pub fn complete(&self) -> Option<T> {
        let mut state = self.lock();
        state.in_flight = false;
        Self::process_next(&mut state)
    }

    fn process_next(state: &mut QueueState<T>) -> Option<T> {
        if state.in_flight {
            return None;
        }
        let next = state.pending.pop_front()?;
        state.in_flight = true;
        Some(next)
    }

    pub fn is_in_flight(&self) -> bool {
        self.lock().in_flight
    }

    /// Number of items waiting (excluding the one in flight).
    pub fn pending(&self) -> usize {
        self.lock().pending.len()
    }
}

impl<T> Default for RequestQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enqueue_on_idle_starts_immediately() {
        let queue = RequestQueue::new();
        assert_eq!(queue.enqueue(1), Some(1));
        assert!(queue.is_in_flight());
        assert_eq!(queue.pending(), 0);
    }

    #[test]
    fn test_enqueue_while_busy_waits() {
        let queue = RequestQueue::new();
        assert_eq!(queue.enqueue(1), Some(1));
        assert_eq!(queue.enqueue(2), None);
        assert_eq!(queue.enqueue(3), None);
        assert_eq!(queue.pending(), 2);
    }

    #[test]
    fn test_complete_hands_out_in_fifo_order() {
        let queue = RequestQueue::new();
        queue.enqueue("a");
        queue.enqueue("b");
        queue.enqueue("c");

        assert_eq!(queue.complete(), Some("b"));
        assert!(queue.is_in_flight());
        assert_eq!(queue.complete(), Some("c"));
        assert_eq!(queue.complete(), None);
        assert!(!queue.is_in_flight());
    }

    #[test]
    fn test_enqueue_after_drain_restarts() {
        let queue = RequestQueue::new();
        queue.enqueue(1);
        assert_eq!(queue.complete(), None);
        assert_eq!(queue.enqueue(2), Some(2));
    }

    #[test]
    fn test_concurrent_enqueue_starts_exactly_one() {
        use std::sync::Arc;
        use std::thread;

        let queue = Arc::new(RequestQueue::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let queue = Arc::clone(&queue);
                thread::spawn(move || queue.enqueue(i).is_some())
            })
            .collect();

        let started = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|started| *started)
            .count();

        assert_eq!(started, 1);
        assert_eq!(queue.pending(), 7);
    }
}
