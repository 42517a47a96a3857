// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The two queues behind the scheduler: bounded (free slots) and
//! unbounded (waiting tasks).

use std::collections::VecDeque;
use std::sync::Mutex;

struct Bounded<T> {
    items: VecDeque<T>,
    capacity: usize,
}

/// A mutex-guarded bounded queue.
///
/// `try_push` refuses once the queue is full, and in particular once
/// [`BoundedQueue::set_capacity`] has dropped the capacity to zero: that
/// is the scheduler's shutdown signal, after which no slot may re-enter
/// circulation. Push and pop are mutually atomic.
pub struct BoundedQueue<T> {
    state: Mutex<Bounded<T>>,
}

impl<T> BoundedQueue<T> {
    /// Creates an empty queue accepting up to `capacity` items.
    pub fn new(capacity: usize) -> Self {
        Self {
            state: Mutex::new(Bounded {
                items: VecDeque::with_capacity(capacity),
                capacity,
            }),
        }
    }

    /// Attempts to enqueue `value`. Returns `false` when the queue is at
    /// capacity (always the case once capacity is zero).
    pub fn try_push(&self, value: T) -> bool {
        let mut state = self.state.lock().expect("bounded queue lock poisoned");
        if state.items.len() >= state.capacity {
            return false;
        }
        state.items.push_back(value);
        true
    }

    /// Removes and returns the oldest item, if any. Never blocks.
    pub fn try_pop(&self) -> Option<T> {
        self.state
            .lock()
            .expect("bounded queue lock poisoned")
            .items
            .pop_front()
    }

    /// Reconfigures the accept limit. Items already queued stay; a
    /// capacity of zero refuses every further push.
    pub fn set_capacity(&self, capacity: usize) {
        self.state
            .lock()
            .expect("bounded queue lock poisoned")
            .capacity = capacity;
    }

    /// Number of items currently queued.
    pub fn len(&self) -> usize {
        self.state
            .lock()
            .expect("bounded queue lock poisoned")
            .items
            .len()
    }

    /// Whether the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A mutex-guarded unbounded FIFO.
///
/// Holds work items waiting for a free slot. `push` never refuses;
/// ordering is strict arrival order.
pub struct TaskQueue<T> {
    items: Mutex<VecDeque<T>>,
}

impl<T> TaskQueue<T> {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self {
            items: Mutex::new(VecDeque::new()),
        }
    }

    /// Enqueues `value`.
    pub fn push(&self, value: T) {
        self.items
            .lock()
            .expect("task queue lock poisoned")
            .push_back(value);
    }

    /// Removes and returns the oldest item, if any. Never blocks.
    pub fn try_pop(&self) -> Option<T> {
        self.items
            .lock()
            .expect("task queue lock poisoned")
            .pop_front()
    }

    /// Number of waiting items.
    pub fn len(&self) -> usize {
        self.items.lock().expect("task queue lock poisoned").len()
    }

    /// Whether the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drains and returns everything currently queued. Used at teardown
    /// so dropped tasks can fail their owners instead of leaking.
    pub fn drain(&self) -> Vec<T> {
        self.items
            .lock()
            .expect("task queue lock poisoned")
            .drain(..)
            .collect()
    }
}

impl<T> Default for TaskQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounded_push_pop() {
        let q = BoundedQueue::new(2);
        assert!(q.try_push(1));
        assert!(q.try_push(2));
        assert!(!q.try_push(3));
        assert_eq!(q.try_pop(), Some(1));
        assert!(q.try_push(3));
        assert_eq!(q.try_pop(), Some(2));
        assert_eq!(q.try_pop(), Some(3));
        assert_eq!(q.try_pop(), None);
    }

    #[test]
    fn test_bounded_zero_capacity_refuses() {
        let q = BoundedQueue::new(2);
        assert!(q.try_push(1));
        q.set_capacity(0);
        assert!(!q.try_push(2));
        // Items queued before the capacity change remain poppable.
        assert_eq!(q.try_pop(), Some(1));
        assert_eq!(q.try_pop(), None);
    }

    #[test]
    fn test_bounded_capacity_raise() {
        let q = BoundedQueue::new(1);
        assert!(q.try_push(1));
        assert!(!q.try_push(2));
        q.set_capacity(2);
        assert!(q.try_push(2));
        assert_eq!(q.len(), 2);
    }

    #[test]
    fn test_task_queue_fifo_order() {
        let q = TaskQueue::new();
        for i in 0..5 {
            q.push(i);
        }
        for i in 0..5 {
            assert_eq!(q.try_pop(), Some(i));
        }
        assert!(q.is_empty());
    }

    #[test]
    fn test_task_queue_drain() {
        let q = TaskQueue::new();
        q.push("a");
        q.push("b");
        assert_eq!(q.drain(), vec!["a", "b"]);
        assert!(q.is_empty());
    }

    #[test]
    fn test_bounded_concurrent_push_pop() {
        use std::sync::Arc;

        let q = Arc::new(BoundedQueue::new(4));
        for i in 0..4 {
            assert!(q.try_push(i));
        }

        let mut handles = Vec::new();
        for _ in 0..4 {
            let q = Arc::clone(&q);
            handles.push(std::thread::spawn(move || {
                // Each thread cycles items through the queue.
                for _ in 0..1000 {
                    if let Some(v) = q.try_pop() {
                        assert!(q.try_push(v));
                    }
                }
            }));
        }
        for h in handles {
            h.join().unwrap();
        }
        // Every item is back: nothing lost, nothing duplicated.
        assert_eq!(q.len(), 4);
        let mut items: Vec<_> = std::iter::from_fn(|| q.try_pop()).collect();
        items.sort();
        assert_eq!(items, vec![0, 1, 2, 3]);
    }
}
