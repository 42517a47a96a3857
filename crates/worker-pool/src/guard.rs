// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! RAII guard that returns a slot to the idle queue on any exit path.
//!
//! Both the scheduling fast path and the completion callback run caller
//! code while holding a slot that is absent from the idle queue. If that
//! code unwinds, the slot must still re-enter circulation or the pool
//! shrinks permanently. The guard's drop handler marks the slot idle and
//! pushes its index back; the normal path calls [`IdleGuard::release`]
//! and performs the return (or hand-off) explicitly.

use crate::{BoundedQueue, SlotIndex, WorkerSlot};

/// Scoped return-to-idle obligation for one slot.
pub struct IdleGuard<'a> {
    slot: &'a WorkerSlot,
    index: SlotIndex,
    queue: Option<&'a BoundedQueue<SlotIndex>>,
}

impl<'a> IdleGuard<'a> {
    /// Creates a guard for a slot just removed from `queue`.
    pub fn new(slot: &'a WorkerSlot, index: SlotIndex, queue: &'a BoundedQueue<SlotIndex>) -> Self {
        Self {
            slot,
            index,
            queue: Some(queue),
        }
    }

    /// Defuses the guard and returns the queue, leaving the return to
    /// the caller. The push may still be refused at shutdown; that
    /// refusal is deliberate and final.
    pub fn release(mut self) -> &'a BoundedQueue<SlotIndex> {
        self.queue.take().expect("guard released twice")
    }
}

impl Drop for IdleGuard<'_> {
    fn drop(&mut self) {
        if let Some(queue) = self.queue.take() {
            self.slot.mark_idle();
            if !queue.try_push(self.index) {
                tracing::debug!(slot = self.index, "idle return refused during shutdown");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use backend_api::{BackendError, Blob, CompletionCallback, DeviceRequest, PerfCounter};
    use std::collections::BTreeMap;
    use std::sync::Arc;

    struct NullRequest;

    impl DeviceRequest for NullRequest {
        fn set_blob(&self, _name: &str, _blob: Blob) -> Result<(), BackendError> {
            Ok(())
        }
        fn get_blob(&self, name: &str) -> Result<Blob, BackendError> {
            Err(BackendError::NotFound(name.into()))
        }
        fn start_async(&self) -> Result<(), BackendError> {
            Ok(())
        }
        fn set_completion_callback(&self, _callback: CompletionCallback) {}
        fn performance_counts(&self) -> Result<BTreeMap<String, PerfCounter>, BackendError> {
            Ok(BTreeMap::new())
        }
    }

    #[test]
    fn test_drop_returns_slot() {
        let slot = WorkerSlot::new(Arc::new(NullRequest));
        let queue = BoundedQueue::new(1);

        {
            let _guard = IdleGuard::new(&slot, 0, &queue);
        }
        assert_eq!(queue.try_pop(), Some(0));
    }

    #[test]
    fn test_release_skips_return() {
        let slot = WorkerSlot::new(Arc::new(NullRequest));
        let queue = BoundedQueue::new(1);

        let guard = IdleGuard::new(&slot, 0, &queue);
        let returned = guard.release();
        assert!(returned.is_empty());
    }

    #[test]
    fn test_drop_marks_slot_idle() {
        let slot = WorkerSlot::new(Arc::new(NullRequest));
        slot.arm(Box::new(|| {}));
        let queue = BoundedQueue::new(1);

        {
            let _guard = IdleGuard::new(&slot, 0, &queue);
        }
        assert!(!slot.is_busy());
    }

    #[test]
    fn test_drop_during_shutdown_absorbed() {
        let slot = WorkerSlot::new(Arc::new(NullRequest));
        let queue = BoundedQueue::new(1);
        queue.set_capacity(0);

        {
            let _guard = IdleGuard::new(&slot, 0, &queue);
        }
        // Refused push: the slot stays out of circulation, silently.
        assert!(queue.is_empty());
    }

    #[test]
    fn test_guard_returns_on_panic() {
        let slot = WorkerSlot::new(Arc::new(NullRequest));
        let queue = BoundedQueue::new(1);

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = IdleGuard::new(&slot, 0, &queue);
            panic!("stage blew up");
        }));
        assert!(result.is_err());
        assert_eq!(queue.try_pop(), Some(0));
    }
}
