// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! One worker slot: a device-side inference request plus bookkeeping.

use backend_api::{DeviceRequest, InferStatus};
use std::sync::{Arc, Condvar, Mutex};

/// The continuation a slot runs when its device reports completion.
pub type SlotTask = Box<dyn FnOnce() + Send>;

struct SlotState {
    pending_task: Option<SlotTask>,
    last_status: InferStatus,
    busy: bool,
}

/// A reusable execution token over one device-side request.
///
/// The slot is *idle* until [`WorkerSlot::arm`] installs a completion
/// continuation, and *busy* from then until [`WorkerSlot::mark_idle`].
/// Teardown blocks on [`WorkerSlot::wait_idle`] so a scheduler is never
/// destroyed under an in-flight inference.
pub struct WorkerSlot {
    device_request: Arc<dyn DeviceRequest>,
    state: Mutex<SlotState>,
    became_idle: Condvar,
}

impl WorkerSlot {
    /// Wraps a freshly created device request.
    pub fn new(device_request: Arc<dyn DeviceRequest>) -> Self {
        Self {
            device_request,
            state: Mutex::new(SlotState {
                pending_task: None,
                last_status: InferStatus::Ok,
                busy: false,
            }),
            became_idle: Condvar::new(),
        }
    }

    /// The underlying device request.
    pub fn device_request(&self) -> &Arc<dyn DeviceRequest> {
        &self.device_request
    }

    /// Transitions to *busy*: installs the continuation to run on
    /// completion. The caller starts the device work right after.
    pub fn arm(&self, task: SlotTask) {
        let mut state = self.state.lock().expect("slot lock poisoned");
        debug_assert!(state.pending_task.is_none(), "slot armed twice");
        state.pending_task = Some(task);
        state.busy = true;
    }

    /// Records the device's completion status and moves out the armed
    /// continuation. Called from the completion callback.
    pub fn complete(&self, status: InferStatus) -> Option<SlotTask> {
        let mut state = self.state.lock().expect("slot lock poisoned");
        state.last_status = status;
        state.pending_task.take()
    }

    /// Takes back an armed continuation without recording a completion.
    /// Used when starting the device work fails after arming.
    pub fn disarm(&self) -> Option<SlotTask> {
        self.state
            .lock()
            .expect("slot lock poisoned")
            .pending_task
            .take()
    }

    /// The status recorded by the most recent completion.
    pub fn last_status(&self) -> InferStatus {
        self.state.lock().expect("slot lock poisoned").last_status
    }

    /// Transitions back to *idle* and wakes teardown waiters. Must
    /// happen before the slot index re-enters the idle queue.
    pub fn mark_idle(&self) {
        let mut state = self.state.lock().expect("slot lock poisoned");
        state.busy = false;
        drop(state);
        self.became_idle.notify_all();
    }

    /// Whether the slot currently has in-flight device work.
    pub fn is_busy(&self) -> bool {
        self.state.lock().expect("slot lock poisoned").busy
    }

    /// Blocks until the slot has no in-flight work.
    pub fn wait_idle(&self) {
        let mut state = self.state.lock().expect("slot lock poisoned");
        while state.busy {
            state = self
                .became_idle
                .wait(state)
                .expect("slot lock poisoned");
        }
    }
}

impl std::fmt::Debug for WorkerSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock().expect("slot lock poisoned");
        f.debug_struct("WorkerSlot")
            .field("busy", &state.busy)
            .field("last_status", &state.last_status)
            .field("has_pending_task", &state.pending_task.is_some())
            .finish()
    }
}
