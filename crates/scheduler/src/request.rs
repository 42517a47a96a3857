// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The per-inference asynchronous request and its staged pipeline.
//!
//! One inference walks four stages:
//!
//! ```text
//! Stage 0  caller thread      remote-buffer check, preferred-device override
//! Stage 1  inside submit      mirror host buffers onto the granted slot
//! Stage 2  inside submit      arm the slot, StartAsync on the device
//! Stage 3  completion thread  status check, perf-counter snapshot
//! ```
//!
//! The request's state machine is
//!
//! ```text
//! Created → Submitted → Bound → Running → { Completed | Failed }
//! ```
//!
//! `Submitted` covers the window where the task sits in the overflow
//! queue. Terminal states are absorbing; a failure in any stage lands in
//! `Failed` with the original error preserved for `wait`.
//!
//! The scheduler hands the granted slot to Stage 1 as a closure
//! argument, so the scheduling decision and its consumer are chained
//! without any global hand-off state.

use crate::sched::SchedulerInner;
use crate::InferError;
use backend_api::{Blob, DeviceRequest, InferStatus, PerfCounter};
use std::collections::BTreeMap;
use std::sync::{Arc, Condvar, Mutex};
use worker_pool::SlotIndex;

/// Observable pipeline state of an [`AsyncInferRequest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState {
    /// Constructed, not yet started.
    Created,
    /// Started and waiting for a worker slot.
    Submitted,
    /// A worker slot has been granted; buffers are being mirrored.
    Bound,
    /// Device-side inference is in flight.
    Running,
    /// The inference finished successfully.
    Completed,
    /// The pipeline failed; the error is available through `wait`.
    Failed,
}

impl RequestState {
    fn is_terminal(self) -> bool {
        matches!(self, RequestState::Completed | RequestState::Failed)
    }

    fn is_in_flight(self) -> bool {
        matches!(
            self,
            RequestState::Submitted | RequestState::Bound | RequestState::Running
        )
    }
}

struct PipelineState {
    stage: RequestState,
    bound_slot: Option<SlotIndex>,
    error: Option<InferError>,
    perf: BTreeMap<String, PerfCounter>,
}

pub(crate) struct RequestShared {
    scheduler: Arc<SchedulerInner>,
    inputs: Mutex<BTreeMap<String, Blob>>,
    outputs: Mutex<BTreeMap<String, Blob>>,
    need_perf_counters: bool,
    state: Mutex<PipelineState>,
    state_changed: Condvar,
}

impl RequestShared {
    fn transition(&self, stage: RequestState, slot: Option<SlotIndex>) {
        let mut state = self.state.lock().expect("request state lock poisoned");
        if state.stage.is_terminal() {
            return;
        }
        state.stage = stage;
        if slot.is_some() {
            state.bound_slot = slot;
        }
        drop(state);
        self.state_changed.notify_all();
    }

    fn fail(&self, error: InferError) {
        let mut state = self.state.lock().expect("request state lock poisoned");
        if state.stage.is_terminal() {
            return;
        }
        state.stage = RequestState::Failed;
        state.error = Some(error);
        drop(state);
        self.state_changed.notify_all();
    }

    /// Stages 1 and 2, run with the granted slot. Returns whether the
    /// device work was started.
    fn run_on_slot(shared: &Arc<Self>, index: SlotIndex) -> bool {
        shared.transition(RequestState::Bound, Some(index));
        let slot = &shared.scheduler.slots[index];

        if let Err(e) = shared.mirror_blobs(slot.device_request()) {
            shared.fail(e);
            return false;
        }

        let continuation = {
            let shared = Arc::clone(shared);
            Box::new(move || shared.finalize(index))
        };
        slot.arm(continuation);
        shared.transition(RequestState::Running, None);

        if let Err(e) = slot.device_request().start_async() {
            slot.disarm();
            shared.fail(e.into());
            return false;
        }
        true
    }

    /// Stage 1 body: mirror every device-agnostic buffer onto the
    /// slot's device request, skipping buffers the device already holds.
    fn mirror_blobs(&self, device_request: &Arc<dyn DeviceRequest>) -> Result<(), InferError> {
        let inputs = self.inputs.lock().expect("request inputs lock poisoned");
        let outputs = self.outputs.lock().expect("request outputs lock poisoned");
        for (name, blob) in inputs.iter().chain(outputs.iter()) {
            let already_bound = device_request
                .get_blob(name)
                .map(|bound| Blob::same_buffer(&bound, blob))
                .unwrap_or(false);
            if !already_bound {
                device_request.set_blob(name, blob.clone())?;
            }
        }
        Ok(())
    }

    /// Stage 3 body, run on the device's completion thread.
    fn finalize(&self, index: SlotIndex) {
        let slot = &self.scheduler.slots[index];
        let status = slot.last_status();
        if status != InferStatus::Ok {
            self.fail(InferError::Device { status });
            return;
        }

        if self.need_perf_counters {
            match slot.device_request().performance_counts() {
                Ok(counts) => {
                    let mut state = self.state.lock().expect("request state lock poisoned");
                    state.perf = counts;
                }
                Err(e) => {
                    self.fail(e.into());
                    return;
                }
            }
        }
        self.transition(RequestState::Completed, None);
    }
}

/// Carries the request through the scheduler's queues. Dropping an
/// envelope that never ran (teardown drained the overflow queue) fails
/// the owning request so its waiters wake up.
struct SubmitEnvelope {
    shared: Arc<RequestShared>,
    fired: bool,
}

impl SubmitEnvelope {
    fn run(mut self, index: SlotIndex) -> bool {
        self.fired = true;
        RequestShared::run_on_slot(&self.shared, index)
    }
}

impl Drop for SubmitEnvelope {
    fn drop(&mut self) {
        if !self.fired {
            self.shared.fail(InferError::Aborted);
        }
    }
}

/// One asynchronous inference over a [`NetworkScheduler`].
///
/// The request owns device-agnostic input and output buffers keyed by
/// tensor name. `start` launches the pipeline and returns immediately;
/// `wait` blocks for the outcome. Dropping an in-flight request joins
/// its pipeline first.
///
/// [`NetworkScheduler`]: crate::NetworkScheduler
pub struct AsyncInferRequest {
    shared: Arc<RequestShared>,
}

impl AsyncInferRequest {
    pub(crate) fn new(
        scheduler: Arc<SchedulerInner>,
        share_with: Option<Arc<dyn DeviceRequest>>,
    ) -> Self {
        // Borrow the device-side buffers when a dedicated slot exists
        // for this request ordinal; otherwise allocate host buffers.
        let borrow = |desc: &backend_api::TensorDesc| -> Blob {
            share_with
                .as_ref()
                .and_then(|request| request.get_blob(&desc.name).ok())
                .unwrap_or_else(|| Blob::allocate(desc.clone()))
        };
        let inputs = scheduler
            .inputs
            .iter()
            .map(|desc| (desc.name.clone(), borrow(desc)))
            .collect();
        let outputs = scheduler
            .outputs
            .iter()
            .map(|desc| (desc.name.clone(), borrow(desc)))
            .collect();

        let need_perf_counters = scheduler.need_perf_counters;
        Self {
            shared: Arc::new(RequestShared {
                scheduler,
                inputs: Mutex::new(inputs),
                outputs: Mutex::new(outputs),
                need_perf_counters,
                state: Mutex::new(PipelineState {
                    stage: RequestState::Created,
                    bound_slot: None,
                    error: None,
                    perf: BTreeMap::new(),
                }),
                state_changed: Condvar::new(),
            }),
        }
    }

    /// Replaces the buffer bound to tensor `name`.
    pub fn set_blob(&self, name: &str, blob: Blob) -> Result<(), InferError> {
        let mut inputs = self
            .shared
            .inputs
            .lock()
            .expect("request inputs lock poisoned");
        if let Some(slot) = inputs.get_mut(name) {
            *slot = blob;
            return Ok(());
        }
        drop(inputs);
        let mut outputs = self
            .shared
            .outputs
            .lock()
            .expect("request outputs lock poisoned");
        match outputs.get_mut(name) {
            Some(slot) => {
                *slot = blob;
                Ok(())
            }
            None => Err(InferError::Backend(backend_api::BackendError::NotFound(
                format!("tensor '{name}' is not an input or output of the network"),
            ))),
        }
    }

    /// Returns the buffer bound to tensor `name`.
    pub fn get_blob(&self, name: &str) -> Result<Blob, InferError> {
        let inputs = self
            .shared
            .inputs
            .lock()
            .expect("request inputs lock poisoned");
        if let Some(blob) = inputs.get(name) {
            return Ok(blob.clone());
        }
        drop(inputs);
        let outputs = self
            .shared
            .outputs
            .lock()
            .expect("request outputs lock poisoned");
        outputs
            .get(name)
            .cloned()
            .ok_or_else(|| {
                InferError::Backend(backend_api::BackendError::NotFound(format!(
                    "tensor '{name}' is not an input or output of the network"
                )))
            })
    }

    /// Launches the pipeline. Returns immediately after Stage 0 plus,
    /// on an idle-slot hit, the synchronous Stages 1 and 2.
    pub fn start(&self) -> Result<(), InferError> {
        {
            let mut state = self.shared.state.lock().expect("request state lock poisoned");
            if state.stage.is_in_flight() {
                return Err(InferError::Busy);
            }
            // Restarting a finished request resets its outcome.
            state.stage = RequestState::Created;
            state.bound_slot = None;
            state.error = None;
            state.perf.clear();
        }

        // Stage 0: remote input buffers steer scheduling toward their
        // owning device, which must be a known candidate.
        {
            let inputs = self
                .shared
                .inputs
                .lock()
                .expect("request inputs lock poisoned");
            for blob in inputs.values() {
                let Some(device) = blob.remote_device() else {
                    continue;
                };
                if !self
                    .shared
                    .scheduler
                    .initial_candidates
                    .iter()
                    .any(|candidate| candidate == device)
                {
                    let error = InferError::RemoteBufferUnknownDevice(device.to_string());
                    self.shared.fail(error.clone());
                    return Err(error);
                }
                self.shared.scheduler.set_preferred_device(device);
            }
        }

        self.shared.transition(RequestState::Submitted, None);
        let envelope = SubmitEnvelope {
            shared: Arc::clone(&self.shared),
            fired: false,
        };
        self.shared
            .scheduler
            .try_schedule(Box::new(move |index| envelope.run(index)));
        Ok(())
    }

    /// Blocks until the pipeline reaches a terminal state.
    pub fn wait(&self) -> Result<(), InferError> {
        let mut state = self.shared.state.lock().expect("request state lock poisoned");
        loop {
            match state.stage {
                RequestState::Completed => return Ok(()),
                RequestState::Failed => {
                    return Err(state
                        .error
                        .clone()
                        .unwrap_or(InferError::Device {
                            status: InferStatus::GeneralError,
                        }))
                }
                RequestState::Created => return Err(InferError::NotStarted),
                _ => {
                    state = self
                        .shared
                        .state_changed
                        .wait(state)
                        .expect("request state lock poisoned");
                }
            }
        }
    }

    /// Convenience synchronous inference: `start` then `wait`.
    pub fn infer(&self) -> Result<(), InferError> {
        self.start()?;
        self.wait()
    }

    /// Current pipeline state.
    pub fn state(&self) -> RequestState {
        self.shared
            .state
            .lock()
            .expect("request state lock poisoned")
            .stage
    }

    /// The slot this request last bound to, if it got that far.
    pub fn bound_slot(&self) -> Option<SlotIndex> {
        self.shared
            .state
            .lock()
            .expect("request state lock poisoned")
            .bound_slot
    }

    /// The performance-counter snapshot of the last completed
    /// inference. Empty unless the scheduler collects counters.
    pub fn performance_counts(&self) -> Result<BTreeMap<String, PerfCounter>, InferError> {
        let state = self.shared.state.lock().expect("request state lock poisoned");
        match state.stage {
            RequestState::Completed => Ok(state.perf.clone()),
            RequestState::Failed => Err(state
                .error
                .clone()
                .unwrap_or(InferError::Device {
                    status: InferStatus::GeneralError,
                })),
            RequestState::Created => Err(InferError::NotStarted),
            _ => Err(InferError::Busy),
        }
    }
}

impl Drop for AsyncInferRequest {
    fn drop(&mut self) {
        // Join the pipeline: destruction in a non-terminal state blocks
        // until the current stage completes or teardown aborts the task.
        let mut state = self.shared.state.lock().expect("request state lock poisoned");
        while state.stage.is_in_flight() {
            state = self
                .shared
                .state_changed
                .wait(state)
                .expect("request state lock poisoned");
        }
    }
}

impl std::fmt::Debug for AsyncInferRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.shared.state.lock().expect("request state lock poisoned");
        f.debug_struct("AsyncInferRequest")
            .field("state", &state.stage)
            .field("bound_slot", &state.bound_slot)
            .finish()
    }
}
