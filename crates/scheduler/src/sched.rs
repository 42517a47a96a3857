// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The per-compiled-network scheduler.
//!
//! A [`NetworkScheduler`] owns a fixed pool of worker slots over one
//! backend-compiled network on one chosen device. Work reaches a slot in
//! one of two ways:
//!
//! 1. **Fast path**: `submit` pops an idle slot and runs the task
//!    synchronously on the caller's thread.
//! 2. **Overflow**: with no idle slot, the task waits in an unbounded
//!    FIFO; each device completion frees a slot and admits one waiter.
//!
//! Fast-path tasks may overtake waiters already queued; that trade buys
//! submission latency and is deliberate. Waiters themselves drain in
//! strict FIFO order.
//!
//! The scheduler holds no thread of its own. Completions arrive on the
//! backend's thread, which also performs the re-scheduling.

use crate::{AsyncInferRequest, InferError};
use backend_api::{
    keys, CompiledNetwork, ConfigMap, DeviceRequest, InferStatus, MetricValue, Network,
    TensorDesc,
};
use device_select::DeviceDescriptor;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use worker_pool::{BoundedQueue, IdleGuard, SlotIndex, TaskQueue, WorkerSlot};

/// A unit of schedulable work. The argument is the slot index the
/// scheduler granted; the return value reports whether the task armed
/// the slot's device request (`true`) or bailed out before starting any
/// device work (`false`, slot returns to idle).
pub type SubmitTask = Box<dyn FnOnce(SlotIndex) -> bool + Send>;

pub(crate) struct SchedulerInner {
    pub(crate) device: DeviceDescriptor,
    pub(crate) initial_candidates: Vec<String>,
    pub(crate) preferred_device: Mutex<String>,
    pub(crate) compiled: Arc<dyn CompiledNetwork>,
    pub(crate) inputs: Vec<TensorDesc>,
    pub(crate) outputs: Vec<TensorDesc>,
    pub(crate) slots: Vec<WorkerSlot>,
    pub(crate) idle: BoundedQueue<SlotIndex>,
    pub(crate) overflow: TaskQueue<SubmitTask>,
    pub(crate) config: ConfigMap,
    pub(crate) need_perf_counters: bool,
    requests_created: AtomicUsize,
    shut_down: AtomicBool,
}

impl SchedulerInner {
    /// Grants an idle slot to `task`, or queues it. When a granted task
    /// declines its slot (an early pipeline failure), the slot returns
    /// to idle and the next waiter gets its chance immediately.
    pub(crate) fn try_schedule(&self, task: SubmitTask) {
        let mut task = task;
        loop {
            if let Some(index) = self.idle.try_pop() {
                let slot = &self.slots[index];
                let guard = IdleGuard::new(slot, index, &self.idle);
                if task(index) {
                    guard.release();
                    return;
                }
                drop(guard);

                match self.overflow.try_pop() {
                    Some(next) => task = next,
                    None => return,
                }
                continue;
            }

            if self.shut_down.load(Ordering::Acquire) {
                // Dropping the task fails its request; see the submit
                // envelope in the request pipeline.
                return;
            }
            self.overflow.push(task);
            // Re-check: a concurrent shutdown may have drained the
            // queue between our load and our push.
            if self.shut_down.load(Ordering::Acquire) {
                drop(self.overflow.drain());
                return;
            }
            // A completion may have freed a slot between our failed pop
            // and the push, missing the queued task; re-admit a waiter.
            if !self.idle.is_empty() {
                match self.overflow.try_pop() {
                    Some(next) => task = next,
                    None => return,
                }
                continue;
            }
            return;
        }
    }

    /// Completion-callback protocol for slot `index`: record status, run
    /// the armed continuation, return the slot to idle, admit a waiter.
    fn on_device_complete(&self, index: SlotIndex, status: InferStatus) {
        let slot = &self.slots[index];
        let guard = IdleGuard::new(slot, index, &self.idle);

        if let Some(task) = slot.complete(status) {
            task();
        }

        let idle = guard.release();
        slot.mark_idle();
        // A refused push means teardown is in progress; stop here.
        if idle.try_push(index) {
            if let Some(waiting) = self.overflow.try_pop() {
                self.try_schedule(waiting);
            }
        }
    }

    pub(crate) fn set_preferred_device(&self, device_name: &str) {
        let mut preferred = self
            .preferred_device
            .lock()
            .expect("preferred device lock poisoned");
        if *preferred != device_name {
            tracing::debug!(device = device_name, "preferred device overridden by remote buffer");
            *preferred = device_name.to_string();
        }
    }

    fn shutdown(&self) {
        self.shut_down.store(true, Ordering::Release);
        // Refuse any further idle returns, then drop every waiter. Each
        // dropped task fails its owning request so waiters never hang.
        self.idle.set_capacity(0);
        let dropped = self.overflow.drain();
        if !dropped.is_empty() {
            tracing::debug!(count = dropped.len(), "dropping queued tasks at teardown");
        }
        drop(dropped);

        for slot in &self.slots {
            slot.wait_idle();
        }
        tracing::debug!(device = %self.device, "scheduler teardown complete");
    }
}

/// Scheduler for one compiled network bound to one device.
pub struct NetworkScheduler {
    inner: Arc<SchedulerInner>,
}

impl NetworkScheduler {
    /// Builds the worker pool over `compiled`.
    ///
    /// The slot count is the descriptor's request-count hint when given,
    /// otherwise the device's advertised optimal number (minimum 1). One
    /// device request is created per slot and its completion callback is
    /// installed before any work can reach it.
    pub fn new(
        compiled: Arc<dyn CompiledNetwork>,
        device: DeviceDescriptor,
        config: ConfigMap,
        need_perf_counters: bool,
        network: &Network,
        initial_candidates: Vec<String>,
    ) -> Result<Self, InferError> {
        let optimal = compiled
            .get_metric(keys::metrics::OPTIMAL_NUMBER_OF_INFER_REQUESTS)
            .ok()
            .and_then(|v| v.as_uint())
            .unwrap_or(0);
        let num_slots = if device.requested_request_count >= 0 {
            device.requested_request_count as usize
        } else {
            optimal.max(1) as usize
        };
        tracing::info!(
            device = %device,
            slots = num_slots,
            optimal,
            "creating worker pool"
        );

        let mut slots = Vec::with_capacity(num_slots);
        for _ in 0..num_slots {
            slots.push(WorkerSlot::new(compiled.create_infer_request()?));
        }

        let idle = BoundedQueue::new(num_slots);
        for index in 0..num_slots {
            let accepted = idle.try_push(index);
            debug_assert!(accepted, "fresh idle queue refused a slot");
        }

        let inner = Arc::new(SchedulerInner {
            preferred_device: Mutex::new(device.device_name.clone()),
            device,
            initial_candidates,
            compiled,
            inputs: network.inputs.clone(),
            outputs: network.outputs.clone(),
            slots,
            idle,
            overflow: TaskQueue::new(),
            config,
            need_perf_counters,
            requests_created: AtomicUsize::new(0),
            shut_down: AtomicBool::new(false),
        });

        for (index, slot) in inner.slots.iter().enumerate() {
            let weak = Arc::downgrade(&inner);
            slot.device_request()
                .set_completion_callback(Box::new(move |status| {
                    if let Some(inner) = weak.upgrade() {
                        inner.on_device_complete(index, status);
                    }
                }));
        }

        Ok(Self { inner })
    }

    /// Enqueues a unit of work. Runs it immediately on this thread when
    /// an idle slot is available; queues it otherwise.
    pub fn submit(&self, task: SubmitTask) {
        self.inner.try_schedule(task);
    }

    /// Creates a new asynchronous inference request.
    ///
    /// The first `N` requests (`N` = slot count) borrow the device-side
    /// buffers of their corresponding slot, saving one copy per
    /// inference; later requests allocate their own host buffers.
    pub fn create_request(&self) -> AsyncInferRequest {
        let ordinal = self.inner.requests_created.fetch_add(1, Ordering::SeqCst);
        let share_with = self
            .inner
            .slots
            .get(ordinal)
            .map(|slot| Arc::clone(slot.device_request()));
        AsyncInferRequest::new(Arc::clone(&self.inner), share_with)
    }

    /// The device this scheduler compiled for.
    pub fn device(&self) -> &DeviceDescriptor {
        &self.inner.device
    }

    /// The device currently preferred for new requests. Equals the
    /// chosen device's name unless a remote input buffer overrode it.
    pub fn preferred_device(&self) -> String {
        self.inner
            .preferred_device
            .lock()
            .expect("preferred device lock poisoned")
            .clone()
    }

    /// Total number of worker slots.
    pub fn slot_count(&self) -> usize {
        self.inner.slots.len()
    }

    /// Number of slots currently idle.
    pub fn idle_count(&self) -> usize {
        self.inner.idle.len()
    }

    /// Number of tasks waiting for a slot.
    pub fn waiting_count(&self) -> usize {
        self.inner.overflow.len()
    }

    /// Proxies the remote context of the underlying compiled network.
    pub fn get_context(&self) -> Result<String, InferError> {
        self.inner.compiled.get_context().map_err(|_| {
            InferError::ContextNotSupported(self.inner.device.device_name.clone())
        })
    }

    /// Looks up a key in the per-network config. A miss is a hard error.
    pub fn get_config(&self, key: &str) -> Result<String, InferError> {
        self.inner
            .config
            .get(key)
            .cloned()
            .ok_or_else(|| InferError::ConfigKeyNotFound(key.to_string()))
    }

    /// Answers a compiled-network metric query.
    ///
    /// `OPTIMAL_NUMBER_OF_INFER_REQUESTS` and `NETWORK_NAME` are proxied
    /// from the backend; the former failing is fatal because the whole
    /// pool sizing contract depends on it.
    pub fn get_metric(&self, key: &str) -> Result<MetricValue, InferError> {
        match key {
            keys::metrics::OPTIMAL_NUMBER_OF_INFER_REQUESTS => self
                .inner
                .compiled
                .get_metric(key)
                .map_err(|e| InferError::OptimalRequestsMetric {
                    device: self.inner.device.device_name.clone(),
                    detail: e.to_string(),
                }),
            keys::metrics::NETWORK_NAME => Ok(self.inner.compiled.get_metric(key)?),
            keys::metrics::SUPPORTED_METRICS => Ok(MetricValue::Strings(vec![
                keys::metrics::OPTIMAL_NUMBER_OF_INFER_REQUESTS.into(),
                keys::metrics::SUPPORTED_METRICS.into(),
                keys::metrics::NETWORK_NAME.into(),
                keys::metrics::SUPPORTED_CONFIG_KEYS.into(),
            ])),
            keys::metrics::SUPPORTED_CONFIG_KEYS => Ok(MetricValue::Strings(vec![
                keys::config::DEVICE_PRIORITIES.into(),
            ])),
            other => Err(InferError::UnsupportedMetric(other.to_string())),
        }
    }
}

impl Drop for NetworkScheduler {
    fn drop(&mut self) {
        self.inner.shutdown();
    }
}

impl std::fmt::Debug for NetworkScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetworkScheduler")
            .field("device", &self.inner.device.device_name)
            .field("slots", &self.inner.slots.len())
            .field("idle", &self.inner.idle.len())
            .field("waiting", &self.inner.overflow.len())
            .finish()
    }
}
