// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The simulated device-side inference request.
//!
//! `start_async` spawns a short-lived thread standing in for the
//! device's execution engine: it sleeps for the configured latency,
//! writes a deterministic pattern into the output blobs, records
//! per-layer profiling, and fires the completion callback.

use backend_api::{
    BackendError, Blob, CompletionCallback, DeviceRequest, InferStatus, PerfCounter, TensorDesc,
};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// One pre-created request on a simulated device.
pub struct SimRequest {
    blobs: Mutex<BTreeMap<String, Blob>>,
    output_names: Vec<String>,
    input_names: Vec<String>,
    callback: Mutex<Option<Arc<CompletionCallback>>>,
    layers: Vec<String>,
    latency: Duration,
    fail_inference: bool,
    perf_enabled: bool,
    last_perf: Arc<Mutex<BTreeMap<String, PerfCounter>>>,
}

impl SimRequest {
    pub(crate) fn new(
        inputs: &[TensorDesc],
        outputs: &[TensorDesc],
        layers: Vec<String>,
        latency: Duration,
        fail_inference: bool,
        perf_enabled: bool,
    ) -> Self {
        // Device-side blobs exist up front so callers can borrow them.
        let blobs = inputs
            .iter()
            .chain(outputs.iter())
            .map(|desc| (desc.name.clone(), Blob::allocate(desc.clone())))
            .collect();
        Self {
            blobs: Mutex::new(blobs),
            output_names: outputs.iter().map(|d| d.name.clone()).collect(),
            input_names: inputs.iter().map(|d| d.name.clone()).collect(),
            callback: Mutex::new(None),
            layers,
            latency,
            fail_inference,
            perf_enabled,
            last_perf: Arc::new(Mutex::new(BTreeMap::new())),
        }
    }

    fn run_inference(
        inputs: Vec<Blob>,
        outputs: Vec<Blob>,
        layers: &[String],
        latency: Duration,
        perf_enabled: bool,
        perf_sink: &Mutex<BTreeMap<String, PerfCounter>>,
    ) {
        if !latency.is_zero() {
            std::thread::sleep(latency);
        }

        // Stand-in compute: fold the input bytes and stamp the fold
        // into every output buffer.
        let mut acc: u8 = 0;
        for blob in &inputs {
            for &byte in blob.data().iter() {
                acc = acc.wrapping_add(byte);
            }
        }
        for blob in &outputs {
            let len = blob.data().len();
            blob.write(&vec![acc; len]);
        }

        if perf_enabled {
            let per_layer = latency.as_micros() as u64 / layers.len().max(1) as u64;
            let mut perf = perf_sink.lock().expect("perf lock poisoned");
            perf.clear();
            for layer in layers {
                perf.insert(
                    layer.clone(),
                    PerfCounter {
                        real_time_us: per_layer,
                        cpu_time_us: per_layer / 2,
                        exec_kind: "sim".into(),
                    },
                );
            }
        }
    }
}

impl DeviceRequest for SimRequest {
    fn set_blob(&self, name: &str, blob: Blob) -> Result<(), BackendError> {
        let mut blobs = self.blobs.lock().expect("blob map lock poisoned");
        match blobs.get_mut(name) {
            Some(bound) => {
                *bound = blob;
                Ok(())
            }
            None => Err(BackendError::NotFound(format!("tensor '{name}'"))),
        }
    }

    fn get_blob(&self, name: &str) -> Result<Blob, BackendError> {
        self.blobs
            .lock()
            .expect("blob map lock poisoned")
            .get(name)
            .cloned()
            .ok_or_else(|| BackendError::NotFound(format!("tensor '{name}'")))
    }

    fn start_async(&self) -> Result<(), BackendError> {
        let callback = self
            .callback
            .lock()
            .expect("callback lock poisoned")
            .clone()
            .ok_or_else(|| BackendError::Device("no completion callback installed".into()))?;

        let (inputs, outputs) = {
            let blobs = self.blobs.lock().expect("blob map lock poisoned");
            let inputs = self
                .input_names
                .iter()
                .filter_map(|n| blobs.get(n).cloned())
                .collect::<Vec<_>>();
            let outputs = self
                .output_names
                .iter()
                .filter_map(|n| blobs.get(n).cloned())
                .collect::<Vec<_>>();
            (inputs, outputs)
        };

        let layers = self.layers.clone();
        let latency = self.latency;
        let perf_enabled = self.perf_enabled;
        let perf_sink = Arc::clone(&self.last_perf);
        let status = if self.fail_inference {
            InferStatus::GeneralError
        } else {
            InferStatus::Ok
        };

        std::thread::spawn(move || {
            Self::run_inference(inputs, outputs, &layers, latency, perf_enabled, &perf_sink);
            callback(status);
        });
        Ok(())
    }

    fn set_completion_callback(&self, callback: CompletionCallback) {
        *self.callback.lock().expect("callback lock poisoned") = Some(Arc::new(callback));
    }

    fn performance_counts(&self) -> Result<BTreeMap<String, PerfCounter>, BackendError> {
        Ok(self.last_perf.lock().expect("perf lock poisoned").clone())
    }
}
