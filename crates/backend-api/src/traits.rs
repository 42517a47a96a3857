// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The traits a device backend implements.
//!
//! The flow mirrors how the dispatcher consumes a device:
//!
//! ```text
//! BackendRegistry ──backend()──▶ DeviceBackend
//!     DeviceBackend ──load_network()──▶ CompiledNetwork
//!         CompiledNetwork ──create_infer_request()──▶ DeviceRequest
//!             DeviceRequest ──start_async()──▶ completion callback
//! ```
//!
//! `start_async` must not block: the device runs the inference on its own
//! thread and reports through the callback installed with
//! [`DeviceRequest::set_completion_callback`]. Everything else may block
//! briefly but must be safe to call from multiple threads.

use crate::{Blob, BackendError, ConfigMap, InferStatus, MetricValue, Network, PerfCounter};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Callback a device invokes on its completion thread when an inference
/// started with [`DeviceRequest::start_async`] finishes.
pub type CompletionCallback = Box<dyn Fn(InferStatus) + Send + Sync>;

/// One compute backend (a device plugin).
pub trait DeviceBackend: Send + Sync {
    /// Reports which layers of `network` this device can run, as a map
    /// from layer name to a device-specific support tag.
    fn query_network(
        &self,
        network: &Network,
        config: &ConfigMap,
    ) -> Result<BTreeMap<String, String>, BackendError>;

    /// Compiles `network` for this device.
    fn load_network(
        &self,
        network: &Network,
        config: &ConfigMap,
    ) -> Result<Arc<dyn CompiledNetwork>, BackendError>;

    /// Answers a backend-level metric query (capabilities, supported
    /// config keys).
    fn get_metric(&self, key: &str) -> Result<MetricValue, BackendError>;
}

/// A network after backend-specific compilation.
pub trait CompiledNetwork: Send + Sync {
    /// Creates one device-side inference request.
    fn create_infer_request(&self) -> Result<Arc<dyn DeviceRequest>, BackendError>;

    /// Answers a compiled-network metric query.
    fn get_metric(&self, key: &str) -> Result<MetricValue, BackendError>;

    /// Answers a compiled-network config query.
    fn get_config(&self, key: &str) -> Result<String, BackendError>;

    /// Returns an opaque handle to the device's remote context, when the
    /// device has one. The default is the *not implemented* error.
    fn get_context(&self) -> Result<String, BackendError> {
        Err(BackendError::NotImplemented(
            "no remote context for this device".into(),
        ))
    }
}

/// One pre-created inference request living on a device.
pub trait DeviceRequest: Send + Sync {
    /// Binds `blob` as the tensor named `name`.
    fn set_blob(&self, name: &str, blob: Blob) -> Result<(), BackendError>;

    /// Returns the blob currently bound as `name`.
    fn get_blob(&self, name: &str) -> Result<Blob, BackendError>;

    /// Starts the inference. Returns immediately; completion is reported
    /// through the installed callback.
    fn start_async(&self) -> Result<(), BackendError>;

    /// Installs the completion callback. Called once, before the first
    /// `start_async`.
    fn set_completion_callback(&self, callback: CompletionCallback);

    /// Per-layer profiling records for the last completed inference.
    fn performance_counts(&self) -> Result<BTreeMap<String, PerfCounter>, BackendError>;
}

/// The device enumeration the embedding application provides.
///
/// The dispatcher never instantiates backends itself; it resolves device
/// names against this registry.
pub trait BackendRegistry: Send + Sync {
    /// Names of all devices visible to the dispatcher, e.g.
    /// `["CPU", "GPU.0", "GPU.1"]`.
    fn available_devices(&self) -> Vec<String>;

    /// Resolves a device name (without instance suffix) to its backend.
    fn backend(&self, device_name: &str) -> Result<Arc<dyn DeviceBackend>, BackendError>;
}
