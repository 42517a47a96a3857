// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # sim-backend
//!
//! Simulated device backends implementing the `backend-api` contract.
//!
//! A [`SimDevice`] stands in for a real plugin: it advertises precision
//! capabilities, compiles networks instantly, and runs each inference on
//! a short-lived thread that sleeps for a configurable latency before
//! invoking the completion callback. Failure injection covers the paths
//! the dispatcher must survive: compile rejection, inference failure,
//! query rejection, and a missing optimal-request metric.
//!
//! # Example
//! ```
//! use backend_api::BackendRegistry;
//! use sim_backend::{SimDevice, SimRegistry};
//! use std::time::Duration;
//!
//! let registry = SimRegistry::new()
//!     .with_device("CPU", SimDevice::new("CPU", &["FP32", "INT8"]))
//!     .with_device(
//!         "GPU.1",
//!         SimDevice::new("GPU", &["FP16", "FP32"]).with_latency(Duration::from_millis(5)),
//!     );
//! assert_eq!(registry.available_devices(), vec!["CPU", "GPU.1"]);
//! ```

mod device;
mod registry;
mod request;

pub use device::{SimCompiledNetwork, SimDevice};
pub use registry::SimRegistry;
pub use request::SimRequest;
