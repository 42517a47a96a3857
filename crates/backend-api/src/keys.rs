// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! String constants for configuration and metric keys.
//!
//! These are the wire-level names shared by the dispatcher, backends, and
//! callers. Backends advertise which configuration keys they accept via
//! [`metrics::SUPPORTED_CONFIG_KEYS`]; the dispatcher filters per-device
//! configs down to that set before invoking a backend.

/// Configuration keys recognized by the dispatcher core.
pub mod config {
    /// Comma-separated device list overriding enumeration, highest
    /// priority first. Entries may carry a `NAME(n)` request-count hint.
    pub const DEVICE_PRIORITIES: &str = "DEVICE_PRIORITIES";
    /// Accepted alias for [`DEVICE_PRIORITIES`].
    pub const DEVICE_CHOICE: &str = "DEVICE_CHOICE";
    /// Selection policy name. `STATIC` is the only accepted value.
    pub const SCHEDULE_TYPE: &str = "SCHEDULE_TYPE";
    /// `YES`/`NO`: collect per-layer performance counters per inference.
    pub const PERF_COUNT: &str = "PERF_COUNT";
    /// Device instance id, appended to a candidate's config when its name
    /// carries a `.id` suffix.
    pub const DEVICE_ID: &str = "DEVICE_ID";

    /// Affirmative config value.
    pub const YES: &str = "YES";
    /// Negative config value.
    pub const NO: &str = "NO";
}

/// Metric keys exposed by the dispatcher and consumed from backends.
pub mod metrics {
    /// List of metric keys an entity answers.
    pub const SUPPORTED_METRICS: &str = "SUPPORTED_METRICS";
    /// Devices visible to the dispatcher.
    pub const AVAILABLE_DEVICES: &str = "AVAILABLE_DEVICES";
    /// Fixed string identifying the dispatcher itself.
    pub const FULL_DEVICE_NAME: &str = "FULL_DEVICE_NAME";
    /// List of configuration keys an entity accepts.
    pub const SUPPORTED_CONFIG_KEYS: &str = "SUPPORTED_CONFIG_KEYS";
    /// Precision capability advertisement tokens.
    pub const OPTIMIZATION_CAPABILITIES: &str = "OPTIMIZATION_CAPABILITIES";
    /// Per-compiled-network: how many in-flight requests the device wants.
    pub const OPTIMAL_NUMBER_OF_INFER_REQUESTS: &str = "OPTIMAL_NUMBER_OF_INFER_REQUESTS";
    /// Per-compiled-network: the network's name.
    pub const NETWORK_NAME: &str = "NETWORK_NAME";
}
