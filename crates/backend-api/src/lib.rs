// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # backend-api
//!
//! The contract between the auto-dispatch core and the device backends it
//! drives. Backends (CPU, GPU, neural accelerators, vision processors) are
//! black boxes behind the traits in this crate: they compile networks,
//! create inference requests, and report completion through a callback.
//!
//! The crate also carries the value types every other crate speaks:
//! [`Network`], [`TensorDesc`], [`Precision`], [`Blob`], [`InferStatus`],
//! [`MetricValue`], and [`PerfCounter`], plus the string constants for
//! configuration and metric keys.
//!
//! Nothing in here schedules or selects anything. Backends are registered
//! through a [`BackendRegistry`] supplied by the embedding application.

mod blob;
mod error;
pub mod keys;
mod network;
mod precision;
mod traits;

pub use blob::Blob;
pub use error::BackendError;
pub use network::{Network, TensorDesc};
pub use precision::Precision;
pub use traits::{
    BackendRegistry, CompiledNetwork, CompletionCallback, DeviceBackend, DeviceRequest,
};

use std::collections::BTreeMap;

/// Flat string key/value configuration, ordered for deterministic iteration.
pub type ConfigMap = BTreeMap<String, String>;

/// Completion status a backend reports for one inference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum InferStatus {
    /// The inference finished successfully.
    Ok,
    /// The device reported a generic execution failure.
    GeneralError,
    /// The request was started on a device that cannot run it.
    NotImplemented,
    /// The device dropped the request before running it.
    Cancelled,
}

impl InferStatus {
    /// Short label used in error messages and logs.
    pub fn as_str(self) -> &'static str {
        match self {
            InferStatus::Ok => "OK",
            InferStatus::GeneralError => "GENERAL_ERROR",
            InferStatus::NotImplemented => "NOT_IMPLEMENTED",
            InferStatus::Cancelled => "CANCELLED",
        }
    }
}

/// A value returned by a backend or dispatcher metric query.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub enum MetricValue {
    /// Unsigned counter (e.g. optimal request count).
    UInt(u32),
    /// Single string (e.g. a device or network name).
    Str(String),
    /// List of strings (e.g. supported metric keys).
    Strings(Vec<String>),
}

impl MetricValue {
    /// Returns the contained counter, if this is a [`MetricValue::UInt`].
    pub fn as_uint(&self) -> Option<u32> {
        match self {
            MetricValue::UInt(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the contained string, if this is a [`MetricValue::Str`].
    pub fn as_str(&self) -> Option<&str> {
        match self {
            MetricValue::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the contained list, if this is a [`MetricValue::Strings`].
    pub fn as_strings(&self) -> Option<&[String]> {
        match self {
            MetricValue::Strings(v) => Some(v),
            _ => None,
        }
    }
}

/// Per-layer profiling record collected by a device when performance
/// counting is enabled.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct PerfCounter {
    /// Wall-clock time spent in the layer, microseconds.
    pub real_time_us: u64,
    /// CPU time attributed to the layer, microseconds.
    pub cpu_time_us: u64,
    /// Device-specific kernel/implementation label.
    pub exec_kind: String,
}
