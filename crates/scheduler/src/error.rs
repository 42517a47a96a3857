// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for scheduling and the inference pipeline.

use backend_api::{BackendError, InferStatus};

/// Errors surfaced by the scheduler and its asynchronous requests.
#[derive(Debug, Clone, thiserror::Error)]
pub enum InferError {
    /// An input blob is tagged remote on a device outside the candidate
    /// list this scheduler was built from.
    #[error("remote input buffer lives on device '{0}', which is not among the candidate devices")]
    RemoteBufferUnknownDevice(String),

    /// The device completed the inference with a non-OK status.
    #[error("inference failed on the device with status {}", .status.as_str())]
    Device {
        /// The status the device reported.
        status: InferStatus,
    },

    /// A backend call made on behalf of the request failed.
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// `wait` was called on a request that was never started.
    #[error("inference has not been started")]
    NotStarted,

    /// The request is still in flight.
    #[error("inference request is busy")]
    Busy,

    /// The scheduler shut down before the queued request reached a slot.
    #[error("scheduler shut down before the inference was scheduled")]
    Aborted,

    /// A config key the caller asked for is not in the scheduler config.
    #[error("'{0}' not found in the compiled network config")]
    ConfigKeyNotFound(String),

    /// The scheduler does not answer this metric.
    #[error("unsupported network metric: {0}")]
    UnsupportedMetric(String),

    /// The chosen device's compiled network cannot report its optimal
    /// request count, which every device used with the dispatcher must.
    #[error(
        "every device used with the auto dispatcher should support the \
         OPTIMAL_NUMBER_OF_INFER_REQUESTS metric; query on '{device}' failed: {detail}"
    )]
    OptimalRequestsMetric {
        /// The device that failed the query.
        device: String,
        /// The backend's error text.
        detail: String,
    },

    /// No device behind this scheduler has a remote context.
    #[error(
        "none of the devices has an associated remote context; current \
         device list: {0}"
    )]
    ContextNotSupported(String),
}
