// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for the dispatcher façade.

use backend_api::BackendError;
use device_select::SelectError;
use scheduler::InferError;

/// Errors surfaced by the [`AutoDispatcher`](crate::AutoDispatcher).
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// No backend registry was installed before use.
    #[error("no backend registry installed; register devices before compiling")]
    NoRegistry,

    /// The network is not in the expected graph form.
    #[error("network '{0}' is not in the expected graph form")]
    UnsupportedNetwork(String),

    /// A config key outside the dispatcher's store was requested.
    #[error("unsupported config key: {0}")]
    UnknownConfigKey(String),

    /// A metric outside the dispatcher's advertised set was requested.
    #[error("unsupported metric key: {0}")]
    UnknownMetricKey(String),

    /// Device selection failed.
    #[error(transparent)]
    Selection(#[from] SelectError),

    /// Every candidate's backend rejected the network.
    #[error("no device accepted the network '{network}'; tried: {tried}")]
    NoDeviceAccepted {
        /// The network that could not be placed.
        network: String,
        /// Comma-separated names of the rejecting devices.
        tried: String,
    },

    /// No device successfully answered the layer query.
    #[error("no device answered the layer query; check the device environment")]
    QueryFailed,

    /// A backend call failed outside the compile-retry loop.
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// Scheduler construction failed after a successful compile.
    #[error(transparent)]
    Scheduler(#[from] InferError),

    /// Configuration file or value error.
    #[error("configuration error: {0}")]
    Config(String),
}
