// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error type for the device-backend contract.

/// Errors a backend may return from any contract operation.
#[derive(Debug, Clone, thiserror::Error)]
pub enum BackendError {
    /// The backend does not implement the requested operation.
    #[error("not implemented: {0}")]
    NotImplemented(String),

    /// A named entity (metric, config key, blob, device) is unknown.
    #[error("not found: {0}")]
    NotFound(String),

    /// The backend rejected the network at compile time.
    #[error("device '{device}' failed to compile the network: {detail}")]
    CompileFailed { device: String, detail: String },

    /// Any other device-side failure.
    #[error("device error: {0}")]
    Device(String),
}
