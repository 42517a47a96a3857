// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for device selection.

/// Errors that can occur while parsing device lists or selecting a device.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SelectError {
    /// A candidate's name does not start with any known device class.
    #[error("unsupported device class for device named '{0}'")]
    UnknownDeviceClass(String),

    /// Every class partition is empty.
    #[error("no available device found")]
    NoDeviceAvailable,

    /// No class advertises the network precision and there is no CPU
    /// to fall back to.
    #[error("no available device could be used")]
    NoDeviceUsable,

    /// The requested selection policy is not implemented.
    #[error("schedule type '{0}' is not implemented")]
    PolicyNotImplemented(String),

    /// A device-list entry does not match `name ( "(" positive-int ")" )?`.
    #[error("malformed device list entry '{entry}': {detail}")]
    InvalidDeviceList { entry: String, detail: String },
}
