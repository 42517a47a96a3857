// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # dispatcher
//!
//! The automatic device dispatcher: given a network and a set of
//! heterogeneous compute backends, it picks the best device, compiles
//! the network there, and hands back a scheduler that pools inference
//! requests on that device.
//!
//! ```text
//! AutoDispatcher::compile(network, config)
//!     │  merge configs, enumerate candidates
//!     │  select device (STATIC policy)
//!     │  backend.load_network()  ── failure? drop candidate, retry
//!     ▼
//! NetworkScheduler ──create_request()──▶ AsyncInferRequest
//! ```
//!
//! Backends are injected through [`backend_api::BackendRegistry`]; the
//! dispatcher never instantiates device plugins itself.

mod config;
mod dispatcher;
mod error;

pub use config::AutoConfig;
pub use dispatcher::{AutoDispatcher, DISPATCHER_NAME};
pub use error::DispatchError;

use backend_api::ConfigMap;

/// Overlays `local` onto `base` and returns the result. Later values
/// win, matching per-call config precedence over stored config.
pub fn merge_configs(mut base: ConfigMap, local: &ConfigMap) -> ConfigMap {
    for (key, value) in local {
        base.insert(key.clone(), value.clone());
    }
    base
}
