// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Dispatcher configuration loaded from TOML files or constructed
//! programmatically.
//!
//! # TOML Format
//! ```toml
//! device_priorities = "GPU.1(4),CPU"
//! schedule_type = "STATIC"
//! perf_count = true
//! ```
//!
//! The structured form is a convenience layer for embedders and the
//! CLI; the core consumes the flat key/value map produced by
//! [`AutoConfig::to_config_map`].

use crate::DispatchError;
use backend_api::{keys, ConfigMap};
use std::path::Path;

/// Structured dispatcher configuration.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct AutoConfig {
    /// Comma-separated device list overriding enumeration; entries may
    /// carry a `NAME(n)` request-count hint.
    pub device_priorities: Option<String>,
    /// Selection policy name. Only `"STATIC"` is implemented.
    #[serde(default = "default_schedule_type")]
    pub schedule_type: String,
    /// Whether to collect per-layer performance counters.
    #[serde(default)]
    pub perf_count: bool,
}

fn default_schedule_type() -> String {
    "STATIC".to_string()
}

impl AutoConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, DispatchError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            DispatchError::Config(format!("cannot read config '{}': {e}", path.display()))
        })?;
        Self::from_toml(&content)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, DispatchError> {
        toml::from_str(toml_str)
            .map_err(|e| DispatchError::Config(format!("TOML parse error: {e}")))
    }

    /// Serialises configuration to TOML.
    pub fn to_toml(&self) -> Result<String, DispatchError> {
        toml::to_string_pretty(self)
            .map_err(|e| DispatchError::Config(format!("TOML serialise error: {e}")))
    }

    /// Flattens into the key/value map the dispatcher core consumes.
    pub fn to_config_map(&self) -> ConfigMap {
        let mut map = ConfigMap::new();
        if let Some(priorities) = &self.device_priorities {
            map.insert(keys::config::DEVICE_PRIORITIES.into(), priorities.clone());
        }
        map.insert(keys::config::SCHEDULE_TYPE.into(), self.schedule_type.clone());
        map.insert(
            keys::config::PERF_COUNT.into(),
            if self.perf_count {
                keys::config::YES.into()
            } else {
                keys::config::NO.into()
            },
        );
        map
    }
}

impl Default for AutoConfig {
    fn default() -> Self {
        Self {
            device_priorities: None,
            schedule_type: default_schedule_type(),
            perf_count: false,
        }
    }
}
