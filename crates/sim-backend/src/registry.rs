// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! A registry mapping device names to simulated backends.

use crate::SimDevice;
use backend_api::{BackendError, BackendRegistry, DeviceBackend};
use std::collections::BTreeMap;
use std::sync::Arc;

/// In-memory device enumeration over [`SimDevice`] backends.
///
/// Keys are full device names (`CPU`, `GPU.0`, `GPU.1`); values are the
/// backends serving them. Iteration order, and therefore
/// `available_devices`, is the sorted name order.
#[derive(Default)]
pub struct SimRegistry {
    devices: BTreeMap<String, Arc<dyn DeviceBackend>>,
}

impl SimRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `device` under `name`, replacing any previous entry.
    pub fn with_device(mut self, name: impl Into<String>, device: SimDevice) -> Self {
        self.devices.insert(name.into(), Arc::new(device));
        self
    }
}

impl BackendRegistry for SimRegistry {
    fn available_devices(&self) -> Vec<String> {
        self.devices.keys().cloned().collect()
    }

    fn backend(&self, device_name: &str) -> Result<Arc<dyn DeviceBackend>, BackendError> {
        self.devices
            .get(device_name)
            .cloned()
            .ok_or_else(|| BackendError::NotFound(format!("device '{device_name}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enumeration_sorted() {
        let registry = SimRegistry::new()
            .with_device("GPU.0", SimDevice::new("GPU", &["FP16"]))
            .with_device("CPU", SimDevice::new("CPU", &["FP32"]));
        assert_eq!(registry.available_devices(), vec!["CPU", "GPU.0"]);
    }

    #[test]
    fn test_unknown_device() {
        let registry = SimRegistry::new();
        assert!(matches!(
            registry.backend("VPUX"),
            Err(BackendError::NotFound(_))
        ));
    }
}
