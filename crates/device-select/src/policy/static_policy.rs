// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The `STATIC` selection policy.
//!
//! Candidates are partitioned by class and walked in the fixed preference
//! order VPUX, GPU, GNA, MYRIAD, CPU. The first class whose capability
//! advertisement names the network's precision wins; with no precision
//! match anywhere, CPU is the safety net. Precision affinity keeps the
//! dispatcher from picking an accelerator that would silently degrade
//! the network.

use super::SelectionPolicy;
use crate::{CapabilityAdvertisement, DeviceClass, DeviceDescriptor, SelectError};
use backend_api::{Network, Precision};
use std::collections::HashMap;

/// Rank by class priority, then network precision, then name.
#[derive(Debug, Default)]
pub struct StaticPolicy;

impl StaticPolicy {
    /// Creates the policy.
    pub fn new() -> Self {
        Self
    }

    /// The precision token the network is matched under: the first input
    /// tensor's precision, normalized (`I8` becomes `INT8`).
    fn network_precision(network: &Network) -> Option<&'static str> {
        network.first_input_precision().map(Precision::normalized)
    }
}

impl SelectionPolicy for StaticPolicy {
    fn name(&self) -> &str {
        "STATIC"
    }

    fn select(
        &self,
        network: &Network,
        candidates: &[DeviceDescriptor],
        capabilities: &[CapabilityAdvertisement],
    ) -> Result<DeviceDescriptor, SelectError> {
        // Partition by class; a name outside the known classes is a
        // hard error, not a skip.
        let mut partitions: HashMap<DeviceClass, Vec<&DeviceDescriptor>> = HashMap::new();
        for candidate in candidates {
            let class = candidate
                .class()
                .ok_or_else(|| SelectError::UnknownDeviceClass(candidate.device_name.clone()))?;
            partitions.entry(class).or_default().push(candidate);
        }

        if partitions.is_empty() {
            return Err(SelectError::NoDeviceAvailable);
        }

        // Lexicographic order within each class; the GPU partition is
        // reversed so GPU.1 (discrete) precedes GPU.0 (integrated).
        for (class, partition) in partitions.iter_mut() {
            partition.sort_by(|a, b| a.device_name.cmp(&b.device_name));
            if *class == DeviceClass::Gpu {
                partition.reverse();
            }
        }

        let precision = Self::network_precision(network);
        if let Some(token) = precision {
            for class in DeviceClass::PREFERENCE_ORDER {
                let Some(partition) = partitions.get(&class) else {
                    continue;
                };
                let advertised = capabilities
                    .iter()
                    .any(|adv| adv.is_for_class(class) && adv.supports(token));
                if advertised {
                    let chosen = partition[0].clone();
                    tracing::info!(
                        device = %chosen.device_name,
                        precision = token,
                        "selected device by precision affinity"
                    );
                    return Ok(chosen);
                }
            }
        }

        // No class advertised the precision: CPU is the safety net.
        match partitions.get(&DeviceClass::Cpu) {
            Some(partition) => {
                let chosen = partition[0].clone();
                tracing::info!(
                    device = %chosen.device_name,
                    precision = precision.unwrap_or("unknown"),
                    "no precision match, falling back to CPU"
                );
                Ok(chosen)
            }
            None => Err(SelectError::NoDeviceUsable),
        }
    }
}
