// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The top-level automatic device dispatcher.
//!
//! [`AutoDispatcher`] ties the pieces together: it merges stored and
//! per-call configuration, enumerates candidate devices through the
//! installed [`BackendRegistry`], runs the selection policy, delegates
//! the compile to the winning device's backend, and wraps the result in
//! a [`NetworkScheduler`].
//!
//! A backend that rejects the network does not end the story: the
//! failed candidate is removed and selection re-runs over the remainder
//! until a device accepts or the list is exhausted.

use crate::{merge_configs, DispatchError};
use backend_api::{
    keys, BackendRegistry, CompiledNetwork, ConfigMap, DeviceBackend, MetricValue, Network,
};
use device_select::{
    parse_device_list, CapabilityAdvertisement, DeviceClass, DeviceDescriptor, ScheduleType,
};
use scheduler::NetworkScheduler;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex};

/// The fixed name identifying this dispatcher to callers and backends.
pub const DISPATCHER_NAME: &str = "AUTO";

/// Automatic device dispatcher.
pub struct AutoDispatcher {
    registry: Option<Arc<dyn BackendRegistry>>,
    config: Mutex<ConfigMap>,
}

impl AutoDispatcher {
    /// Creates a dispatcher without a registry. Compiling or querying
    /// before [`AutoDispatcher::set_registry`] is caller misuse.
    pub fn new() -> Self {
        Self {
            registry: None,
            config: Mutex::new(ConfigMap::new()),
        }
    }

    /// Creates a dispatcher over the given registry.
    pub fn with_registry(registry: Arc<dyn BackendRegistry>) -> Self {
        Self {
            registry: Some(registry),
            config: Mutex::new(ConfigMap::new()),
        }
    }

    /// Installs the device enumeration.
    pub fn set_registry(&mut self, registry: Arc<dyn BackendRegistry>) {
        self.registry = Some(registry);
    }

    /// Merges `config` into the dispatcher's stored configuration.
    pub fn set_config(&self, config: ConfigMap) {
        let mut stored = self.config.lock().expect("config lock poisoned");
        for (key, value) in config {
            stored.insert(key, value);
        }
    }

    /// Looks up a stored config value. An unknown key is a hard error.
    pub fn get_config(&self, key: &str) -> Result<String, DispatchError> {
        self.config
            .lock()
            .expect("config lock poisoned")
            .get(key)
            .cloned()
            .ok_or_else(|| DispatchError::UnknownConfigKey(key.to_string()))
    }

    /// Compiles `network` on the best available device and returns its
    /// scheduler.
    pub fn compile(
        &self,
        network: &Network,
        call_config: &ConfigMap,
    ) -> Result<NetworkScheduler, DispatchError> {
        let registry = self.registry.as_deref().ok_or(DispatchError::NoRegistry)?;
        if !network.is_graph() {
            return Err(DispatchError::UnsupportedNetwork(network.name.clone()));
        }

        let full_config = self.merged_config(call_config);
        let schedule_type = match full_config.get(keys::config::SCHEDULE_TYPE) {
            Some(value) => ScheduleType::parse(value)?,
            None => ScheduleType::Static,
        };
        let policy = schedule_type.create_policy();

        let mut candidates = self.parse_meta_devices(registry, &full_config)?;
        let initial_names: Vec<String> = candidates
            .iter()
            .map(|c| c.device_name.clone())
            .collect();
        let capabilities = capability_advertisements(registry, &candidates);

        let mut tried: Vec<String> = Vec::new();
        while !candidates.is_empty() {
            let chosen = match policy.select(network, &candidates, &capabilities) {
                Ok(chosen) => chosen,
                Err(e) if tried.is_empty() => return Err(e.into()),
                Err(_) => break,
            };

            match self.compile_on(registry, network, &chosen) {
                Ok(compiled) => {
                    // Perf counting is inherited from the compiled
                    // network, not assumed from our own config.
                    let need_perf = compiled
                        .get_config(keys::config::PERF_COUNT)
                        .map(|v| v == keys::config::YES)
                        .unwrap_or(false);
                    tracing::info!(
                        device = %chosen,
                        network = %network.name,
                        perf_counters = need_perf,
                        "network compiled"
                    );
                    return Ok(NetworkScheduler::new(
                        compiled,
                        chosen,
                        full_config,
                        need_perf,
                        network,
                        initial_names,
                    )?);
                }
                Err(e) => {
                    tracing::warn!(
                        device = %chosen,
                        error = %e,
                        "compile failed, removing candidate and retrying"
                    );
                    candidates.retain(|c| *c != chosen);
                    tried.push(chosen.device_name);
                }
            }
        }

        if tried.is_empty() {
            Err(device_select::SelectError::NoDeviceAvailable.into())
        } else {
            Err(DispatchError::NoDeviceAccepted {
                network: network.name.clone(),
                tried: tried.join(","),
            })
        }
    }

    fn compile_on(
        &self,
        registry: &dyn BackendRegistry,
        network: &Network,
        device: &DeviceDescriptor,
    ) -> Result<Arc<dyn backend_api::CompiledNetwork>, DispatchError> {
        let backend = registry.backend(&device.device_name)?;
        Ok(backend.load_network(network, &device.config)?)
    }

    /// Reports which layers of `network` every queryable candidate
    /// supports, keyed by layer name and tagged with this dispatcher's
    /// identifier.
    ///
    /// Devices whose query fails are skipped; a device returning an
    /// empty set after another device already reported layers is
    /// treated as query-unsupported and ignored. At least one device
    /// must answer, or the whole query fails.
    pub fn query_layers(
        &self,
        network: &Network,
        call_config: &ConfigMap,
    ) -> Result<BTreeMap<String, String>, DispatchError> {
        let registry = self.registry.as_deref().ok_or(DispatchError::NoRegistry)?;
        if !network.is_graph() {
            return Err(DispatchError::UnsupportedNetwork(network.name.clone()));
        }

        let full_config = self.merged_config(call_config);
        let candidates = self.parse_meta_devices(registry, &full_config)?;

        let mut supported: BTreeSet<String> = BTreeSet::new();
        let mut participants = 0usize;
        for candidate in &candidates {
            if candidate.device_name == DISPATCHER_NAME {
                continue;
            }
            let Ok(backend) = registry.backend(&candidate.device_name) else {
                continue;
            };
            match backend.query_network(network, &candidate.config) {
                Ok(device_layers) => {
                    participants += 1;
                    let device_layers: BTreeSet<String> =
                        device_layers.into_keys().collect();
                    supported = if supported.is_empty() {
                        device_layers
                    } else if device_layers.is_empty() {
                        supported
                    } else {
                        supported.intersection(&device_layers).cloned().collect()
                    };
                }
                Err(e) => {
                    tracing::debug!(
                        device = %candidate,
                        error = %e,
                        "device skipped in layer query"
                    );
                }
            }
        }

        if participants == 0 {
            return Err(DispatchError::QueryFailed);
        }
        Ok(supported
            .into_iter()
            .map(|layer| (layer, DISPATCHER_NAME.to_string()))
            .collect())
    }

    /// Answers a dispatcher-level metric query.
    pub fn get_metric(&self, key: &str) -> Result<MetricValue, DispatchError> {
        match key {
            keys::metrics::SUPPORTED_METRICS => Ok(MetricValue::Strings(vec![
                keys::metrics::AVAILABLE_DEVICES.into(),
                keys::metrics::SUPPORTED_METRICS.into(),
                keys::metrics::FULL_DEVICE_NAME.into(),
                keys::metrics::SUPPORTED_CONFIG_KEYS.into(),
                keys::metrics::OPTIMIZATION_CAPABILITIES.into(),
            ])),
            keys::metrics::AVAILABLE_DEVICES => {
                let devices = match &self.registry {
                    Some(registry) => registry
                        .available_devices()
                        .into_iter()
                        .filter(|d| d != DISPATCHER_NAME)
                        .collect(),
                    None => Vec::new(),
                };
                Ok(MetricValue::Strings(devices))
            }
            keys::metrics::FULL_DEVICE_NAME => {
                Ok(MetricValue::Str(DISPATCHER_NAME.to_string()))
            }
            keys::metrics::SUPPORTED_CONFIG_KEYS => Ok(MetricValue::Strings(vec![
                keys::config::DEVICE_PRIORITIES.into(),
                keys::config::DEVICE_CHOICE.into(),
                keys::config::SCHEDULE_TYPE.into(),
                keys::config::PERF_COUNT.into(),
            ])),
            keys::metrics::OPTIMIZATION_CAPABILITIES => {
                let mut aggregated: Vec<String> = Vec::new();
                if let Some(registry) = &self.registry {
                    for device in registry.available_devices() {
                        if device == DISPATCHER_NAME {
                            continue;
                        }
                        let Ok(backend) = registry.backend(&device) else {
                            continue;
                        };
                        let Ok(metric) =
                            backend.get_metric(keys::metrics::OPTIMIZATION_CAPABILITIES)
                        else {
                            continue;
                        };
                        if let Some(tokens) = metric.as_strings() {
                            for token in tokens {
                                if !aggregated.contains(token) {
                                    aggregated.push(token.clone());
                                }
                            }
                        }
                    }
                }
                Ok(MetricValue::Strings(aggregated))
            }
            other => Err(DispatchError::UnknownMetricKey(other.to_string())),
        }
    }

    fn merged_config(&self, call_config: &ConfigMap) -> ConfigMap {
        let stored = self.config.lock().expect("config lock poisoned").clone();
        merge_configs(stored, call_config)
    }

    /// Resolves the candidate descriptor list: the configured device
    /// priorities when present, otherwise everything the registry
    /// enumerates (minus the dispatcher itself). Each candidate's
    /// config is filtered to the keys its backend advertises, with the
    /// instance id from a `NAME.id` suffix injected as `DEVICE_ID`.
    fn parse_meta_devices(
        &self,
        registry: &dyn BackendRegistry,
        full_config: &ConfigMap,
    ) -> Result<Vec<DeviceDescriptor>, DispatchError> {
        let choice = full_config
            .get(keys::config::DEVICE_PRIORITIES)
            .or_else(|| full_config.get(keys::config::DEVICE_CHOICE))
            .cloned()
            .unwrap_or_else(|| {
                registry
                    .available_devices()
                    .into_iter()
                    .filter(|d| d != DISPATCHER_NAME)
                    .collect::<Vec<_>>()
                    .join(",")
            });
        if choice.is_empty() {
            return Ok(Vec::new());
        }

        let mut candidates = Vec::new();
        for (name, request_count) in parse_device_list(&choice)? {
            let mut device_config = full_config.clone();
            if let Some((_, id)) = name.split_once('.') {
                device_config.insert(keys::config::DEVICE_ID.into(), id.to_string());
            }
            let device_config = supported_config(registry, &name, device_config);
            candidates.push(DeviceDescriptor::with_request_count(
                name,
                device_config,
                request_count,
            ));
        }
        Ok(candidates)
    }
}

impl Default for AutoDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

/// Filters `config` down to the keys `device_name`'s backend accepts.
/// An unreachable backend yields an empty config; the compile attempt
/// on that device will surface the real problem.
fn supported_config(
    registry: &dyn BackendRegistry,
    device_name: &str,
    config: ConfigMap,
) -> ConfigMap {
    let Ok(backend) = registry.backend(device_name) else {
        return ConfigMap::new();
    };
    let Ok(metric) = backend.get_metric(keys::metrics::SUPPORTED_CONFIG_KEYS) else {
        return ConfigMap::new();
    };
    let Some(supported_keys) = metric.as_strings().map(<[String]>::to_vec) else {
        return ConfigMap::new();
    };
    config
        .into_iter()
        .filter(|(key, _)| supported_keys.iter().any(|k| k == key))
        .collect()
}

/// Builds one capability advertisement per candidate class, querying
/// each backend once and unioning tokens within a class.
fn capability_advertisements(
    registry: &dyn BackendRegistry,
    candidates: &[DeviceDescriptor],
) -> Vec<CapabilityAdvertisement> {
    let mut classes: Vec<(DeviceClass, Vec<String>)> = Vec::new();
    for candidate in candidates {
        let Some(class) = candidate.class() else {
            continue;
        };
        let Ok(backend) = registry.backend(&candidate.device_name) else {
            continue;
        };
        let Ok(metric) = backend.get_metric(keys::metrics::OPTIMIZATION_CAPABILITIES) else {
            continue;
        };
        let Some(tokens) = metric.as_strings() else {
            continue;
        };
        match classes.iter_mut().find(|(c, _)| *c == class) {
            Some((_, existing)) => {
                for token in tokens {
                    if !existing.contains(token) {
                        existing.push(token.clone());
                    }
                }
            }
            None => classes.push((class, tokens.to_vec())),
        }
    }
    classes
        .into_iter()
        .map(|(class, tokens)| CapabilityAdvertisement::new(class, &tokens))
        .collect()
}
