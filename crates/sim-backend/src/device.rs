// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The simulated device and its compiled-network handle.

use crate::SimRequest;
use backend_api::{
    keys, BackendError, CompiledNetwork, ConfigMap, DeviceBackend, MetricValue, Network,
    TensorDesc,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

/// Tunable simulated device plugin.
#[derive(Clone)]
pub struct SimDevice {
    class_label: String,
    capabilities: Vec<String>,
    optimal_requests: u32,
    latency: Duration,
    fail_compile: bool,
    fail_inference: bool,
    fail_query: bool,
    advertise_optimal: bool,
    honor_perf_count: bool,
    unsupported_layers: Vec<String>,
    remote_context: Option<String>,
}

impl SimDevice {
    /// Creates a device of the given class advertising `capabilities`
    /// precision tokens. Defaults: 4 optimal requests, zero latency,
    /// no failure injection, perf counting honored.
    pub fn new(class_label: impl Into<String>, capabilities: &[&str]) -> Self {
        Self {
            class_label: class_label.into(),
            capabilities: capabilities.iter().map(|s| s.to_string()).collect(),
            optimal_requests: 4,
            latency: Duration::ZERO,
            fail_compile: false,
            fail_inference: false,
            fail_query: false,
            advertise_optimal: true,
            honor_perf_count: true,
            unsupported_layers: Vec::new(),
            remote_context: None,
        }
    }

    /// Sets the simulated device-side inference latency.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Sets the advertised optimal in-flight request count.
    pub fn with_optimal_requests(mut self, n: u32) -> Self {
        self.optimal_requests = n;
        self
    }

    /// Makes every compile attempt fail.
    pub fn failing_compile(mut self) -> Self {
        self.fail_compile = true;
        self
    }

    /// Makes every inference complete with a failure status.
    pub fn failing_inference(mut self) -> Self {
        self.fail_inference = true;
        self
    }

    /// Makes `query_network` fail.
    pub fn failing_query(mut self) -> Self {
        self.fail_query = true;
        self
    }

    /// Drops the `OPTIMAL_NUMBER_OF_INFER_REQUESTS` metric.
    pub fn without_optimal_metric(mut self) -> Self {
        self.advertise_optimal = false;
        self
    }

    /// Makes the device ignore `PERF_COUNT` requests.
    pub fn ignoring_perf_count(mut self) -> Self {
        self.honor_perf_count = false;
        self
    }

    /// Declares `layer` unsupported in `query_network` answers.
    pub fn without_layer(mut self, layer: impl Into<String>) -> Self {
        self.unsupported_layers.push(layer.into());
        self
    }

    /// Gives the device a remote context handle.
    pub fn with_remote_context(mut self, context: impl Into<String>) -> Self {
        self.remote_context = Some(context.into());
        self
    }
}

impl DeviceBackend for SimDevice {
    fn query_network(
        &self,
        network: &Network,
        _config: &ConfigMap,
    ) -> Result<BTreeMap<String, String>, BackendError> {
        if self.fail_query {
            return Err(BackendError::NotImplemented(format!(
                "{} does not answer layer queries",
                self.class_label
            )));
        }
        Ok(network
            .layers
            .iter()
            .filter(|layer| !self.unsupported_layers.contains(layer))
            .map(|layer| (layer.clone(), self.class_label.clone()))
            .collect())
    }

    fn load_network(
        &self,
        network: &Network,
        config: &ConfigMap,
    ) -> Result<Arc<dyn CompiledNetwork>, BackendError> {
        if self.fail_compile {
            return Err(BackendError::CompileFailed {
                device: self.class_label.clone(),
                detail: "simulated compile rejection".into(),
            });
        }
        tracing::debug!(
            device = %self.class_label,
            network = %network.name,
            "compiling network"
        );
        let perf_count_enabled = self.honor_perf_count
            && config.get(keys::config::PERF_COUNT).map(String::as_str)
                == Some(keys::config::YES);
        Ok(Arc::new(SimCompiledNetwork {
            device: self.clone(),
            network_name: network.name.clone(),
            inputs: network.inputs.clone(),
            outputs: network.outputs.clone(),
            layers: network.layers.clone(),
            perf_count_enabled,
        }))
    }

    fn get_metric(&self, key: &str) -> Result<MetricValue, BackendError> {
        match key {
            keys::metrics::OPTIMIZATION_CAPABILITIES => {
                Ok(MetricValue::Strings(self.capabilities.clone()))
            }
            keys::metrics::SUPPORTED_CONFIG_KEYS => Ok(MetricValue::Strings(vec![
                keys::config::PERF_COUNT.into(),
                keys::config::DEVICE_ID.into(),
            ])),
            keys::metrics::FULL_DEVICE_NAME => {
                Ok(MetricValue::Str(format!("Simulated {}", self.class_label)))
            }
            other => Err(BackendError::NotFound(format!(
                "backend metric '{other}'"
            ))),
        }
    }
}

/// A network "compiled" by a [`SimDevice`].
pub struct SimCompiledNetwork {
    device: SimDevice,
    network_name: String,
    inputs: Vec<TensorDesc>,
    outputs: Vec<TensorDesc>,
    layers: Vec<String>,
    perf_count_enabled: bool,
}

impl CompiledNetwork for SimCompiledNetwork {
    fn create_infer_request(&self) -> Result<Arc<dyn backend_api::DeviceRequest>, BackendError> {
        Ok(Arc::new(SimRequest::new(
            &self.inputs,
            &self.outputs,
            self.layers.clone(),
            self.device.latency,
            self.device.fail_inference,
            self.perf_count_enabled,
        )))
    }

    fn get_metric(&self, key: &str) -> Result<MetricValue, BackendError> {
        match key {
            keys::metrics::OPTIMAL_NUMBER_OF_INFER_REQUESTS if self.device.advertise_optimal => {
                Ok(MetricValue::UInt(self.device.optimal_requests))
            }
            keys::metrics::NETWORK_NAME => Ok(MetricValue::Str(self.network_name.clone())),
            other => Err(BackendError::NotFound(format!(
                "compiled network metric '{other}'"
            ))),
        }
    }

    fn get_config(&self, key: &str) -> Result<String, BackendError> {
        match key {
            keys::config::PERF_COUNT => Ok(if self.perf_count_enabled {
                keys::config::YES.to_string()
            } else {
                keys::config::NO.to_string()
            }),
            other => Err(BackendError::NotFound(format!(
                "compiled network config '{other}'"
            ))),
        }
    }

    fn get_context(&self) -> Result<String, BackendError> {
        self.device.remote_context.clone().ok_or_else(|| {
            BackendError::NotImplemented("no remote context for this device".into())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use backend_api::Precision;

    fn network() -> Network {
        Network::new(
            "sim-net",
            vec![TensorDesc::new("data", Precision::FP32, vec![1, 4])],
            vec![TensorDesc::new("prob", Precision::FP32, vec![1, 2])],
        )
        .with_layers(vec!["conv1".into(), "relu1".into(), "fc1".into()])
    }

    #[test]
    fn test_query_network_filters_unsupported() {
        let device = SimDevice::new("GPU", &["FP16"]).without_layer("fc1");
        let supported = device.query_network(&network(), &ConfigMap::new()).unwrap();
        assert_eq!(supported.len(), 2);
        assert!(supported.contains_key("conv1"));
        assert!(!supported.contains_key("fc1"));
    }

    #[test]
    fn test_failing_compile() {
        let device = SimDevice::new("GPU", &["FP16"]).failing_compile();
        assert!(matches!(
            device.load_network(&network(), &ConfigMap::new()),
            Err(BackendError::CompileFailed { .. })
        ));
    }

    #[test]
    fn test_perf_count_inheritance() {
        let mut config = ConfigMap::new();
        config.insert(keys::config::PERF_COUNT.into(), keys::config::YES.into());

        let compiled = SimDevice::new("CPU", &["FP32"])
            .load_network(&network(), &config)
            .unwrap();
        assert_eq!(compiled.get_config(keys::config::PERF_COUNT).unwrap(), "YES");

        let deaf = SimDevice::new("CPU", &["FP32"])
            .ignoring_perf_count()
            .load_network(&network(), &config)
            .unwrap();
        assert_eq!(deaf.get_config(keys::config::PERF_COUNT).unwrap(), "NO");
    }

    #[test]
    fn test_optimal_metric() {
        let compiled = SimDevice::new("CPU", &["FP32"])
            .with_optimal_requests(7)
            .load_network(&network(), &ConfigMap::new())
            .unwrap();
        assert_eq!(
            compiled
                .get_metric(keys::metrics::OPTIMAL_NUMBER_OF_INFER_REQUESTS)
                .unwrap()
                .as_uint(),
            Some(7)
        );

        let silent = SimDevice::new("CPU", &["FP32"])
            .without_optimal_metric()
            .load_network(&network(), &ConfigMap::new())
            .unwrap();
        assert!(silent
            .get_metric(keys::metrics::OPTIMAL_NUMBER_OF_INFER_REQUESTS)
            .is_err());
    }

    #[test]
    fn test_remote_context() {
        let with = SimDevice::new("GPU", &["FP16"])
            .with_remote_context("ocl-context-0")
            .load_network(&network(), &ConfigMap::new())
            .unwrap();
        assert_eq!(with.get_context().unwrap(), "ocl-context-0");

        let without = SimDevice::new("CPU", &["FP32"])
            .load_network(&network(), &ConfigMap::new())
            .unwrap();
        assert!(without.get_context().is_err());
    }
}
