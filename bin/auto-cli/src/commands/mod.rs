// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Subcommand implementations and shared CLI plumbing.

pub mod query;
pub mod run;
pub mod select;

use anyhow::{bail, Context};
use backend_api::{Network, Precision, TensorDesc};
use sim_backend::{SimDevice, SimRegistry};
use std::time::Duration;

/// Initialises the tracing subscriber from the `-v` count; `RUST_LOG`
/// takes precedence when set.
pub fn init_tracing(verbose: u8) {
    use tracing_subscriber::EnvFilter;

    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// The device fleet to simulate when no `--device` flags are given.
fn default_specs() -> Vec<String> {
    vec![
        "CPU:FP32 INT8".to_string(),
        "GPU.0:FP16 FP32".to_string(),
        "GPU.1:FP16 FP32".to_string(),
    ]
}

/// Parses one `NAME:PREC PREC ...` device spec.
fn parse_spec(spec: &str) -> anyhow::Result<(String, Vec<String>)> {
    let (name, caps) = spec
        .split_once(':')
        .with_context(|| format!("device spec '{spec}' must look like 'NAME:PREC PREC'"))?;
    let name = name.trim();
    if name.is_empty() {
        bail!("device spec '{spec}' has an empty name");
    }
    let caps: Vec<String> = caps.split_whitespace().map(str::to_string).collect();
    if caps.is_empty() {
        bail!("device spec '{spec}' advertises no precisions");
    }
    Ok((name.to_string(), caps))
}

/// Builds a simulated registry from `--device` specs. `tune` adjusts
/// each device (latency, exclusions) before registration.
pub fn build_registry(
    specs: &[String],
    tune: impl Fn(&str, SimDevice) -> SimDevice,
) -> anyhow::Result<SimRegistry> {
    let specs = if specs.is_empty() {
        default_specs()
    } else {
        specs.to_vec()
    };

    let mut registry = SimRegistry::new();
    for spec in &specs {
        let (name, caps) = parse_spec(spec)?;
        let class = name.split('.').next().unwrap_or(&name).to_string();
        let caps: Vec<&str> = caps.iter().map(String::as_str).collect();
        let device = tune(&name, SimDevice::new(class, &caps));
        registry = registry.with_device(name, device);
    }
    Ok(registry)
}

/// Convenience: registry with a uniform simulated latency.
pub fn registry_with_latency(
    specs: &[String],
    latency: Duration,
) -> anyhow::Result<SimRegistry> {
    build_registry(specs, |_, device| device.with_latency(latency))
}

/// A small synthetic network of the given input precision.
pub fn demo_network(precision: &str) -> anyhow::Result<Network> {
    let precision = Precision::parse(precision)
        .with_context(|| format!("unknown precision '{precision}'"))?;
    Ok(Network::new(
        "demo-net",
        vec![TensorDesc::new("data", precision, vec![1, 16])],
        vec![TensorDesc::new("prob", Precision::FP32, vec![1, 4])],
    )
    .with_layers(vec![
        "conv1".into(),
        "relu1".into(),
        "pool1".into(),
        "fc1".into(),
    ]))
}

/// Device-priorities config map from an optional override string.
pub fn priorities_config(priorities: Option<String>) -> backend_api::ConfigMap {
    let mut config = backend_api::ConfigMap::new();
    if let Some(priorities) = priorities {
        config.insert(
            backend_api::keys::config::DEVICE_PRIORITIES.into(),
            priorities,
        );
    }
    config
}
