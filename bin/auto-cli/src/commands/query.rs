// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `query` command: intersect per-device layer support.

use anyhow::Context;
use backend_api::ConfigMap;
use dispatcher::AutoDispatcher;
use std::sync::Arc;

pub fn execute(specs: &[String], skips: &[String]) -> anyhow::Result<()> {
    // "DEVICE=LAYER" exclusions applied while building the registry.
    let mut exclusions: Vec<(String, String)> = Vec::new();
    for skip in skips {
        let (device, layer) = skip
            .split_once('=')
            .with_context(|| format!("skip '{skip}' must look like 'DEVICE=LAYER'"))?;
        exclusions.push((device.to_string(), layer.to_string()));
    }

    let registry = Arc::new(super::build_registry(specs, |name, mut device| {
        for (skip_device, layer) in &exclusions {
            if skip_device == name {
                device = device.without_layer(layer.clone());
            }
        }
        device
    })?);
    let dispatcher = AutoDispatcher::with_registry(registry);
    let network = super::demo_network("FP32")?;

    let supported = dispatcher.query_layers(&network, &ConfigMap::new())?;
    println!(
        "Layers supported by every device ({}/{}):",
        supported.len(),
        network.layers.len(),
    );
    for (layer, owner) in supported {
        println!("    {layer} -> {owner}");
    }
    Ok(())
}
