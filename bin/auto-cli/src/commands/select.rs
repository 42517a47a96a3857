// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `select` command: report the dispatcher's device choice.

use backend_api::keys;
use dispatcher::AutoDispatcher;
use std::sync::Arc;
use std::time::Duration;

pub fn execute(
    specs: &[String],
    precision: &str,
    priorities: Option<String>,
) -> anyhow::Result<()> {
    let registry = Arc::new(super::registry_with_latency(specs, Duration::ZERO)?);
    let dispatcher = AutoDispatcher::with_registry(registry);
    let network = super::demo_network(precision)?;

    let devices = dispatcher
        .get_metric(keys::metrics::AVAILABLE_DEVICES)?
        .as_strings()
        .map(<[String]>::to_vec)
        .unwrap_or_default();
    println!("Candidates: {}", devices.join(", "));

    let caps = dispatcher
        .get_metric(keys::metrics::OPTIMIZATION_CAPABILITIES)?
        .as_strings()
        .map(|tokens| tokens.join(" "))
        .unwrap_or_default();
    println!("Aggregated capabilities: {caps}");

    let sched = dispatcher.compile(&network, &super::priorities_config(priorities))?;
    println!(
        "Selected device for {precision} network: {} ({} worker slots)",
        sched.device(),
        sched.slot_count(),
    );
    Ok(())
}
