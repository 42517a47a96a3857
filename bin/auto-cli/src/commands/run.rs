// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `run` command: batch inferences through the worker pool.

use backend_api::keys;
use dispatcher::AutoDispatcher;
use std::sync::Arc;
use std::time::{Duration, Instant};

pub fn execute(
    specs: &[String],
    precision: &str,
    requests: usize,
    latency_ms: u64,
    perf_count: bool,
    priorities: Option<String>,
) -> anyhow::Result<()> {
    let registry = Arc::new(super::registry_with_latency(
        specs,
        Duration::from_millis(latency_ms),
    )?);
    let dispatcher = AutoDispatcher::with_registry(registry);
    let network = super::demo_network(precision)?;

    let mut config = super::priorities_config(priorities);
    if perf_count {
        config.insert(keys::config::PERF_COUNT.into(), keys::config::YES.into());
    }

    let sched = dispatcher.compile(&network, &config)?;
    println!(
        "Compiled on {} with {} worker slots",
        sched.device(),
        sched.slot_count(),
    );

    let handles: Vec<_> = (0..requests).map(|_| sched.create_request()).collect();

    let started = Instant::now();
    for handle in &handles {
        handle.start()?;
    }
    let mut failed = 0usize;
    for handle in &handles {
        if let Err(e) = handle.wait() {
            tracing::warn!(error = %e, "inference failed");
            failed += 1;
        }
    }
    let elapsed = started.elapsed();

    let completed = requests - failed;
    println!(
        "Ran {requests} inferences in {:.2} ms ({} completed, {failed} failed, {:.1} infer/s)",
        elapsed.as_secs_f64() * 1000.0,
        completed,
        completed as f64 / elapsed.as_secs_f64().max(f64::EPSILON),
    );
    println!(
        "Pool at rest: {}/{} slots idle, {} waiting",
        sched.idle_count(),
        sched.slot_count(),
        sched.waiting_count(),
    );

    if perf_count {
        if let Some(handle) = handles.first() {
            println!("Per-layer counters (first request):");
            for (layer, counter) in handle.performance_counts()? {
                println!(
                    "    {layer:<12} {:>6} us real, {:>6} us cpu ({})",
                    counter.real_time_us, counter.cpu_time_us, counter.exec_kind,
                );
            }
        }
    }
    Ok(())
}
