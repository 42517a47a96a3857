// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Benchmarks end-to-end submission throughput over a zero-latency
//! simulated device.

use backend_api::{ConfigMap, DeviceBackend, Network, Precision, TensorDesc};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use device_select::DeviceDescriptor;
use scheduler::NetworkScheduler;
use sim_backend::SimDevice;

fn scheduler_with_slots(slots: i32) -> NetworkScheduler {
    let network = Network::new(
        "bench-net",
        vec![TensorDesc::new("in", Precision::U8, vec![16])],
        vec![TensorDesc::new("out", Precision::U8, vec![16])],
    );
    let device = SimDevice::new("CPU", &["FP32"]);
    let compiled = device.load_network(&network, &ConfigMap::new()).unwrap();
    let descriptor = DeviceDescriptor::with_request_count("CPU", ConfigMap::new(), slots);
    NetworkScheduler::new(
        compiled,
        descriptor,
        ConfigMap::new(),
        false,
        &network,
        vec!["CPU".into()],
    )
    .unwrap()
}

fn bench_infer(c: &mut Criterion) {
    let mut group = c.benchmark_group("submit_throughput");
    group.throughput(Throughput::Elements(1));
    for slots in [1i32, 4] {
        let sched = scheduler_with_slots(slots);
        let request = sched.create_request();
        group.bench_with_input(
            BenchmarkId::from_parameter(slots),
            &request,
            |b, request| {
                b.iter(|| request.infer().unwrap());
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_infer);
criterion_main!(benches);
