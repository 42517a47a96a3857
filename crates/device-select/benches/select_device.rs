// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Benchmarks the static selection policy over growing candidate lists.

use backend_api::{ConfigMap, Network, Precision, TensorDesc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use device_select::{CapabilityAdvertisement, DeviceClass, DeviceDescriptor, StaticPolicy, SelectionPolicy};

fn candidates(n: usize) -> Vec<DeviceDescriptor> {
    let mut list = vec![DeviceDescriptor::new("CPU", ConfigMap::new())];
    for i in 0..n {
        list.push(DeviceDescriptor::new(format!("GPU.{i}"), ConfigMap::new()));
    }
    list
}

fn bench_select(c: &mut Criterion) {
    let network = Network::new(
        "bench-net",
        vec![TensorDesc::new("data", Precision::FP16, vec![1, 3, 224, 224])],
        vec![],
    );
    let caps = vec![
        CapabilityAdvertisement::new(DeviceClass::Cpu, &["FP32".into()]),
        CapabilityAdvertisement::new(DeviceClass::Gpu, &["FP16".into(), "FP32".into()]),
    ];
    let policy = StaticPolicy::new();

    let mut group = c.benchmark_group("static_select");
    for n in [2usize, 8, 32] {
        let list = candidates(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &list, |b, list| {
            b.iter(|| {
                policy
                    .select(black_box(&network), black_box(list), black_box(&caps))
                    .unwrap()
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_select);
criterion_main!(benches);
