// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Integration tests: the full dispatch flow from candidate enumeration
//! through selection, compile (with retry), scheduling, and inference,
//! over simulated devices.

use backend_api::{keys, ConfigMap, Network, Precision, TensorDesc};
use dispatcher::{AutoConfig, AutoDispatcher, DispatchError, DISPATCHER_NAME};
use sim_backend::{SimDevice, SimRegistry};
use std::sync::Arc;

// ── Helpers ────────────────────────────────────────────────────

fn network(precision: Precision) -> Network {
    Network::new(
        "itest-net",
        vec![TensorDesc::new("in", precision, vec![4])],
        vec![TensorDesc::new("out", Precision::U8, vec![4])],
    )
    .with_layers(vec!["conv1".into(), "relu1".into(), "fc1".into()])
}

fn three_device_registry() -> Arc<SimRegistry> {
    Arc::new(
        SimRegistry::new()
            .with_device("CPU", SimDevice::new("CPU", &["FP32", "INT8"]))
            .with_device("GPU.0", SimDevice::new("GPU", &["FP16", "FP32"]))
            .with_device("GPU.1", SimDevice::new("GPU", &["FP16", "FP32"])),
    )
}

fn dispatcher_over(registry: Arc<SimRegistry>) -> AutoDispatcher {
    AutoDispatcher::with_registry(registry)
}

// ── Selection through compile ──────────────────────────────────

#[test]
fn test_fp16_network_lands_on_discrete_gpu() {
    let dispatcher = dispatcher_over(three_device_registry());
    let sched = dispatcher
        .compile(&network(Precision::FP16), &ConfigMap::new())
        .unwrap();
    assert_eq!(sched.device().device_name, "GPU.1");
}

#[test]
fn test_int8_network_falls_back_to_cpu() {
    let registry = Arc::new(
        SimRegistry::new()
            .with_device("CPU", SimDevice::new("CPU", &["FP32", "INT8"]))
            .with_device("GPU.0", SimDevice::new("GPU", &["FP16"])),
    );
    let sched = dispatcher_over(registry)
        .compile(&network(Precision::I8), &ConfigMap::new())
        .unwrap();
    assert_eq!(sched.device().device_name, "CPU");
}

#[test]
fn test_selection_is_repeatable() {
    let dispatcher = dispatcher_over(three_device_registry());
    let first = dispatcher
        .compile(&network(Precision::FP16), &ConfigMap::new())
        .unwrap();
    let second = dispatcher
        .compile(&network(Precision::FP16), &ConfigMap::new())
        .unwrap();
    assert_eq!(
        first.device().device_name,
        second.device().device_name
    );
}

// ── Compile retry ──────────────────────────────────────────────

#[test]
fn test_compile_retries_next_candidate() {
    let registry = Arc::new(
        SimRegistry::new()
            .with_device("CPU", SimDevice::new("CPU", &["FP32", "FP16"]))
            .with_device(
                "GPU.0",
                SimDevice::new("GPU", &["FP16", "FP32"]).failing_compile(),
            ),
    );
    let sched = dispatcher_over(registry)
        .compile(&network(Precision::FP16), &ConfigMap::new())
        .unwrap();
    // The GPU won selection but rejected the compile; retry lands CPU.
    assert_eq!(sched.device().device_name, "CPU");
}

#[test]
fn test_all_candidates_rejecting_is_terminal() {
    let registry = Arc::new(
        SimRegistry::new()
            .with_device("CPU", SimDevice::new("CPU", &["FP32"]).failing_compile())
            .with_device(
                "GPU.0",
                SimDevice::new("GPU", &["FP32"]).failing_compile(),
            ),
    );
    let err = dispatcher_over(registry)
        .compile(&network(Precision::FP32), &ConfigMap::new())
        .unwrap_err();
    match err {
        DispatchError::NoDeviceAccepted { tried, .. } => {
            assert!(tried.contains("CPU"));
            assert!(tried.contains("GPU.0"));
        }
        other => panic!("expected NoDeviceAccepted, got {other}"),
    }
}

// ── Misuse and configuration errors ────────────────────────────

#[test]
fn test_compile_without_registry_is_misuse() {
    let dispatcher = AutoDispatcher::new();
    assert!(matches!(
        dispatcher.compile(&network(Precision::FP32), &ConfigMap::new()),
        Err(DispatchError::NoRegistry)
    ));
}

#[test]
fn test_non_graph_network_rejected() {
    let dispatcher = dispatcher_over(three_device_registry());
    let empty = Network::new("no-inputs", vec![], vec![]);
    assert!(matches!(
        dispatcher.compile(&empty, &ConfigMap::new()),
        Err(DispatchError::UnsupportedNetwork(_))
    ));
}

#[test]
fn test_unknown_schedule_type_rejected() {
    let dispatcher = dispatcher_over(three_device_registry());
    let mut config = ConfigMap::new();
    config.insert(keys::config::SCHEDULE_TYPE.into(), "THROUGH_PUT".into());
    assert!(matches!(
        dispatcher.compile(&network(Precision::FP32), &config),
        Err(DispatchError::Selection(_))
    ));
}

#[test]
fn test_unknown_candidate_class_rejected() {
    let dispatcher = dispatcher_over(three_device_registry());
    let mut config = ConfigMap::new();
    config.insert(keys::config::DEVICE_PRIORITIES.into(), "FPGA,CPU".into());
    assert!(matches!(
        dispatcher.compile(&network(Precision::FP32), &config),
        Err(DispatchError::Selection(_))
    ));
}

// ── Device priorities and descriptors ──────────────────────────

#[test]
fn test_device_priorities_override_enumeration() {
    let dispatcher = dispatcher_over(three_device_registry());
    let mut config = ConfigMap::new();
    // Restrict to the integrated GPU even though GPU.1 exists.
    config.insert(keys::config::DEVICE_PRIORITIES.into(), "GPU.0".into());
    let sched = dispatcher
        .compile(&network(Precision::FP16), &config)
        .unwrap();
    assert_eq!(sched.device().device_name, "GPU.0");
}

#[test]
fn test_device_choice_alias_accepted() {
    let dispatcher = dispatcher_over(three_device_registry());
    let mut config = ConfigMap::new();
    config.insert(keys::config::DEVICE_CHOICE.into(), "CPU".into());
    let sched = dispatcher
        .compile(&network(Precision::FP32), &config)
        .unwrap();
    assert_eq!(sched.device().device_name, "CPU");
}

#[test]
fn test_request_count_hint_sizes_pool() {
    let dispatcher = dispatcher_over(three_device_registry());
    let mut config = ConfigMap::new();
    config.insert(keys::config::DEVICE_PRIORITIES.into(), "CPU(2)".into());
    let sched = dispatcher
        .compile(&network(Precision::FP32), &config)
        .unwrap();
    assert_eq!(sched.slot_count(), 2);
}

#[test]
fn test_instance_suffix_becomes_device_id() {
    let dispatcher = dispatcher_over(three_device_registry());
    let sched = dispatcher
        .compile(&network(Precision::FP16), &ConfigMap::new())
        .unwrap();
    assert_eq!(sched.device().device_name, "GPU.1");
    assert_eq!(
        sched.device().config.get(keys::config::DEVICE_ID).map(String::as_str),
        Some("1")
    );
}

// ── Layer queries ──────────────────────────────────────────────

#[test]
fn test_query_layers_intersects_device_answers() {
    let registry = Arc::new(
        SimRegistry::new()
            .with_device("CPU", SimDevice::new("CPU", &["FP32"]))
            .with_device(
                "GPU.0",
                SimDevice::new("GPU", &["FP16"]).without_layer("fc1"),
            ),
    );
    let layers = dispatcher_over(registry)
        .query_layers(&network(Precision::FP32), &ConfigMap::new())
        .unwrap();
    assert_eq!(layers.len(), 2);
    assert!(layers.contains_key("conv1"));
    assert!(!layers.contains_key("fc1"));
    assert!(layers.values().all(|tag| tag == DISPATCHER_NAME));
}

#[test]
fn test_query_layers_ignores_failing_device() {
    let registry = Arc::new(
        SimRegistry::new()
            .with_device("CPU", SimDevice::new("CPU", &["FP32"]))
            .with_device("GPU.0", SimDevice::new("GPU", &["FP16"]).failing_query()),
    );
    let layers = dispatcher_over(registry)
        .query_layers(&network(Precision::FP32), &ConfigMap::new())
        .unwrap();
    assert_eq!(layers.len(), 3);
}

#[test]
fn test_query_layers_ignores_empty_set_after_nonempty() {
    let registry = Arc::new(
        SimRegistry::new()
            .with_device("CPU", SimDevice::new("CPU", &["FP32"]))
            .with_device(
                "GPU.0",
                SimDevice::new("GPU", &["FP16"])
                    .without_layer("conv1")
                    .without_layer("relu1")
                    .without_layer("fc1"),
            ),
    );
    let layers = dispatcher_over(registry)
        .query_layers(&network(Precision::FP32), &ConfigMap::new())
        .unwrap();
    // The GPU's empty answer does not wipe out the CPU's.
    assert_eq!(layers.len(), 3);
}

#[test]
fn test_query_layers_with_no_participants_fails() {
    let registry = Arc::new(SimRegistry::new().with_device(
        "CPU",
        SimDevice::new("CPU", &["FP32"]).failing_query(),
    ));
    assert!(matches!(
        dispatcher_over(registry).query_layers(&network(Precision::FP32), &ConfigMap::new()),
        Err(DispatchError::QueryFailed)
    ));
}

// ── Config store and metrics ───────────────────────────────────

#[test]
fn test_config_roundtrip() {
    let dispatcher = dispatcher_over(three_device_registry());
    let mut config = ConfigMap::new();
    config.insert(keys::config::PERF_COUNT.into(), keys::config::YES.into());
    config.insert(keys::config::SCHEDULE_TYPE.into(), "STATIC".into());
    dispatcher.set_config(config.clone());

    for (key, value) in &config {
        assert_eq!(&dispatcher.get_config(key).unwrap(), value);
    }
    assert!(matches!(
        dispatcher.get_config("NOT_A_KEY"),
        Err(DispatchError::UnknownConfigKey(_))
    ));
}

#[test]
fn test_dispatcher_metrics() {
    let dispatcher = dispatcher_over(three_device_registry());

    assert_eq!(
        dispatcher
            .get_metric(keys::metrics::FULL_DEVICE_NAME)
            .unwrap()
            .as_str(),
        Some(DISPATCHER_NAME)
    );

    let devices = dispatcher
        .get_metric(keys::metrics::AVAILABLE_DEVICES)
        .unwrap();
    assert_eq!(
        devices.as_strings().unwrap().to_vec(),
        vec!["CPU".to_string(), "GPU.0".into(), "GPU.1".into()]
    );

    let caps = dispatcher
        .get_metric(keys::metrics::OPTIMIZATION_CAPABILITIES)
        .unwrap();
    let caps = caps.as_strings().unwrap();
    assert!(caps.contains(&"FP16".to_string()));
    assert!(caps.contains(&"INT8".to_string()));

    let config_keys = dispatcher
        .get_metric(keys::metrics::SUPPORTED_CONFIG_KEYS)
        .unwrap();
    assert!(config_keys
        .as_strings()
        .unwrap()
        .contains(&keys::config::DEVICE_PRIORITIES.to_string()));

    assert!(matches!(
        dispatcher.get_metric("BOGUS"),
        Err(DispatchError::UnknownMetricKey(_))
    ));
}

// ── End-to-end inference ───────────────────────────────────────

#[test]
fn test_compile_and_infer_end_to_end() {
    let dispatcher = dispatcher_over(three_device_registry());
    let sched = dispatcher
        .compile(&network(Precision::U8), &ConfigMap::new())
        .unwrap();

    let request = sched.create_request();
    request.get_blob("in").unwrap().write(&[2u8; 4]);
    request.infer().unwrap();
    assert_eq!(*request.get_blob("out").unwrap().data(), vec![8u8; 4]);
}

#[test]
fn test_perf_counters_inherited_from_config() {
    let dispatcher = dispatcher_over(three_device_registry());
    let config = AutoConfig {
        device_priorities: Some("CPU".into()),
        schedule_type: "STATIC".into(),
        perf_count: true,
    };
    let sched = dispatcher
        .compile(&network(Precision::FP32), &config.to_config_map())
        .unwrap();

    let request = sched.create_request();
    request.infer().unwrap();
    assert!(!request.performance_counts().unwrap().is_empty());
}

#[test]
fn test_perf_counters_absent_when_backend_ignores() {
    let registry = Arc::new(SimRegistry::new().with_device(
        "CPU",
        SimDevice::new("CPU", &["FP32"]).ignoring_perf_count(),
    ));
    let dispatcher = dispatcher_over(registry);
    let mut config = ConfigMap::new();
    config.insert(keys::config::PERF_COUNT.into(), keys::config::YES.into());

    let sched = dispatcher
        .compile(&network(Precision::FP32), &config)
        .unwrap();
    let request = sched.create_request();
    request.infer().unwrap();
    assert!(request.performance_counts().unwrap().is_empty());
}
