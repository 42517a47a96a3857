// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # device-select
//!
//! Chooses one device from a candidate list for a given network.
//!
//! The crate owns the candidate data model ([`DeviceDescriptor`],
//! [`DeviceClass`], the `NAME(n)` device-list grammar) and the ranking
//! policies behind the [`SelectionPolicy`] trait.
//!
//! # Policy
//!
//! | Policy | Ranking |
//! |---|---|
//! | [`StaticPolicy`] | class priority (VPUX, GPU, GNA, MYRIAD, CPU), then network precision affinity, then CPU fallback |
//!
//! New policies implement [`SelectionPolicy`] and plug in through
//! [`ScheduleType`] without touching the dispatcher.
//!
//! # Example
//! ```
//! use backend_api::{ConfigMap, Network, Precision, TensorDesc};
//! use device_select::{
//!     CapabilityAdvertisement, DeviceClass, DeviceDescriptor, ScheduleType,
//!     SelectionPolicy,
//! };
//!
//! let network = Network::new(
//!     "resnet",
//!     vec![TensorDesc::new("data", Precision::FP16, vec![1, 3, 224, 224])],
//!     vec![],
//! );
//! let candidates = vec![
//!     DeviceDescriptor::new("CPU", ConfigMap::new()),
//!     DeviceDescriptor::new("GPU.1", ConfigMap::new()),
//! ];
//! let caps = vec![
//!     CapabilityAdvertisement::new(DeviceClass::Cpu, &["FP32".into()]),
//!     CapabilityAdvertisement::new(DeviceClass::Gpu, &["FP16".into(), "FP32".into()]),
//! ];
//!
//! let policy = ScheduleType::Static.create_policy();
//! let chosen = policy.select(&network, &candidates, &caps).unwrap();
//! assert_eq!(chosen.device_name, "GPU.1");
//! ```

mod capability;
mod descriptor;
mod error;
pub mod policy;

pub use capability::CapabilityAdvertisement;
pub use descriptor::{
    parse_device_list, DeviceClass, DeviceDescriptor, AUTO_REQUEST_COUNT,
};
pub use error::SelectError;
pub use policy::static_policy::StaticPolicy;
pub use policy::{ScheduleType, SelectionPolicy};
