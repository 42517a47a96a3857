// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Candidate device descriptors and the device-list grammar.
//!
//! A device name identifies a class and an optional instance:
//! `CPU`, `GPU.0`, `GPU.1`, `VPUX`. Within the GPU class, `GPU.0` is the
//! integrated adapter and higher instance numbers are discrete adapters,
//! so a descending name sort prefers discrete silicon.
//!
//! Device lists arrive as configuration strings with the grammar
//!
//! ```text
//! list  := entry ("," entry)*
//! entry := name ( "(" positive-int ")" )?
//! ```
//!
//! where the parenthesized integer is a per-device inference-request
//! count hint. A missing count means `-1` (let the device decide).

use crate::SelectError;
use backend_api::ConfigMap;

/// Request-count hint meaning "use the device's optimal number".
pub const AUTO_REQUEST_COUNT: i32 = -1;

/// The device classes the dispatcher can rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
pub enum DeviceClass {
    /// Neural accelerator.
    Vpux,
    /// Integrated or discrete graphics adapter.
    Gpu,
    /// Low-power neural coprocessor.
    Gna,
    /// Vision processing unit.
    Myriad,
    /// General-purpose processor, the always-available fallback.
    Cpu,
}

impl DeviceClass {
    /// Class preference order used by the static selection policy.
    pub const PREFERENCE_ORDER: [DeviceClass; 5] = [
        DeviceClass::Vpux,
        DeviceClass::Gpu,
        DeviceClass::Gna,
        DeviceClass::Myriad,
        DeviceClass::Cpu,
    ];

    /// Derives the class from a device name prefix. Returns `None` for
    /// names outside the known classes.
    pub fn from_device_name(name: &str) -> Option<Self> {
        // Longer prefixes first: "GNA" must not shadow a future "GN" etc.
        const PREFIXES: [(&str, DeviceClass); 5] = [
            ("VPUX", DeviceClass::Vpux),
            ("MYRIAD", DeviceClass::Myriad),
            ("GPU", DeviceClass::Gpu),
            ("GNA", DeviceClass::Gna),
            ("CPU", DeviceClass::Cpu),
        ];
        PREFIXES
            .iter()
            .find(|(prefix, _)| name.starts_with(prefix))
            .map(|&(_, class)| class)
    }

    /// The capability-advertisement label for this class.
    pub fn as_str(self) -> &'static str {
        match self {
            DeviceClass::Vpux => "VPUX",
            DeviceClass::Gpu => "GPU",
            DeviceClass::Gna => "GNA",
            DeviceClass::Myriad => "MYRIAD",
            DeviceClass::Cpu => "CPU",
        }
    }
}

impl std::fmt::Display for DeviceClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One candidate device: its name, the configuration the backend will
/// accept, and the caller's request-count hint.
///
/// Immutable once constructed. Equality considers only the name, so a
/// candidate list behaves as a set of devices regardless of config.
#[derive(Debug, Clone, serde::Serialize)]
pub struct DeviceDescriptor {
    /// Class-and-instance name, e.g. `GPU.1`.
    pub device_name: String,
    /// Configuration already filtered to keys the backend accepts.
    pub config: ConfigMap,
    /// Requested in-flight request count; [`AUTO_REQUEST_COUNT`] = auto.
    pub requested_request_count: i32,
}

impl DeviceDescriptor {
    /// Creates a descriptor with an automatic request count.
    pub fn new(device_name: impl Into<String>, config: ConfigMap) -> Self {
        Self {
            device_name: device_name.into(),
            config,
            requested_request_count: AUTO_REQUEST_COUNT,
        }
    }

    /// Creates a descriptor with an explicit request-count hint.
    pub fn with_request_count(
        device_name: impl Into<String>,
        config: ConfigMap,
        requested_request_count: i32,
    ) -> Self {
        Self {
            device_name: device_name.into(),
            config,
            requested_request_count,
        }
    }

    /// The class portion of the name, without any instance suffix.
    /// `"GPU.1"` yields `"GPU"`.
    pub fn base_name(&self) -> &str {
        self.device_name
            .split_once('.')
            .map_or(self.device_name.as_str(), |(base, _)| base)
    }

    /// The instance id portion of the name, if present.
    /// `"GPU.1"` yields `Some("1")`.
    pub fn instance_id(&self) -> Option<&str> {
        self.device_name.split_once('.').map(|(_, id)| id)
    }

    /// The device class, when the name starts with a known prefix.
    pub fn class(&self) -> Option<DeviceClass> {
        DeviceClass::from_device_name(&self.device_name)
    }
}

impl PartialEq for DeviceDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.device_name == other.device_name
    }
}

impl Eq for DeviceDescriptor {}

impl std::fmt::Display for DeviceDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.device_name)
    }
}

/// Parses a device-list string into `(name, request_count)` pairs.
///
/// ```
/// use device_select::parse_device_list;
///
/// let entries = parse_device_list("GPU.1(4),CPU").unwrap();
/// assert_eq!(entries, vec![("GPU.1".to_string(), 4), ("CPU".to_string(), -1)]);
/// ```
pub fn parse_device_list(list: &str) -> Result<Vec<(String, i32)>, SelectError> {
    list.split(',').map(|raw| parse_entry(raw.trim())).collect()
}

fn parse_entry(entry: &str) -> Result<(String, i32), SelectError> {
    if entry.is_empty() {
        return Err(SelectError::InvalidDeviceList {
            entry: entry.into(),
            detail: "empty device name".into(),
        });
    }
    let Some((name, rest)) = entry.split_once('(') else {
        return Ok((entry.to_string(), AUTO_REQUEST_COUNT));
    };
    let Some(count) = rest.strip_suffix(')') else {
        return Err(SelectError::InvalidDeviceList {
            entry: entry.into(),
            detail: "unterminated request count".into(),
        });
    };
    let count: i32 = count.parse().map_err(|_| SelectError::InvalidDeviceList {
        entry: entry.into(),
        detail: format!("request count '{count}' is not an integer"),
    })?;
    if count <= 0 {
        return Err(SelectError::InvalidDeviceList {
            entry: entry.into(),
            detail: format!("request count must be positive, got {count}"),
        });
    }
    if name.is_empty() {
        return Err(SelectError::InvalidDeviceList {
            entry: entry.into(),
            detail: "empty device name".into(),
        });
    }
    Ok((name.to_string(), count))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_from_name() {
        assert_eq!(DeviceClass::from_device_name("CPU"), Some(DeviceClass::Cpu));
        assert_eq!(DeviceClass::from_device_name("GPU.1"), Some(DeviceClass::Gpu));
        assert_eq!(DeviceClass::from_device_name("VPUX"), Some(DeviceClass::Vpux));
        assert_eq!(DeviceClass::from_device_name("GNA"), Some(DeviceClass::Gna));
        assert_eq!(
            DeviceClass::from_device_name("MYRIAD.2"),
            Some(DeviceClass::Myriad)
        );
        assert_eq!(DeviceClass::from_device_name("FPGA"), None);
    }

    #[test]
    fn test_descriptor_name_parts() {
        let d = DeviceDescriptor::new("GPU.1", ConfigMap::new());
        assert_eq!(d.base_name(), "GPU");
        assert_eq!(d.instance_id(), Some("1"));
        assert_eq!(d.class(), Some(DeviceClass::Gpu));

        let d = DeviceDescriptor::new("CPU", ConfigMap::new());
        assert_eq!(d.base_name(), "CPU");
        assert_eq!(d.instance_id(), None);
    }

    #[test]
    fn test_equality_is_name_only() {
        let mut config = ConfigMap::new();
        config.insert("PERF_COUNT".into(), "YES".into());
        let a = DeviceDescriptor::new("CPU", config);
        let b = DeviceDescriptor::with_request_count("CPU", ConfigMap::new(), 8);
        assert_eq!(a, b);
    }

    #[test]
    fn test_parse_plain_list() {
        let entries = parse_device_list("CPU,GPU.0,GPU.1").unwrap();
        assert_eq!(entries.len(), 3);
        assert!(entries.iter().all(|(_, n)| *n == AUTO_REQUEST_COUNT));
    }

    #[test]
    fn test_parse_with_counts() {
        let entries = parse_device_list("VPUX(2), CPU(16)").unwrap();
        assert_eq!(entries[0], ("VPUX".to_string(), 2));
        assert_eq!(entries[1], ("CPU".to_string(), 16));
    }

    #[test]
    fn test_parse_rejects_zero_count() {
        assert!(matches!(
            parse_device_list("CPU(0)"),
            Err(SelectError::InvalidDeviceList { .. })
        ));
    }

    #[test]
    fn test_parse_rejects_negative_count() {
        assert!(parse_device_list("CPU(-3)").is_err());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_device_list("CPU(").is_err());
        assert!(parse_device_list("CPU(x)").is_err());
        assert!(parse_device_list("(4)").is_err());
        assert!(parse_device_list("CPU,,GPU").is_err());
    }
}
