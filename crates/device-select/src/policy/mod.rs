// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The [`SelectionPolicy`] trait and policy implementations.

pub mod static_policy;

use crate::{CapabilityAdvertisement, DeviceDescriptor, SelectError};
use backend_api::Network;

/// Trait for device selection policies.
///
/// A policy ranks the candidate descriptors for one network and returns
/// the winner. Policies are purely algorithmic, with no backend calls,
/// which keeps them trivially unit-testable.
pub trait SelectionPolicy: Send + Sync {
    /// Human-readable name of this policy.
    fn name(&self) -> &str;

    /// Chooses one device from `candidates` for `network`, consulting the
    /// precomputed capability advertisements.
    fn select(
        &self,
        network: &Network,
        candidates: &[DeviceDescriptor],
        capabilities: &[CapabilityAdvertisement],
    ) -> Result<DeviceDescriptor, SelectError>;
}

/// The schedule types a caller can request through `SCHEDULE_TYPE`.
///
/// `STATIC` is the only implemented type; requesting anything else is
/// rejected at parse time rather than carried as a dead variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleType {
    /// Rank by fixed class priority and network precision.
    Static,
}

impl ScheduleType {
    /// Parses a `SCHEDULE_TYPE` config value.
    pub fn parse(value: &str) -> Result<Self, SelectError> {
        match value {
            "STATIC" => Ok(ScheduleType::Static),
            other => Err(SelectError::PolicyNotImplemented(other.to_string())),
        }
    }

    /// Instantiates the policy for this schedule type.
    pub fn create_policy(self) -> Box<dyn SelectionPolicy> {
        match self {
            ScheduleType::Static => Box::new(static_policy::StaticPolicy::new()),
        }
    }
}

impl std::fmt::Display for ScheduleType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScheduleType::Static => f.write_str("STATIC"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_static() {
        assert_eq!(ScheduleType::parse("STATIC").unwrap(), ScheduleType::Static);
    }

    #[test]
    fn test_parse_rejects_unimplemented() {
        for bogus in ["THROUGH_PUT", "LATENCY", "static", ""] {
            assert!(matches!(
                ScheduleType::parse(bogus),
                Err(SelectError::PolicyNotImplemented(_))
            ));
        }
    }

    #[test]
    fn test_create_policy_name() {
        let policy = ScheduleType::Static.create_policy();
        assert_eq!(policy.name(), "STATIC");
    }
}
