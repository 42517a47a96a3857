// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Per-class precision capability advertisements.
//!
//! Each backend is queried once for its `OPTIMIZATION_CAPABILITIES` and
//! the answer is rendered as `"<class>: <tok> <tok> ..."`, e.g.
//! `"GPU: FP16 FP32"`. Matching a network precision against an
//! advertisement is substring containment of the normalized token.

use crate::DeviceClass;

/// One backend class's advertised precision support.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct CapabilityAdvertisement {
    rendered: String,
}

impl CapabilityAdvertisement {
    /// Builds the advertisement for `class` from its precision tokens.
    pub fn new(class: DeviceClass, tokens: &[String]) -> Self {
        Self {
            rendered: format!("{}: {}", class.as_str(), tokens.join(" ")),
        }
    }

    /// Parses an advertisement back from its rendered form. Used by
    /// callers that persist or hand-write capability strings.
    pub fn from_rendered(rendered: impl Into<String>) -> Self {
        Self {
            rendered: rendered.into(),
        }
    }

    /// Whether this advertisement belongs to `class`.
    pub fn is_for_class(&self, class: DeviceClass) -> bool {
        self.rendered
            .split(':')
            .next()
            .is_some_and(|label| label.trim() == class.as_str())
    }

    /// Whether the advertisement names `precision_token` (substring
    /// containment over the rendered token list).
    pub fn supports(&self, precision_token: &str) -> bool {
        match self.rendered.split_once(':') {
            Some((_, tokens)) => tokens.contains(precision_token),
            None => false,
        }
    }

    /// The rendered `"<class>: <tok> ..."` form.
    pub fn rendered(&self) -> &str {
        &self.rendered
    }
}

impl std::fmt::Display for CapabilityAdvertisement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.rendered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render() {
        let adv =
            CapabilityAdvertisement::new(DeviceClass::Gpu, &["FP16".into(), "FP32".into()]);
        assert_eq!(adv.rendered(), "GPU: FP16 FP32");
    }

    #[test]
    fn test_class_match() {
        let adv = CapabilityAdvertisement::from_rendered("CPU: FP32 INT8");
        assert!(adv.is_for_class(DeviceClass::Cpu));
        assert!(!adv.is_for_class(DeviceClass::Gpu));
    }

    #[test]
    fn test_supports_is_substring_containment() {
        let adv = CapabilityAdvertisement::from_rendered("GPU: FP16 FP32");
        assert!(adv.supports("FP16"));
        assert!(adv.supports("FP32"));
        assert!(!adv.supports("INT8"));
        // Substring semantics: "FP" matches because "FP16" contains it.
        assert!(adv.supports("FP"));
    }

    #[test]
    fn test_class_label_not_matched_as_precision() {
        let adv = CapabilityAdvertisement::from_rendered("CPU: FP32");
        assert!(!adv.supports("CPU"));
    }
}
