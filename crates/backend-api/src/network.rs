// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The device-agnostic view of a network handed to the dispatcher.
//!
//! Network parsing lives outside the core; by the time a [`Network`]
//! reaches the dispatcher it is already a graph with named, typed input
//! and output tensors. The dispatcher only ever inspects the tensor
//! descriptors (selection needs the first input's precision, request
//! creation needs names and sizes) and passes the network through to the
//! chosen backend's compile step.

use crate::Precision;

/// Shape, name, and element type of one network input or output.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct TensorDesc {
    /// Tensor name, unique within the network's inputs or outputs.
    pub name: String,
    /// Element precision.
    pub precision: Precision,
    /// Dimensions, outermost first.
    pub dims: Vec<usize>,
}

impl TensorDesc {
    /// Creates a descriptor.
    pub fn new(name: impl Into<String>, precision: Precision, dims: Vec<usize>) -> Self {
        Self {
            name: name.into(),
            precision,
            dims,
        }
    }

    /// Total number of elements.
    pub fn num_elements(&self) -> usize {
        self.dims.iter().product()
    }

    /// Buffer size in bytes for this tensor.
    pub fn size_bytes(&self) -> usize {
        self.num_elements() * self.precision.size_bytes()
    }
}

/// A compiled-graph network as seen by the dispatcher.
#[derive(Debug, Clone)]
pub struct Network {
    /// Human-readable network name.
    pub name: String,
    /// Ordered input tensor descriptors. The first one determines the
    /// network precision used by device selection.
    pub inputs: Vec<TensorDesc>,
    /// Ordered output tensor descriptors.
    pub outputs: Vec<TensorDesc>,
    /// Names of the network's operations, in topological order. Backends
    /// report per-layer support against these names.
    pub layers: Vec<String>,
}

impl Network {
    /// Creates a network from its I/O descriptors.
    pub fn new(name: impl Into<String>, inputs: Vec<TensorDesc>, outputs: Vec<TensorDesc>) -> Self {
        Self {
            name: name.into(),
            inputs,
            outputs,
            layers: Vec::new(),
        }
    }

    /// Attaches the operation names of the network's graph.
    pub fn with_layers(mut self, layers: Vec<String>) -> Self {
        self.layers = layers;
        self
    }

    /// Returns the declared precision of the first input tensor, if any.
    pub fn first_input_precision(&self) -> Option<Precision> {
        self.inputs.first().map(|t| t.precision)
    }

    /// A network is in the expected graph form when it exposes at least
    /// one typed input tensor. Anything else cannot be selected for or
    /// compiled and is rejected by the dispatcher as caller misuse.
    pub fn is_graph(&self) -> bool {
        !self.inputs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tensor_sizes() {
        let t = TensorDesc::new("data", Precision::FP32, vec![1, 3, 8, 8]);
        assert_eq!(t.num_elements(), 192);
        assert_eq!(t.size_bytes(), 768);
    }

    #[test]
    fn test_first_input_precision() {
        let net = Network::new(
            "n",
            vec![
                TensorDesc::new("a", Precision::FP16, vec![1, 4]),
                TensorDesc::new("b", Precision::FP32, vec![1, 4]),
            ],
            vec![],
        );
        assert_eq!(net.first_input_precision(), Some(Precision::FP16));
        assert!(net.is_graph());
    }

    #[test]
    fn test_inputless_network_is_not_graph() {
        let net = Network::new("n", vec![], vec![]);
        assert_eq!(net.first_input_precision(), None);
        assert!(!net.is_graph());
    }
}
