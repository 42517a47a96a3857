// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Shared tensor buffers exchanged between requests and devices.
//!
//! A [`Blob`] is a cheap-clone handle (`Arc` inside) over one tensor's
//! backing storage. Handle identity is what the pipeline uses to skip
//! redundant transfers: two clones of the same blob compare equal under
//! [`Blob::same_buffer`], a byte-identical copy does not.
//!
//! A blob may be tagged as *remote*: its storage lives on a named device.
//! The request pipeline inspects the tag to steer scheduling toward that
//! device before any slot is bound.

use crate::TensorDesc;
use std::sync::{Arc, Mutex, MutexGuard};

struct BlobInner {
    desc: TensorDesc,
    data: Mutex<Vec<u8>>,
    remote_device: Option<String>,
}

/// A reference-counted tensor buffer.
#[derive(Clone)]
pub struct Blob {
    inner: Arc<BlobInner>,
}

impl Blob {
    /// Allocates a zero-filled host blob for the given descriptor.
    pub fn allocate(desc: TensorDesc) -> Self {
        let size = desc.size_bytes();
        Self {
            inner: Arc::new(BlobInner {
                desc,
                data: Mutex::new(vec![0u8; size]),
                remote_device: None,
            }),
        }
    }

    /// Allocates a blob whose storage is owned by the named device.
    pub fn allocate_remote(desc: TensorDesc, device_name: impl Into<String>) -> Self {
        let size = desc.size_bytes();
        Self {
            inner: Arc::new(BlobInner {
                desc,
                data: Mutex::new(vec![0u8; size]),
                remote_device: Some(device_name.into()),
            }),
        }
    }

    /// The tensor descriptor this blob was allocated for.
    pub fn desc(&self) -> &TensorDesc {
        &self.inner.desc
    }

    /// The owning device name, if this blob is remote.
    pub fn remote_device(&self) -> Option<&str> {
        self.inner.remote_device.as_deref()
    }

    /// Locks and returns the backing bytes.
    pub fn data(&self) -> MutexGuard<'_, Vec<u8>> {
        self.inner.data.lock().expect("blob lock poisoned")
    }

    /// Overwrites the backing bytes. The length must match the allocation.
    pub fn write(&self, bytes: &[u8]) {
        let mut data = self.data();
        assert_eq!(bytes.len(), data.len(), "blob size mismatch");
        data.copy_from_slice(bytes);
    }

    /// Returns `true` when both handles share the same backing storage.
    pub fn same_buffer(a: &Blob, b: &Blob) -> bool {
        Arc::ptr_eq(&a.inner, &b.inner)
    }
}

impl std::fmt::Debug for Blob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Blob")
            .field("name", &self.inner.desc.name)
            .field("size_bytes", &self.inner.desc.size_bytes())
            .field("remote_device", &self.inner.remote_device)
            .finish()
    }
}
