// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # worker-pool
//!
//! The scheduler's ready structure: a bounded queue of free worker slots,
//! an unbounded FIFO of tasks waiting for a slot, the slots themselves,
//! and the RAII guard that returns a slot to the idle queue on every
//! exit path.
//!
//! A [`WorkerSlot`] is a reusable execution token: one pre-created
//! device-side inference request plus the continuation to run when the
//! device reports completion. At any instant a slot is either *idle*
//! (its index sits in the [`BoundedQueue`], no pending task) or *busy*
//! (index absent from the queue, `pending_task` armed).
//!
//! All types here are internally synchronized; none of them spawns or
//! owns a thread.

mod guard;
mod queue;
mod slot;

pub use guard::IdleGuard;
pub use queue::{BoundedQueue, TaskQueue};
pub use slot::{SlotTask, WorkerSlot};

/// Index of a worker slot within its scheduler's slot sequence.
pub type SlotIndex = usize;
