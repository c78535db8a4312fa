// Copyright 2026 the Sapwood Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Fiber tree, positional reconciler, and cooperative scheduler.
//!
//! `sapwood_core` turns declarative [`Element`](element::Element) trees into
//! the minimal set of mutations against a previously rendered *host tree*
//! (DOM, terminal buffer, native widgets), and applies those mutations in one
//! atomic pass. It is `no_std` compatible (with `alloc`) and keeps fibers in
//! generation-tagged struct-of-arrays arenas with index handles.
//!
//! # Architecture
//!
//! ```text
//!   Scheduler::render() / ComponentHandle::set_state()
//!       │
//!       ▼
//!   UpdateQueue ──► Scheduler::run_slice(budget) ──► begin / complete walk
//!                                                        │
//!                 ┌──────────────────────────────────────┘
//!                 ▼
//!   work FiberArena (effects) ──► commit ──► HostAdapter
//!                                               │
//!                 ┌─────────────────────────────┘
//!                 ▼
//!   work arena becomes the root's current tree
//! ```
//!
//! **[`element`]**: Immutable element descriptions and the
//! [`create_element`](element::create_element) factory.
//!
//! **[`component`]**: The [`Component`](component::Component) trait,
//! component identity, and the [`ComponentHandle`](component::ComponentHandle)
//! used to request state updates.
//!
//! **[`backend`]**: The [`HostAdapter`](backend::HostAdapter) trait that host
//! backends implement to materialize effects.
//!
//! **[`update`]**: The FIFO [`UpdateQueue`](update::UpdateQueue).
//!
//! **[`fiber`]**: Generation-tagged fiber arenas. A work cycle builds a new
//! arena whose fibers point back at the previous one through `alternate`
//! handles; the previous arena is retired wholesale at commit.
//!
//! **[`scheduler`]**: The owned [`Scheduler`](scheduler::Scheduler) context,
//! driven by explicit [`run_slice`](scheduler::Scheduler::run_slice) calls
//! that are interruptible between fiber units.
//!
//! **[`budget`]**: Slice budgets deciding when a slice yields.
//!
//! **[`trace`]**: [`TraceSink`](trace::TraceSink) trait and event types for
//! scheduler instrumentation, with zero-overhead [`Tracer`](trace::Tracer)
//! wrapper.
//!
//! # Crate features
//!
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one branch
//!   per call site).
//! - `trace-rich` (disabled by default, implies `trace`): Gates per-unit and
//!   per-effect events.

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod backend;
pub mod budget;
pub mod component;
pub mod element;
pub mod error;
pub mod fiber;
pub mod scheduler;
pub mod time;
pub mod trace;
pub mod update;

mod commit;
mod reconcile;

pub use commit::CommitStats;
