// Copyright 2026 the Sapwood Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! In-memory backend for sapwood.
//!
//! This crate provides a headless host for tests, tools, and servers:
//!
//! - [`MemoryHost`]: a [`HostAdapter`] over an in-memory node table that
//!   records every visible mutation in a log.
//! - [`IdleDriver`]: runs scheduler slices against a `std::time::Instant`
//!   clock.

mod driver;
mod host;

pub use driver::IdleDriver;
pub use host::{MemoryHost, MemoryHostError, Mutation, NodeId};
pub use sapwood_core::backend::HostAdapter;
