// Copyright 2026 the Sapwood Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Web backend for sapwood.
//!
//! This crate provides integration with browser APIs:
//!
//! - [`DomHost`]: a [`HostAdapter`] over the DOM
//! - [`IdleLoop`]: `requestIdleCallback` slice driver
//! - [`IdleBudget`]: a [`SliceBudget`](sapwood_core::budget::SliceBudget)
//!   backed by an `IdleDeadline`

#![no_std]

extern crate alloc;

mod dom;
mod idle;

pub use dom::{DomError, DomHost};
pub use idle::{IdleBudget, IdleLoop};
pub use sapwood_core::backend::HostAdapter;

use sapwood_core::time::HostTime;

/// Returns the current host time from `performance.now()`.
#[must_use]
pub fn now() -> HostTime {
    HostTime::from_millis_f64(idle::performance_now())
}
