// Copyright 2026 the Sapwood Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Wall-clock slice driver.

use std::time::Instant;

use sapwood_core::backend::HostAdapter;
use sapwood_core::budget::DeadlineBudget;
use sapwood_core::error::ReconcileError;
use sapwood_core::scheduler::{Scheduler, SliceResult};
use sapwood_core::time::HostTime;
use sapwood_core::trace::Tracer;

/// Runs scheduler slices with deadlines measured from a monotonic clock.
///
/// Each slice gets the scheduler's configured
/// [`slice_length`](sapwood_core::scheduler::SchedulerConfig::slice_length),
/// starting from the moment the slice is requested.
#[derive(Clone, Copy, Debug)]
pub struct IdleDriver {
    origin: Instant,
}

impl Default for IdleDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl IdleDriver {
    /// Creates a driver whose clock starts now.
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }

    /// Returns the time elapsed since the driver was created.
    #[must_use]
    pub fn now(&self) -> HostTime {
        elapsed(self.origin)
    }

    /// Runs one slice.
    ///
    /// # Errors
    ///
    /// Propagates the scheduler's error for the update that failed.
    pub fn run_slice<A: HostAdapter>(
        &self,
        scheduler: &mut Scheduler<A::Node>,
        host: &mut A,
    ) -> Result<SliceResult, ReconcileError<A::Error>> {
        self.run_slice_traced(scheduler, host, &mut Tracer::none())
    }

    /// Runs one slice, reporting to `tracer`.
    ///
    /// # Errors
    ///
    /// Propagates the scheduler's error for the update that failed.
    pub fn run_slice_traced<A: HostAdapter>(
        &self,
        scheduler: &mut Scheduler<A::Node>,
        host: &mut A,
        tracer: &mut Tracer<'_>,
    ) -> Result<SliceResult, ReconcileError<A::Error>> {
        let origin = self.origin;
        let length = scheduler.config().slice_length;
        let budget = DeadlineBudget::starting_now(move || elapsed(origin), length);
        scheduler.run_slice_traced(host, budget, tracer)
    }

    /// Runs slices until the scheduler is idle and returns how many ran.
    ///
    /// # Errors
    ///
    /// Stops at the first failed update.
    pub fn run_until_idle<A: HostAdapter>(
        &self,
        scheduler: &mut Scheduler<A::Node>,
        host: &mut A,
    ) -> Result<usize, ReconcileError<A::Error>> {
        let mut slices = 0;
        loop {
            slices += 1;
            if self.run_slice(scheduler, host)? == SliceResult::Idle {
                return Ok(slices);
            }
        }
    }
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "u64 microseconds cover half a million years"
)]
fn elapsed(origin: Instant) -> HostTime {
    HostTime::from_micros(origin.elapsed().as_micros() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryHost;
    use sapwood_core::element::Element;

    #[test]
    fn clock_is_monotonic() {
        let driver = IdleDriver::new();
        let a = driver.now();
        let b = driver.now();
        assert!(b >= a);
    }

    #[test]
    fn drains_queued_renders() {
        let driver = IdleDriver::new();
        let mut host = MemoryHost::new();
        let container = host.create_container("root");
        let mut scheduler = Scheduler::default();
        let root = scheduler.create_root(container);
        scheduler.render(root, [Element::text("a")]);
        scheduler.render(root, [Element::text("b")]);

        // Interactive config commits at most once per slice.
        let slices = driver.run_until_idle(&mut scheduler, &mut host).unwrap();
        assert!(slices >= 2);
        assert_eq!(host.inner_html(container), "b");
    }
}
