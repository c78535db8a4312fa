// Copyright 2026 the Sapwood Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Slice budgets.
//!
//! A [`SliceBudget`] is consulted between fiber units to decide whether the
//! current slice may continue. The scheduler always performs at least one
//! unit per slice, so even an exhausted budget makes progress.

use crate::time::{Duration, HostTime};

/// Decides when a work slice yields.
pub trait SliceBudget {
    /// Returns `true` if another unit of work fits in this slice.
    fn has_time_remaining(&mut self) -> bool;

    /// Returns the current time, if this budget reads a clock.
    ///
    /// Used to timestamp trace events.
    fn now(&mut self) -> Option<HostTime> {
        None
    }
}

/// Allows a fixed number of units per slice.
///
/// Deterministic; the natural choice for tests.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UnitBudget {
    remaining: u32,
}

impl UnitBudget {
    /// Creates a budget for `units` fiber units.
    #[must_use]
    pub const fn new(units: u32) -> Self {
        Self { remaining: units }
    }

    /// Returns the units left.
    #[must_use]
    pub const fn remaining(&self) -> u32 {
        self.remaining
    }
}

impl SliceBudget for UnitBudget {
    fn has_time_remaining(&mut self) -> bool {
        if self.remaining == 0 {
            return false;
        }
        self.remaining -= 1;
        true
    }
}

/// Runs until a caller-supplied monotonic clock passes a deadline.
pub struct DeadlineBudget<F> {
    clock: F,
    deadline: HostTime,
}

impl<F: FnMut() -> HostTime> DeadlineBudget<F> {
    /// Creates a budget that expires at `deadline`.
    pub fn new(clock: F, deadline: HostTime) -> Self {
        Self { clock, deadline }
    }

    /// Creates a budget that expires `length` after the clock's current time.
    pub fn starting_now(mut clock: F, length: Duration) -> Self {
        let deadline = clock().saturating_add(length);
        Self { clock, deadline }
    }

    /// Returns the deadline.
    pub fn deadline(&self) -> HostTime {
        self.deadline
    }
}

impl<F> core::fmt::Debug for DeadlineBudget<F> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DeadlineBudget")
            .field("deadline", &self.deadline)
            .finish_non_exhaustive()
    }
}

impl<F: FnMut() -> HostTime> SliceBudget for DeadlineBudget<F> {
    fn has_time_remaining(&mut self) -> bool {
        (self.clock)() < self.deadline
    }

    fn now(&mut self) -> Option<HostTime> {
        Some((self.clock)())
    }
}

/// Never yields; a slice runs the whole queue.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Unbounded;

impl SliceBudget for Unbounded {
    fn has_time_remaining(&mut self) -> bool {
        true
    }
}

impl<B: SliceBudget + ?Sized> SliceBudget for &mut B {
    fn has_time_remaining(&mut self) -> bool {
        (**self).has_time_remaining()
    }

    fn now(&mut self) -> Option<HostTime> {
        (**self).now()
    }
}

#[cfg(test)]
mod tests {
    use core::cell::Cell;

    use super::*;

    #[test]
    fn unit_budget_counts_down() {
        let mut b = UnitBudget::new(2);
        assert!(b.has_time_remaining());
        assert!(b.has_time_remaining());
        assert!(!b.has_time_remaining());
        assert_eq!(b.remaining(), 0);
    }

    #[test]
    fn deadline_budget_reads_clock() {
        let t = Cell::new(100_u64);
        let mut b = DeadlineBudget::starting_now(|| HostTime(t.get()), Duration(50));
        assert_eq!(b.deadline(), HostTime(150));
        assert!(b.has_time_remaining());
        t.set(149);
        assert!(b.has_time_remaining());
        t.set(150);
        assert!(!b.has_time_remaining());
        assert_eq!(b.now(), Some(HostTime(150)));
    }

    #[test]
    fn unbounded_never_expires() {
        let mut b = Unbounded;
        for _ in 0..1000 {
            assert!(b.has_time_remaining());
        }
        assert_eq!(b.now(), None);
    }
}
