// Copyright 2026 the Sapwood Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for the work loop.
//!
//! This module provides a [`TraceSink`] trait with per-event methods that the
//! scheduler calls as it dequeues updates, runs slices, and commits. All
//! method bodies default to no-ops, so implementing only the events you care
//! about is fine.
//!
//! [`Tracer`] wraps an optional `&mut dyn TraceSink`. When the `trace` feature
//! is **off**, every `Tracer` method compiles to nothing (zero overhead). When
//! **on**, each method performs a single `Option` branch before dispatching.
//!
//! # Crate features
//!
//! - `trace`: enables the `Tracer` method bodies (one branch per call).
//! - `trace-rich` (implies `trace`): gates per-unit and per-effect events
//!   plus the corresponding `TraceSink` methods.

use crate::CommitStats;
use crate::scheduler::{RootId, SliceResult};
use crate::time::HostTime;

#[cfg(feature = "trace-rich")]
use crate::fiber::{EffectTag, FiberId, FiberTag};

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Which kind of update started a work cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UpdateKind {
    /// A root render.
    RenderRoot,
    /// A component state update.
    SetState,
}

/// Emitted when an update is popped and a work cycle starts.
#[derive(Clone, Copy, Debug)]
pub struct UpdateDequeuedEvent {
    /// Slice that dequeued the update.
    pub slice_index: u64,
    /// What kind of update it was.
    pub kind: UpdateKind,
    /// The root being re-rendered.
    pub root: RootId,
    /// Generation of the new work arena.
    pub generation: u32,
    /// Updates still queued behind this one.
    pub queued: usize,
}

/// Marks the beginning of a slice.
#[derive(Clone, Copy, Debug)]
pub struct SliceBeginEvent {
    /// Monotonic slice counter.
    pub slice_index: u64,
    /// Whether the slice resumes an interrupted cycle.
    pub resumed: bool,
    /// Budget clock reading, if the budget has a clock.
    pub timestamp: Option<HostTime>,
}

/// Marks the end of a slice.
#[derive(Clone, Copy, Debug)]
pub struct SliceEndEvent {
    /// Monotonic slice counter.
    pub slice_index: u64,
    /// Fiber units performed in this slice.
    pub units: u32,
    /// What the slice reported to the driver.
    pub result: SliceResult,
    /// Budget clock reading, if the budget has a clock.
    pub timestamp: Option<HostTime>,
}

/// Emitted after a commit pass.
#[derive(Clone, Copy, Debug)]
pub struct CommitEvent {
    /// Slice that committed.
    pub slice_index: u64,
    /// The committed root.
    pub root: RootId,
    /// Generation of the arena that became current.
    pub generation: u32,
    /// Counts of applied effects.
    pub stats: CommitStats,
    /// Budget clock reading, if the budget has a clock.
    pub timestamp: Option<HostTime>,
}

/// Emitted before a fiber unit is begun (requires `trace-rich`).
#[cfg(feature = "trace-rich")]
#[derive(Clone, Copy, Debug)]
pub struct UnitBeginEvent {
    /// The fiber being processed.
    pub fiber: FiberId,
    /// Its tag.
    pub tag: FiberTag,
}

/// Emitted when a fiber completes (requires `trace-rich`).
#[cfg(feature = "trace-rich")]
#[derive(Clone, Copy, Debug)]
pub struct UnitCompleteEvent {
    /// The completed fiber.
    pub fiber: FiberId,
    /// Its own effect tag.
    pub effect_tag: EffectTag,
}

/// Emitted for each effect applied during commit (requires `trace-rich`).
#[cfg(feature = "trace-rich")]
#[derive(Clone, Copy, Debug)]
pub struct EffectAppliedEvent {
    /// The fiber the effect applied to.
    pub fiber: FiberId,
    /// The applied effect.
    pub tag: EffectTag,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from the work loop.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait TraceSink {
    /// Called when a work cycle starts from a dequeued update.
    fn on_update_dequeued(&mut self, e: &UpdateDequeuedEvent) {
        _ = e;
    }

    /// Called at the beginning of a slice.
    fn on_slice_begin(&mut self, e: &SliceBeginEvent) {
        _ = e;
    }

    /// Called at the end of a slice.
    fn on_slice_end(&mut self, e: &SliceEndEvent) {
        _ = e;
    }

    /// Called after a commit pass.
    fn on_commit(&mut self, e: &CommitEvent) {
        _ = e;
    }

    /// Called before each fiber unit (requires `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    fn on_unit_begin(&mut self, e: &UnitBeginEvent) {
        _ = e;
    }

    /// Called when a fiber completes (requires `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    fn on_unit_complete(&mut self, e: &UnitCompleteEvent) {
        _ = e;
    }

    /// Called for each applied effect (requires `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    fn on_effect_applied(&mut self, e: &EffectAppliedEvent) {
        _ = e;
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Thin wrapper around an optional [`TraceSink`].
///
/// When the `trace` feature is **off**, every method compiles to nothing. When
/// **on**, each method checks the inner `Option` (one branch) before
/// dispatching to the sink.
pub struct Tracer<'a> {
    #[cfg(feature = "trace")]
    sink: Option<&'a mut dyn TraceSink>,
    #[cfg(not(feature = "trace"))]
    _marker: core::marker::PhantomData<&'a mut dyn TraceSink>,
}

impl core::fmt::Debug for Tracer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

impl<'a> Tracer<'a> {
    /// Creates a tracer that dispatches to the given sink.
    #[inline]
    #[must_use]
    pub fn new(sink: &'a mut dyn TraceSink) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: Some(sink) }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: None }
        }
        #[cfg(not(feature = "trace"))]
        {
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Emits an [`UpdateDequeuedEvent`].
    #[inline]
    pub fn update_dequeued(&mut self, e: &UpdateDequeuedEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_update_dequeued(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`SliceBeginEvent`].
    #[inline]
    pub fn slice_begin(&mut self, e: &SliceBeginEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_slice_begin(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`SliceEndEvent`].
    #[inline]
    pub fn slice_end(&mut self, e: &SliceEndEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_slice_end(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`CommitEvent`].
    #[inline]
    pub fn commit(&mut self, e: &CommitEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_commit(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`UnitBeginEvent`] (requires `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    #[inline]
    pub fn unit_begin(&mut self, e: &UnitBeginEvent) {
        if let Some(s) = &mut self.sink {
            s.on_unit_begin(e);
        }
    }

    /// Emits a [`UnitCompleteEvent`] (requires `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    #[inline]
    pub fn unit_complete(&mut self, e: &UnitCompleteEvent) {
        if let Some(s) = &mut self.sink {
            s.on_unit_complete(e);
        }
    }

    /// Emits an [`EffectAppliedEvent`] (requires `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    #[inline]
    pub fn effect_applied(&mut self, e: &EffectAppliedEvent) {
        if let Some(s) = &mut self.sink {
            s.on_effect_applied(e);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_begin() -> SliceBeginEvent {
        SliceBeginEvent {
            slice_index: 9,
            resumed: false,
            timestamp: Some(HostTime(1_000)),
        }
    }

    #[test]
    fn noop_sink_compiles() {
        let mut sink = NoopSink;
        sink.on_slice_begin(&sample_begin());
        sink.on_commit(&CommitEvent {
            slice_index: 0,
            root: RootId(0),
            generation: 1,
            stats: CommitStats::default(),
            timestamp: None,
        });
    }

    #[test]
    fn tracer_none_does_nothing() {
        let mut tracer = Tracer::none();
        tracer.slice_begin(&sample_begin());
        tracer.slice_end(&SliceEndEvent {
            slice_index: 9,
            units: 3,
            result: SliceResult::Idle,
            timestamp: None,
        });
    }

    #[cfg(feature = "trace")]
    #[test]
    fn tracer_dispatches_to_sink() {
        use alloc::vec::Vec;

        struct RecordingSink {
            slices: Vec<u64>,
        }
        impl TraceSink for RecordingSink {
            fn on_slice_begin(&mut self, e: &SliceBeginEvent) {
                self.slices.push(e.slice_index);
            }
        }

        let mut sink = RecordingSink { slices: Vec::new() };
        let mut tracer = Tracer::new(&mut sink);
        tracer.slice_begin(&sample_begin());
        drop(tracer);
        assert_eq!(sink.slices, &[9]);
    }
}
