// Copyright 2026 the Sapwood Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr).

use std::io::Write;

use sapwood_core::scheduler::SliceResult;
use sapwood_core::time::HostTime;
use sapwood_core::trace::{
    CommitEvent, EffectAppliedEvent, SliceBeginEvent, SliceEndEvent, TraceSink, UnitBeginEvent,
    UnitCompleteEvent, UpdateDequeuedEvent, UpdateKind,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
///
/// Per-unit events are only printed when `verbose` is set; a large tree
/// produces several lines per fiber.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
    verbose: bool,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink")
            .field("verbose", &self.verbose)
            .finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self::new(Box::new(std::io::stderr()))
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>) -> Self {
        Self {
            writer,
            verbose: false,
        }
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self {
            writer,
            verbose: false,
        }
    }

    /// Also prints per-unit and per-effect events.
    #[must_use]
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Consumes the sink and returns the writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

fn at(timestamp: Option<HostTime>) -> String {
    match timestamp {
        Some(t) => format!(" at {}µs", t.as_micros()),
        None => String::new(),
    }
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_update_dequeued(&mut self, e: &UpdateDequeuedEvent) {
        let kind = match e.kind {
            UpdateKind::RenderRoot => "render",
            UpdateKind::SetState => "set-state",
        };
        let _ = writeln!(
            self.writer,
            "[update] slice={} {kind} root={} gen={} queued={}",
            e.slice_index, e.root.0, e.generation, e.queued,
        );
    }

    fn on_slice_begin(&mut self, e: &SliceBeginEvent) {
        let resumed = if e.resumed { " resumed" } else { "" };
        let _ = writeln!(
            self.writer,
            "[slice:begin] slice={}{resumed}{}",
            e.slice_index,
            at(e.timestamp),
        );
    }

    fn on_slice_end(&mut self, e: &SliceEndEvent) {
        let result = match e.result {
            SliceResult::Continue => "continue",
            SliceResult::Idle => "idle",
        };
        let _ = writeln!(
            self.writer,
            "[slice:end] slice={} units={} {result}{}",
            e.slice_index,
            e.units,
            at(e.timestamp),
        );
    }

    fn on_commit(&mut self, e: &CommitEvent) {
        let s = e.stats;
        let _ = writeln!(
            self.writer,
            "[commit] slice={} root={} gen={} +{} ~{} -{} (hosts={} instances={}){}",
            e.slice_index,
            e.root.0,
            e.generation,
            s.inserted,
            s.updated,
            s.deleted,
            s.removed_host_nodes,
            s.released_instances,
            at(e.timestamp),
        );
    }

    fn on_unit_begin(&mut self, e: &UnitBeginEvent) {
        if self.verbose {
            let _ = writeln!(self.writer, "  [unit] {:?} {:?}", e.fiber, e.tag);
        }
    }

    fn on_unit_complete(&mut self, e: &UnitCompleteEvent) {
        if self.verbose {
            let _ = writeln!(self.writer, "  [done] {:?} {:?}", e.fiber, e.effect_tag);
        }
    }

    fn on_effect_applied(&mut self, e: &EffectAppliedEvent) {
        if self.verbose {
            let _ = writeln!(self.writer, "  [effect] {:?} {:?}", e.fiber, e.tag);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sapwood_core::CommitStats;
    use sapwood_core::scheduler::RootId;

    #[test]
    fn pretty_print_commit() {
        let mut sink = PrettyPrintSink::with_writer(Vec::<u8>::new());
        sink.on_commit(&CommitEvent {
            slice_index: 4,
            root: RootId(0),
            generation: 2,
            stats: CommitStats {
                inserted: 3,
                ..CommitStats::default()
            },
            timestamp: Some(HostTime(250)),
        });
        let output = String::from_utf8(sink.into_inner()).unwrap();
        assert!(output.contains("[commit]"), "got: {output}");
        assert!(output.contains("slice=4"), "got: {output}");
        assert!(output.contains("+3"), "got: {output}");
        assert!(output.contains("at 250µs"), "got: {output}");
    }

    #[test]
    fn slice_lines_without_clock_omit_the_timestamp() {
        let mut sink = PrettyPrintSink::with_writer(Vec::<u8>::new());
        sink.on_slice_end(&SliceEndEvent {
            slice_index: 1,
            units: 5,
            result: SliceResult::Continue,
            timestamp: None,
        });
        let output = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(output, "[slice:end] slice=1 units=5 continue\n");
    }
}
