// Copyright 2026 the Sapwood Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compact binary event recording and decoding.
//!
//! [`RecorderSink`] implements [`TraceSink`] and encodes events into a
//! `Vec<u8>` as fixed-size little-endian records. [`decode`] reads them back
//! as an iterator of [`RecordedEvent`].
//!
//! Per-unit events store the raw fiber index and generation, since
//! [`FiberId`](sapwood_core::fiber::FiberId) handles are only meaningful
//! inside the arena that issued them.

use sapwood_core::CommitStats;
use sapwood_core::fiber::{EffectTag, FiberId, FiberTag};
use sapwood_core::scheduler::{RootId, SliceResult};
use sapwood_core::time::HostTime;
use sapwood_core::trace::{
    CommitEvent, EffectAppliedEvent, SliceBeginEvent, SliceEndEvent, TraceSink, UnitBeginEvent,
    UnitCompleteEvent, UpdateDequeuedEvent, UpdateKind,
};

// ---------------------------------------------------------------------------
// Event type discriminants
// ---------------------------------------------------------------------------

const TAG_UPDATE_DEQUEUED: u8 = 1;
const TAG_SLICE_BEGIN: u8 = 2;
const TAG_SLICE_END: u8 = 3;
const TAG_COMMIT: u8 = 4;
const TAG_UNIT_BEGIN: u8 = 5;
const TAG_UNIT_COMPLETE: u8 = 6;
const TAG_EFFECT_APPLIED: u8 = 7;

// ---------------------------------------------------------------------------
// RecorderSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that encodes events into a compact binary buffer.
#[derive(Debug, Default)]
pub struct RecorderSink {
    buf: Vec<u8>,
}

impl RecorderSink {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a view of the recorded bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consumes the recorder and returns the recorded bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    // -- encoding helpers --------------------------------------------------

    fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_time(&mut self, v: Option<HostTime>) {
        match v {
            Some(t) => {
                self.write_u8(1);
                self.write_u64(t.as_micros());
            }
            None => {
                self.write_u8(0);
                self.write_u64(0);
            }
        }
    }

    fn write_fiber(&mut self, fiber: FiberId) {
        self.write_u32(fiber.index());
        self.write_u32(fiber.generation());
    }

    fn write_fiber_tag(&mut self, tag: FiberTag) {
        self.write_u8(match tag {
            FiberTag::HostNode => 0,
            FiberTag::ComponentInstance => 1,
            FiberTag::RootAnchor => 2,
        });
    }

    fn write_effect_tag(&mut self, tag: EffectTag) {
        self.write_u8(match tag {
            EffectTag::None => 0,
            EffectTag::Insert => 1,
            EffectTag::Update => 2,
            EffectTag::Delete => 3,
        });
    }
}

impl TraceSink for RecorderSink {
    fn on_update_dequeued(&mut self, e: &UpdateDequeuedEvent) {
        self.write_u8(TAG_UPDATE_DEQUEUED);
        self.write_u64(e.slice_index);
        self.write_u8(match e.kind {
            UpdateKind::RenderRoot => 0,
            UpdateKind::SetState => 1,
        });
        self.write_u32(e.root.0);
        self.write_u32(e.generation);
        #[expect(
            clippy::cast_possible_truncation,
            reason = "queue length capped at u32::MAX for recording"
        )]
        self.write_u32(e.queued.min(u32::MAX as usize) as u32);
    }

    fn on_slice_begin(&mut self, e: &SliceBeginEvent) {
        self.write_u8(TAG_SLICE_BEGIN);
        self.write_u64(e.slice_index);
        self.write_u8(u8::from(e.resumed));
        self.write_time(e.timestamp);
    }

    fn on_slice_end(&mut self, e: &SliceEndEvent) {
        self.write_u8(TAG_SLICE_END);
        self.write_u64(e.slice_index);
        self.write_u32(e.units);
        self.write_u8(match e.result {
            SliceResult::Continue => 0,
            SliceResult::Idle => 1,
        });
        self.write_time(e.timestamp);
    }

    fn on_commit(&mut self, e: &CommitEvent) {
        self.write_u8(TAG_COMMIT);
        self.write_u64(e.slice_index);
        self.write_u32(e.root.0);
        self.write_u32(e.generation);
        self.write_u32(e.stats.inserted);
        self.write_u32(e.stats.updated);
        self.write_u32(e.stats.deleted);
        self.write_u32(e.stats.removed_host_nodes);
        self.write_u32(e.stats.released_instances);
        self.write_time(e.timestamp);
    }

    fn on_unit_begin(&mut self, e: &UnitBeginEvent) {
        self.write_u8(TAG_UNIT_BEGIN);
        self.write_fiber(e.fiber);
        self.write_fiber_tag(e.tag);
    }

    fn on_unit_complete(&mut self, e: &UnitCompleteEvent) {
        self.write_u8(TAG_UNIT_COMPLETE);
        self.write_fiber(e.fiber);
        self.write_effect_tag(e.effect_tag);
    }

    fn on_effect_applied(&mut self, e: &EffectAppliedEvent) {
        self.write_u8(TAG_EFFECT_APPLIED);
        self.write_fiber(e.fiber);
        self.write_effect_tag(e.tag);
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// A fiber handle as recorded: `(index, generation)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RecordedFiber {
    /// Slot index in its arena.
    pub index: u32,
    /// Generation of its arena.
    pub generation: u32,
}

/// A decoded event from a binary recording.
#[derive(Clone, Debug)]
pub enum RecordedEvent {
    /// An [`UpdateDequeuedEvent`].
    UpdateDequeued(UpdateDequeuedEvent),
    /// A [`SliceBeginEvent`].
    SliceBegin(SliceBeginEvent),
    /// A [`SliceEndEvent`].
    SliceEnd(SliceEndEvent),
    /// A [`CommitEvent`].
    Commit(CommitEvent),
    /// A fiber unit began.
    UnitBegin {
        /// The fiber.
        fiber: RecordedFiber,
        /// Its tag.
        tag: FiberTag,
    },
    /// A fiber completed.
    UnitComplete {
        /// The fiber.
        fiber: RecordedFiber,
        /// Its own effect tag.
        effect_tag: EffectTag,
    },
    /// An effect was applied during commit.
    EffectApplied {
        /// The fiber.
        fiber: RecordedFiber,
        /// The applied effect.
        tag: EffectTag,
    },
}

/// Decodes a byte slice produced by [`RecorderSink`] into an iterator of
/// [`RecordedEvent`].
pub fn decode(bytes: &[u8]) -> DecodeIter<'_> {
    DecodeIter {
        data: bytes,
        pos: 0,
    }
}

/// Iterator over decoded events.
#[derive(Debug)]
pub struct DecodeIter<'a> {
    data: &'a [u8],
    pos: usize,
}

impl DecodeIter<'_> {
    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn read_u8(&mut self) -> Option<u8> {
        if self.remaining() < 1 {
            return None;
        }
        let v = self.data[self.pos];
        self.pos += 1;
        Some(v)
    }

    fn read_u32(&mut self) -> Option<u32> {
        if self.remaining() < 4 {
            return None;
        }
        let v = u32::from_le_bytes(self.data[self.pos..self.pos + 4].try_into().ok()?);
        self.pos += 4;
        Some(v)
    }

    fn read_u64(&mut self) -> Option<u64> {
        if self.remaining() < 8 {
            return None;
        }
        let v = u64::from_le_bytes(self.data[self.pos..self.pos + 8].try_into().ok()?);
        self.pos += 8;
        Some(v)
    }

    fn read_time(&mut self) -> Option<Option<HostTime>> {
        let present = self.read_u8()?;
        let micros = self.read_u64()?;
        Some((present != 0).then_some(HostTime::from_micros(micros)))
    }

    fn read_fiber(&mut self) -> Option<RecordedFiber> {
        Some(RecordedFiber {
            index: self.read_u32()?,
            generation: self.read_u32()?,
        })
    }

    fn read_fiber_tag(&mut self) -> Option<FiberTag> {
        Some(match self.read_u8()? {
            0 => FiberTag::HostNode,
            1 => FiberTag::ComponentInstance,
            _ => FiberTag::RootAnchor,
        })
    }

    fn read_effect_tag(&mut self) -> Option<EffectTag> {
        Some(match self.read_u8()? {
            0 => EffectTag::None,
            1 => EffectTag::Insert,
            2 => EffectTag::Update,
            _ => EffectTag::Delete,
        })
    }

    fn decode_update_dequeued(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::UpdateDequeued(UpdateDequeuedEvent {
            slice_index: self.read_u64()?,
            kind: match self.read_u8()? {
                0 => UpdateKind::RenderRoot,
                _ => UpdateKind::SetState,
            },
            root: RootId(self.read_u32()?),
            generation: self.read_u32()?,
            queued: self.read_u32()? as usize,
        }))
    }

    fn decode_slice_begin(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::SliceBegin(SliceBeginEvent {
            slice_index: self.read_u64()?,
            resumed: self.read_u8()? != 0,
            timestamp: self.read_time()?,
        }))
    }

    fn decode_slice_end(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::SliceEnd(SliceEndEvent {
            slice_index: self.read_u64()?,
            units: self.read_u32()?,
            result: match self.read_u8()? {
                0 => SliceResult::Continue,
                _ => SliceResult::Idle,
            },
            timestamp: self.read_time()?,
        }))
    }

    fn decode_commit(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Commit(CommitEvent {
            slice_index: self.read_u64()?,
            root: RootId(self.read_u32()?),
            generation: self.read_u32()?,
            stats: CommitStats {
                inserted: self.read_u32()?,
                updated: self.read_u32()?,
                deleted: self.read_u32()?,
                removed_host_nodes: self.read_u32()?,
                released_instances: self.read_u32()?,
            },
            timestamp: self.read_time()?,
        }))
    }

    fn decode_unit_begin(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::UnitBegin {
            fiber: self.read_fiber()?,
            tag: self.read_fiber_tag()?,
        })
    }

    fn decode_unit_complete(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::UnitComplete {
            fiber: self.read_fiber()?,
            effect_tag: self.read_effect_tag()?,
        })
    }

    fn decode_effect_applied(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::EffectApplied {
            fiber: self.read_fiber()?,
            tag: self.read_effect_tag()?,
        })
    }
}

impl Iterator for DecodeIter<'_> {
    type Item = RecordedEvent;

    fn next(&mut self) -> Option<Self::Item> {
        let tag = self.read_u8()?;
        match tag {
            TAG_UPDATE_DEQUEUED => self.decode_update_dequeued(),
            TAG_SLICE_BEGIN => self.decode_slice_begin(),
            TAG_SLICE_END => self.decode_slice_end(),
            TAG_COMMIT => self.decode_commit(),
            TAG_UNIT_BEGIN => self.decode_unit_begin(),
            TAG_UNIT_COMPLETE => self.decode_unit_complete(),
            TAG_EFFECT_APPLIED => self.decode_effect_applied(),
            _ => None, // unknown tag → stop iteration
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use sapwood_backend_memory::MemoryHost;
    use sapwood_core::budget::UnitBudget;
    use sapwood_core::element::{Child, ElementKind, create_element};
    use sapwood_core::scheduler::Scheduler;
    use sapwood_core::trace::Tracer;

    #[test]
    fn slice_and_commit_events_decode() {
        let mut rec = RecorderSink::new();
        rec.on_slice_begin(&SliceBeginEvent {
            slice_index: 3,
            resumed: true,
            timestamp: Some(HostTime(1_500)),
        });
        rec.on_commit(&CommitEvent {
            slice_index: 3,
            root: RootId(1),
            generation: 9,
            stats: CommitStats {
                inserted: 4,
                deleted: 1,
                removed_host_nodes: 2,
                ..CommitStats::default()
            },
            timestamp: None,
        });

        let events: Vec<_> = decode(rec.as_bytes()).collect();
        assert_eq!(events.len(), 2);
        match &events[0] {
            RecordedEvent::SliceBegin(e) => {
                assert_eq!(e.slice_index, 3);
                assert!(e.resumed);
                assert_eq!(e.timestamp, Some(HostTime(1_500)));
            }
            other => panic!("expected SliceBegin, got {other:?}"),
        }
        match &events[1] {
            RecordedEvent::Commit(e) => {
                assert_eq!(e.root, RootId(1));
                assert_eq!(e.generation, 9);
                assert_eq!(e.stats.inserted, 4);
                assert_eq!(e.stats.removed_host_nodes, 2);
                assert_eq!(e.timestamp, None);
            }
            other => panic!("expected Commit, got {other:?}"),
        }
    }

    #[test]
    fn truncated_recording_stops_cleanly() {
        let mut rec = RecorderSink::new();
        rec.on_slice_end(&SliceEndEvent {
            slice_index: 0,
            units: 2,
            result: SliceResult::Idle,
            timestamp: None,
        });
        let bytes = rec.into_bytes();
        assert_eq!(decode(&bytes[..bytes.len() - 1]).count(), 0);
        assert_eq!(decode(&bytes).count(), 1);
    }

    #[test]
    fn records_a_sliced_render() {
        let mut host = MemoryHost::new();
        let container = host.create_container("root");
        let mut scheduler = Scheduler::default();
        let root = scheduler.create_root(container);
        let list = create_element(
            ElementKind::host("ul"),
            None,
            [Child::from("a"), Child::from("b")],
        )
        .unwrap();
        scheduler.render(root, [list]);

        let mut rec = RecorderSink::new();
        for _ in 0..2 {
            scheduler
                .run_slice_traced(&mut host, UnitBudget::new(2), &mut Tracer::new(&mut rec))
                .unwrap();
        }

        let events: Vec<_> = decode(rec.as_bytes()).collect();
        let units = events
            .iter()
            .filter(|e| matches!(e, RecordedEvent::UnitBegin { .. }))
            .count();
        let applied = events
            .iter()
            .filter(|e| matches!(e, RecordedEvent::EffectApplied { .. }))
            .count();
        // root, ul, two texts.
        assert_eq!(units, 4);
        assert_eq!(applied, 3);
        assert!(matches!(events[0], RecordedEvent::SliceBegin(_)));
        assert!(matches!(events[1], RecordedEvent::UpdateDequeued(_)));
        assert!(matches!(
            events.last(),
            Some(RecordedEvent::SliceEnd(SliceEndEvent {
                result: SliceResult::Idle,
                ..
            }))
        ));
        let commits = events
            .iter()
            .filter(|e| matches!(e, RecordedEvent::Commit(_)))
            .count();
        assert_eq!(commits, 1);
    }
}
