// Copyright 2026 the Sapwood Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chrome Trace Event Format exporter.
//!
//! [`export`] reads recorded bytes from a [`RecorderSink`](super::recorder::RecorderSink)
//! and writes [Chrome Trace Event Format][spec] JSON to the given writer.
//!
//! Slices become duration events; updates, commits, and effects become
//! instants. Events recorded without a clock reading reuse the last known
//! timestamp so they stay in order on the timeline.
//!
//! [spec]: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU

use std::io::{self, Write};

use serde_json::{Value, json};

use sapwood_core::time::HostTime;

use crate::recorder::{RecordedEvent, decode};

/// Exports recorded events as Chrome Trace Event Format JSON.
///
/// The output is a complete JSON array of trace event objects, suitable for
/// loading into `chrome://tracing` or [Perfetto](https://ui.perfetto.dev/).
/// Roots map to process ids.
pub fn export(bytes: &[u8], writer: &mut dyn Write) -> io::Result<()> {
    let mut events: Vec<Value> = Vec::new();
    let mut last_ts = 0_u64;
    let mut ts = |t: Option<HostTime>| {
        if let Some(t) = t {
            last_ts = t.as_micros();
        }
        last_ts
    };

    for recorded in decode(bytes) {
        match recorded {
            RecordedEvent::SliceBegin(e) => {
                events.push(json!({
                    "ph": "B",
                    "name": "Slice",
                    "cat": "Scheduler",
                    "ts": ts(e.timestamp),
                    "pid": 0,
                    "tid": 0,
                    "args": {
                        "slice_index": e.slice_index,
                        "resumed": e.resumed,
                    }
                }));
            }
            RecordedEvent::SliceEnd(e) => {
                events.push(json!({
                    "ph": "E",
                    "name": "Slice",
                    "cat": "Scheduler",
                    "ts": ts(e.timestamp),
                    "pid": 0,
                    "tid": 0,
                    "args": {
                        "slice_index": e.slice_index,
                        "units": e.units,
                        "result": format!("{:?}", e.result),
                    }
                }));
            }
            RecordedEvent::UpdateDequeued(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": format!("{:?}", e.kind),
                    "cat": "Update",
                    "ts": ts(None),
                    "pid": e.root.0,
                    "tid": 0,
                    "s": "p",
                    "args": {
                        "slice_index": e.slice_index,
                        "generation": e.generation,
                        "queued": e.queued,
                    }
                }));
            }
            RecordedEvent::Commit(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "Commit",
                    "cat": "Commit",
                    "ts": ts(e.timestamp),
                    "pid": e.root.0,
                    "tid": 0,
                    "s": "p",
                    "args": {
                        "slice_index": e.slice_index,
                        "generation": e.generation,
                        "inserted": e.stats.inserted,
                        "updated": e.stats.updated,
                        "deleted": e.stats.deleted,
                        "removed_host_nodes": e.stats.removed_host_nodes,
                        "released_instances": e.stats.released_instances,
                    }
                }));
            }
            RecordedEvent::UnitBegin { fiber, tag } => {
                events.push(json!({
                    "ph": "i",
                    "name": format!("{tag:?}"),
                    "cat": "Unit",
                    "ts": ts(None),
                    "pid": 0,
                    "tid": 0,
                    "s": "t",
                    "args": {
                        "fiber": fiber.index,
                        "generation": fiber.generation,
                    }
                }));
            }
            RecordedEvent::UnitComplete { fiber, effect_tag } => {
                events.push(json!({
                    "ph": "i",
                    "name": "Complete",
                    "cat": "Unit",
                    "ts": ts(None),
                    "pid": 0,
                    "tid": 0,
                    "s": "t",
                    "args": {
                        "fiber": fiber.index,
                        "generation": fiber.generation,
                        "effect": format!("{effect_tag:?}"),
                    }
                }));
            }
            RecordedEvent::EffectApplied { fiber, tag } => {
                events.push(json!({
                    "ph": "i",
                    "name": format!("{tag:?}"),
                    "cat": "Effect",
                    "ts": ts(None),
                    "pid": 0,
                    "tid": 0,
                    "s": "t",
                    "args": {
                        "fiber": fiber.index,
                        "generation": fiber.generation,
                    }
                }));
            }
        }
    }

    serde_json::to_writer_pretty(writer, &events)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::RecorderSink;
    use sapwood_core::scheduler::SliceResult;
    use sapwood_core::trace::{SliceBeginEvent, SliceEndEvent, TraceSink};

    #[test]
    fn export_produces_valid_json() {
        let mut rec = RecorderSink::new();
        rec.on_slice_begin(&SliceBeginEvent {
            slice_index: 0,
            resumed: false,
            timestamp: Some(HostTime(1_000)),
        });
        rec.on_slice_end(&SliceEndEvent {
            slice_index: 0,
            units: 3,
            result: SliceResult::Idle,
            timestamp: Some(HostTime(1_200)),
        });

        let mut out = Vec::new();
        export(rec.as_bytes(), &mut out).unwrap();
        let json_str = String::from_utf8(out).unwrap();

        let parsed: Vec<Value> = serde_json::from_str(&json_str).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0]["ph"], "B");
        assert_eq!(parsed[0]["name"], "Slice");
        assert_eq!(parsed[0]["ts"], 1_000);
        assert_eq!(parsed[1]["ph"], "E");
        assert_eq!(parsed[1]["args"]["units"], 3);
        assert_eq!(parsed[1]["args"]["result"], "Idle");
    }

    #[test]
    fn events_without_a_clock_reuse_the_last_timestamp() {
        let mut rec = RecorderSink::new();
        rec.on_slice_begin(&SliceBeginEvent {
            slice_index: 0,
            resumed: false,
            timestamp: Some(HostTime(40)),
        });
        rec.on_slice_end(&SliceEndEvent {
            slice_index: 0,
            units: 1,
            result: SliceResult::Continue,
            timestamp: None,
        });

        let mut out = Vec::new();
        export(rec.as_bytes(), &mut out).unwrap();
        let parsed: Vec<Value> = serde_json::from_slice(&out).unwrap();
        assert_eq!(parsed[1]["ts"], 40);
    }

    #[test]
    fn export_empty_recording() {
        let mut out = Vec::new();
        export(&[], &mut out).unwrap();
        let json_str = String::from_utf8(out).unwrap();
        let parsed: Vec<Value> = serde_json::from_str(&json_str).unwrap();
        assert!(parsed.is_empty());
    }
}
