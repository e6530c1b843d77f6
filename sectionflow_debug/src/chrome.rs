// Copyright 2026 the Sectionflow Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chrome Trace Event Format exporter.
//!
//! [`export`] reads recorded bytes from a [`RecorderSink`](super::recorder::RecorderSink)
//! and writes [Chrome Trace Event Format][spec] JSON to the given writer.
//!
//! Each section gets its own track (`tid` = section index + 1). Lifecycle
//! states become duration slices on that track, so a loaded trace reads as a
//! per-section timeline. Page-wide events (active section, lock, viewport,
//! rotation) are instants on track 0.
//!
//! [spec]: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU

use std::io::{self, Write};

use serde_json::{Value, json};

use sectionflow_core::id::SectionId;
use sectionflow_core::lifecycle::LifecycleState;
use sectionflow_core::time::HostTime;
use sectionflow_core::trace::LockPhase;

use crate::recorder::{RecordedEvent, decode};

const PAGE_TRACK: u32 = 0;

/// Exports recorded events as Chrome Trace Event Format JSON.
///
/// The output is a complete JSON array of trace event objects, suitable for
/// loading into `chrome://tracing` or [Perfetto](https://ui.perfetto.dev/).
///
/// `names[i]` labels the track of section index `i`; missing names fall back
/// to the index.
pub fn export(bytes: &[u8], names: &[SectionId], writer: &mut dyn Write) -> io::Result<()> {
    let mut events: Vec<Value> = Vec::new();

    events.push(thread_name(PAGE_TRACK, "page"));
    for (idx, name) in names.iter().enumerate() {
        #[expect(
            clippy::cast_possible_truncation,
            reason = "section indices are u32 throughout"
        )]
        events.push(thread_name(idx as u32 + 1, name.as_str()));
    }

    for recorded in decode(bytes) {
        match recorded {
            RecordedEvent::Lifecycle(e) => {
                let tid = e.section + 1;
                if e.from != LifecycleState::Idle {
                    events.push(json!({
                        "ph": "E",
                        "name": e.from.as_str(),
                        "cat": "Lifecycle",
                        "ts": millis_to_us(e.at),
                        "pid": 0,
                        "tid": tid,
                    }));
                }
                if e.to != LifecycleState::Idle {
                    events.push(json!({
                        "ph": "B",
                        "name": e.to.as_str(),
                        "cat": "Lifecycle",
                        "ts": millis_to_us(e.at),
                        "pid": 0,
                        "tid": tid,
                        "args": {
                            "cause": e.cause.as_str(),
                        }
                    }));
                }
            }
            RecordedEvent::ActiveSection(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "ActiveSection",
                    "cat": "ScrollSpy",
                    "ts": millis_to_us(e.at),
                    "pid": 0,
                    "tid": PAGE_TRACK,
                    "s": "g",
                    "args": {
                        "from": e.from.map(|i| label(names, i)),
                        "to": label(names, e.to),
                        "locked": e.locked,
                    }
                }));
            }
            RecordedEvent::ScrollLock(e) => {
                let phase = match e.phase {
                    LockPhase::Engaged => "Engaged".to_owned(),
                    LockPhase::Released(reason) => format!("Released({reason:?})"),
                };
                events.push(json!({
                    "ph": "i",
                    "name": "ScrollLock",
                    "cat": "ScrollSpy",
                    "ts": millis_to_us(e.at),
                    "pid": 0,
                    "tid": PAGE_TRACK,
                    "s": "t",
                    "args": {
                        "target": label(names, e.target),
                        "phase": phase,
                    }
                }));
            }
            RecordedEvent::Viewport(e) => {
                let name = if e.frozen {
                    "ViewportFrozen"
                } else {
                    "ViewportRecomputed"
                };
                events.push(json!({
                    "ph": "i",
                    "name": name,
                    "cat": "Viewport",
                    "ts": millis_to_us(e.at),
                    "pid": 0,
                    "tid": PAGE_TRACK,
                    "s": "g",
                    "args": {
                        "previous": e.previous.as_str(),
                        "mode": e.mode.as_str(),
                        "after_rotation": e.after_rotation,
                    }
                }));
            }
            RecordedEvent::Rotation(e) => {
                let ph = if e.raised { "B" } else { "E" };
                events.push(json!({
                    "ph": ph,
                    "name": "Rotation",
                    "cat": "Viewport",
                    "ts": millis_to_us(e.at),
                    "pid": 0,
                    "tid": PAGE_TRACK,
                }));
            }
            RecordedEvent::Carousel(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "CarouselSelect",
                    "cat": "Playback",
                    "ts": millis_to_us(e.at),
                    "pid": 0,
                    "tid": e.section + 1,
                    "s": "t",
                    "args": {
                        "selected": e.selected,
                    }
                }));
            }
        }
    }

    serde_json::to_writer_pretty(writer, &events)?;
    Ok(())
}

fn thread_name(tid: u32, name: &str) -> Value {
    json!({
        "ph": "M",
        "name": "thread_name",
        "pid": 0,
        "tid": tid,
        "args": { "name": name },
    })
}

fn label(names: &[SectionId], idx: u32) -> String {
    names
        .get(idx as usize)
        .map_or_else(|| format!("#{idx}"), ToString::to_string)
}

fn millis_to_us(t: HostTime) -> u64 {
    t.millis().saturating_mul(1000)
}
