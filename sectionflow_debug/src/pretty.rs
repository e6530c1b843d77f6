// Copyright 2026 the Sectionflow Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr). Sections are
//! printed by name when names are supplied, by index otherwise.

use std::io::Write;

use sectionflow_core::id::SectionId;
use sectionflow_core::scroll_spy::LockRelease;
use sectionflow_core::trace::{
    ActiveSectionEvent, CarouselEvent, LifecycleTransitionEvent, LockPhase, RotationSignalEvent,
    ScrollLockEvent, TraceSink, ViewportEvent,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
    names: Vec<SectionId>,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink")
            .field("names", &self.names)
            .finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self {
            writer: Box::new(std::io::stderr()),
            names: Vec::new(),
        }
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>) -> Self {
        Self {
            writer,
            names: Vec::new(),
        }
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self {
            writer,
            names: Vec::new(),
        }
    }

    /// Prints sections by id; `names[i]` is the id of section index `i`.
    #[must_use]
    pub fn with_section_names(mut self, names: &[SectionId]) -> Self {
        self.names = names.to_vec();
        self
    }

    /// Consumes the sink and returns the writer.
    pub fn into_writer(self) -> W {
        self.writer
    }

    fn section(&self, idx: u32) -> String {
        self.names
            .get(idx as usize)
            .map_or_else(|| format!("#{idx}"), ToString::to_string)
    }
}

fn release_name(reason: LockRelease) -> &'static str {
    match reason {
        LockRelease::Arrived => "arrived",
        LockRelease::TimedOut => "timed-out",
        LockRelease::Superseded => "superseded",
        LockRelease::Unreachable => "unreachable",
    }
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_lifecycle_transition(&mut self, e: &LifecycleTransitionEvent) {
        let section = self.section(e.section);
        let _ = writeln!(
            self.writer,
            "[lifecycle] t={}ms {section}: {} -> {} ({})",
            e.at.millis(),
            e.from.as_str(),
            e.to.as_str(),
            e.cause.as_str(),
        );
    }

    fn on_active_section(&mut self, e: &ActiveSectionEvent) {
        let from = e.from.map_or_else(|| "-".to_owned(), |i| self.section(i));
        let to = self.section(e.to);
        let how = if e.locked { " (nav)" } else { "" };
        let _ = writeln!(
            self.writer,
            "[active] t={}ms {from} -> {to}{how}",
            e.at.millis(),
        );
    }

    fn on_scroll_lock(&mut self, e: &ScrollLockEvent) {
        let target = self.section(e.target);
        let phase = match e.phase {
            LockPhase::Engaged => "engaged",
            LockPhase::Released(reason) => release_name(reason),
        };
        let _ = writeln!(
            self.writer,
            "[lock] t={}ms target={target} {phase}",
            e.at.millis(),
        );
    }

    fn on_viewport(&mut self, e: &ViewportEvent) {
        let what = if e.frozen {
            format!("frozen at {}", e.mode.as_str())
        } else if e.after_rotation {
            format!("{} -> {} (after rotation)", e.previous.as_str(), e.mode.as_str())
        } else {
            format!("{} -> {}", e.previous.as_str(), e.mode.as_str())
        };
        let _ = writeln!(self.writer, "[viewport] t={}ms {what}", e.at.millis());
    }

    fn on_rotation_signal(&mut self, e: &RotationSignalEvent) {
        let state = if e.raised { "raised" } else { "lowered" };
        let _ = writeln!(self.writer, "[rotation] t={}ms {state}", e.at.millis());
    }

    fn on_carousel(&mut self, e: &CarouselEvent) {
        let section = self.section(e.section);
        let _ = writeln!(
            self.writer,
            "[carousel] t={}ms {section} selected={}",
            e.at.millis(),
            e.selected,
        );
    }
}
