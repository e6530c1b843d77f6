// Copyright 2026 the Sectionflow Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compact binary event recording and decoding.
//!
//! [`RecorderSink`] implements [`TraceSink`] and encodes events into a
//! `Vec<u8>` as fixed-size little-endian records. [`decode`] reads them back
//! as an iterator of [`RecordedEvent`].

use sectionflow_core::lifecycle::{LifecycleEvent, LifecycleState};
use sectionflow_core::scroll_spy::LockRelease;
use sectionflow_core::time::HostTime;
use sectionflow_core::trace::{
    ActiveSectionEvent, CarouselEvent, LifecycleTransitionEvent, LockPhase, RotationSignalEvent,
    ScrollLockEvent, TraceSink, ViewportEvent,
};
use sectionflow_core::viewport::DeviceMode;

// ---------------------------------------------------------------------------
// Event type discriminants
// ---------------------------------------------------------------------------

const TAG_LIFECYCLE: u8 = 1;
const TAG_ACTIVE_SECTION: u8 = 2;
const TAG_SCROLL_LOCK: u8 = 3;
const TAG_VIEWPORT: u8 = 4;
const TAG_ROTATION: u8 = 5;
const TAG_CAROUSEL: u8 = 6;

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

    fn write_bool(&mut self, v: bool) {
        self.write_u8(u8::from(v));
    }

    fn write_option_u32(&mut self, v: Option<u32>) {
        self.write_bool(v.is_some());
        self.write_u32(v.unwrap_or(0));
    }

    fn write_state(&mut self, s: LifecycleState) {
        self.write_u8(match s {
            LifecycleState::Idle => 0,
            LifecycleState::Entering => 1,
            LifecycleState::Active => 2,
            LifecycleState::Preserving => 3,
            LifecycleState::Cleaned => 4,
        });
    }

    fn write_cause(&mut self, e: LifecycleEvent) {
        self.write_u8(match e {
            LifecycleEvent::Shown => 0,
            LifecycleEvent::Hidden => 1,
            LifecycleEvent::EntranceElapsed => 2,
            LifecycleEvent::PreservationElapsed => 3,
        });
    }

    fn write_lock_phase(&mut self, p: LockPhase) {
        self.write_u8(match p {
            LockPhase::Engaged => 0,
            LockPhase::Released(LockRelease::Arrived) => 1,
            LockPhase::Released(LockRelease::TimedOut) => 2,
            LockPhase::Released(LockRelease::Superseded) => 3,
            LockPhase::Released(LockRelease::Unreachable) => 4,
        });
    }

    fn write_mode(&mut self, m: DeviceMode) {
        self.write_u8(match m {
            DeviceMode::Desktop => 0,
            DeviceMode::TabletPortrait => 1,
            DeviceMode::TabletLandscape => 2,
        });
    }
}

impl TraceSink for RecorderSink {
    fn on_lifecycle_transition(&mut self, e: &LifecycleTransitionEvent) {
        self.write_u8(TAG_LIFECYCLE);
        self.write_u32(e.section);
        self.write_state(e.from);
        self.write_state(e.to);
        self.write_cause(e.cause);
        self.write_u64(e.at.millis());
    }

    fn on_active_section(&mut self, e: &ActiveSectionEvent) {
        self.write_u8(TAG_ACTIVE_SECTION);
        self.write_option_u32(e.from);
        self.write_u32(e.to);
        self.write_bool(e.locked);
        self.write_u64(e.at.millis());
    }

    fn on_scroll_lock(&mut self, e: &ScrollLockEvent) {
        self.write_u8(TAG_SCROLL_LOCK);
        self.write_u32(e.target);
        self.write_lock_phase(e.phase);
        self.write_u64(e.at.millis());
    }

    fn on_viewport(&mut self, e: &ViewportEvent) {
        self.write_u8(TAG_VIEWPORT);
        self.write_mode(e.previous);
        self.write_mode(e.mode);
        self.write_bool(e.frozen);
        self.write_bool(e.after_rotation);
        self.write_u64(e.at.millis());
    }

    fn on_rotation_signal(&mut self, e: &RotationSignalEvent) {
        self.write_u8(TAG_ROTATION);
        self.write_bool(e.raised);
        self.write_u64(e.at.millis());
    }

    fn on_carousel(&mut self, e: &CarouselEvent) {
        self.write_u8(TAG_CAROUSEL);
        self.write_u32(e.section);
        self.write_u32(e.selected);
        self.write_u64(e.at.millis());
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// A decoded event from a binary recording.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RecordedEvent {
    /// A [`LifecycleTransitionEvent`].
    Lifecycle(LifecycleTransitionEvent),
    /// An [`ActiveSectionEvent`].
    ActiveSection(ActiveSectionEvent),
    /// A [`ScrollLockEvent`].
    ScrollLock(ScrollLockEvent),
    /// A [`ViewportEvent`].
    Viewport(ViewportEvent),
    /// A [`RotationSignalEvent`].
    Rotation(RotationSignalEvent),
    /// A [`CarouselEvent`].
    Carousel(CarouselEvent),
}

impl RecordedEvent {
    /// Host time the event was recorded at.
    #[must_use]
    pub fn at(&self) -> HostTime {
        match self {
            Self::Lifecycle(e) => e.at,
            Self::ActiveSection(e) => e.at,
            Self::ScrollLock(e) => e.at,
            Self::Viewport(e) => e.at,
            Self::Rotation(e) => e.at,
            Self::Carousel(e) => e.at,
        }
    }
}

/// Decodes a byte slice produced by [`RecorderSink`] into an iterator of
/// [`RecordedEvent`].
///
/// Iteration stops at the first truncated record or unknown tag.
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
        let v = *self.data.get(self.pos)?;
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

    fn read_bool(&mut self) -> Option<bool> {
        Some(self.read_u8()? != 0)
    }

    fn read_time(&mut self) -> Option<HostTime> {
        self.read_u64().map(HostTime)
    }

    fn read_option_u32(&mut self) -> Option<Option<u32>> {
        let present = self.read_bool()?;
        let val = self.read_u32()?;
        Some(present.then_some(val))
    }

    fn read_state(&mut self) -> Option<LifecycleState> {
        Some(match self.read_u8()? {
            0 => LifecycleState::Idle,
            1 => LifecycleState::Entering,
            2 => LifecycleState::Active,
            3 => LifecycleState::Preserving,
            4 => LifecycleState::Cleaned,
            _ => return None,
        })
    }

    fn read_cause(&mut self) -> Option<LifecycleEvent> {
        Some(match self.read_u8()? {
            0 => LifecycleEvent::Shown,
            1 => LifecycleEvent::Hidden,
            2 => LifecycleEvent::EntranceElapsed,
            3 => LifecycleEvent::PreservationElapsed,
            _ => return None,
        })
    }

    fn read_lock_phase(&mut self) -> Option<LockPhase> {
        Some(match self.read_u8()? {
            0 => LockPhase::Engaged,
            1 => LockPhase::Released(LockRelease::Arrived),
            2 => LockPhase::Released(LockRelease::TimedOut),
            3 => LockPhase::Released(LockRelease::Superseded),
            4 => LockPhase::Released(LockRelease::Unreachable),
            _ => return None,
        })
    }

    fn read_mode(&mut self) -> Option<DeviceMode> {
        Some(match self.read_u8()? {
            0 => DeviceMode::Desktop,
            1 => DeviceMode::TabletPortrait,
            2 => DeviceMode::TabletLandscape,
            _ => return None,
        })
    }

    fn decode_lifecycle(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Lifecycle(LifecycleTransitionEvent {
            section: self.read_u32()?,
            from: self.read_state()?,
            to: self.read_state()?,
            cause: self.read_cause()?,
            at: self.read_time()?,
        }))
    }

    fn decode_active_section(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::ActiveSection(ActiveSectionEvent {
            from: self.read_option_u32()?,
            to: self.read_u32()?,
            locked: self.read_bool()?,
            at: self.read_time()?,
        }))
    }

    fn decode_scroll_lock(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::ScrollLock(ScrollLockEvent {
            target: self.read_u32()?,
            phase: self.read_lock_phase()?,
            at: self.read_time()?,
        }))
    }

    fn decode_viewport(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Viewport(ViewportEvent {
            previous: self.read_mode()?,
            mode: self.read_mode()?,
            frozen: self.read_bool()?,
            after_rotation: self.read_bool()?,
            at: self.read_time()?,
        }))
    }

    fn decode_rotation(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Rotation(RotationSignalEvent {
            raised: self.read_bool()?,
            at: self.read_time()?,
        }))
    }

    fn decode_carousel(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Carousel(CarouselEvent {
            section: self.read_u32()?,
            selected: self.read_u32()?,
            at: self.read_time()?,
        }))
    }
}

impl Iterator for DecodeIter<'_> {
    type Item = RecordedEvent;

    fn next(&mut self) -> Option<Self::Item> {
        let tag = self.read_u8()?;
        match tag {
            TAG_LIFECYCLE => self.decode_lifecycle(),
            TAG_ACTIVE_SECTION => self.decode_active_section(),
            TAG_SCROLL_LOCK => self.decode_scroll_lock(),
            TAG_VIEWPORT => self.decode_viewport(),
            TAG_ROTATION => self.decode_rotation(),
            TAG_CAROUSEL => self.decode_carousel(),
            _ => None, // unknown tag → stop iteration
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
