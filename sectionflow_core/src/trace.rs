// Copyright 2026 the Sectionflow Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for the page engine.
//!
//! This module provides a [`TraceSink`] trait with one method per engine
//! event. All method bodies default to no-ops, so implementing only the
//! events you care about is fine.
//!
//! [`Tracer`] wraps an optional `&mut dyn TraceSink`. When the `trace` feature
//! is **off**, every `Tracer` method compiles to nothing (zero overhead). When
//! **on**, each method performs a single `Option` branch before dispatching.
//!
//! Events identify sections by store index, not by [`SectionId`], so they
//! stay `Copy` and cheap to record.
//!
//! [`SectionId`]: crate::id::SectionId

use crate::lifecycle::{LifecycleEvent, LifecycleState};
use crate::scroll_spy::LockRelease;
use crate::time::HostTime;
use crate::viewport::DeviceMode;

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted on every lifecycle transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LifecycleTransitionEvent {
    /// Section index.
    pub section: u32,
    /// State before.
    pub from: LifecycleState,
    /// State after.
    pub to: LifecycleState,
    /// What caused it.
    pub cause: LifecycleEvent,
    /// When it happened.
    pub at: HostTime,
}

/// Emitted when the active section changes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ActiveSectionEvent {
    /// Previous active section, if any.
    pub from: Option<u32>,
    /// New active section.
    pub to: u32,
    /// Whether a navigation lock set it (as opposed to scroll position).
    pub locked: bool,
    /// When it happened.
    pub at: HostTime,
}

/// What happened to the navigation lock.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LockPhase {
    /// A navigation engaged the lock.
    Engaged,
    /// The lock ended.
    Released(LockRelease),
}

/// Emitted when the navigation lock is engaged or released.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScrollLockEvent {
    /// Lock target.
    pub target: u32,
    /// Engaged or released.
    pub phase: LockPhase,
    /// When it happened.
    pub at: HostTime,
}

/// Emitted when the classifier freezes or recomputes the device mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ViewportEvent {
    /// Mode reported before.
    pub previous: DeviceMode,
    /// Mode reported now.
    pub mode: DeviceMode,
    /// `true` when a rotation froze the mode.
    pub frozen: bool,
    /// `true` when this recomputation ended a freeze.
    pub after_rotation: bool,
    /// When it happened.
    pub at: HostTime,
}

/// Emitted when the rotation signal is raised or lowered.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RotationSignalEvent {
    /// New signal value.
    pub raised: bool,
    /// When it happened.
    pub at: HostTime,
}

/// Emitted when a story carousel's selected item changes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CarouselEvent {
    /// Section index.
    pub section: u32,
    /// Newly selected item.
    pub selected: u32,
    /// When it happened.
    pub at: HostTime,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from the page engine.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait TraceSink {
    /// Called on every lifecycle transition.
    fn on_lifecycle_transition(&mut self, e: &LifecycleTransitionEvent) {
        _ = e;
    }

    /// Called when the active section changes.
    fn on_active_section(&mut self, e: &ActiveSectionEvent) {
        _ = e;
    }

    /// Called when the navigation lock is engaged or released.
    fn on_scroll_lock(&mut self, e: &ScrollLockEvent) {
        _ = e;
    }

    /// Called when the viewport mode freezes or is recomputed.
    fn on_viewport(&mut self, e: &ViewportEvent) {
        _ = e;
    }

    /// Called when the rotation signal flips.
    fn on_rotation_signal(&mut self, e: &RotationSignalEvent) {
        _ = e;
    }

    /// Called when a carousel selection changes.
    fn on_carousel(&mut self, e: &CarouselEvent) {
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

macro_rules! dispatch {
    ($self:ident, $method:ident, $e:ident) => {{
        #[cfg(feature = "trace")]
        if let Some(s) = &mut $self.sink {
            s.$method($e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = $e;
        }
    }};
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

    /// Emits a [`LifecycleTransitionEvent`].
    #[inline]
    pub fn lifecycle_transition(&mut self, e: &LifecycleTransitionEvent) {
        dispatch!(self, on_lifecycle_transition, e);
    }

    /// Emits an [`ActiveSectionEvent`].
    #[inline]
    pub fn active_section(&mut self, e: &ActiveSectionEvent) {
        dispatch!(self, on_active_section, e);
    }

    /// Emits a [`ScrollLockEvent`].
    #[inline]
    pub fn scroll_lock(&mut self, e: &ScrollLockEvent) {
        dispatch!(self, on_scroll_lock, e);
    }

    /// Emits a [`ViewportEvent`].
    #[inline]
    pub fn viewport(&mut self, e: &ViewportEvent) {
        dispatch!(self, on_viewport, e);
    }

    /// Emits a [`RotationSignalEvent`].
    #[inline]
    pub fn rotation_signal(&mut self, e: &RotationSignalEvent) {
        dispatch!(self, on_rotation_signal, e);
    }

    /// Emits a [`CarouselEvent`].
    #[inline]
    pub fn carousel(&mut self, e: &CarouselEvent) {
        dispatch!(self, on_carousel, e);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
