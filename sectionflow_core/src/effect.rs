// Copyright 2026 the Sectionflow Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Side effects requested by the state machines, and the timer slots that
//! produce them.
//!
//! No machine in this crate owns a real timer. A transition pushes
//! [`Effect`]s into an [`Effects`] buffer; the host (the web backend or the
//! simulator) executes them and later calls back with the [`TimerId`] that
//! fired or with a frame callback.
//!
//! # Timer discipline
//!
//! Each logical timer lives in a [`TimerSlot`]. Scheduling a slot that
//! already has a pending timer first emits [`Effect::Cancel`] for the old one,
//! so at most one timer per slot is ever outstanding. Every [`TimerId`] also
//! carries a generation: [`TimerSlot::take_if_current`] accepts only the id
//! that is currently pending, so a fire that races a cancellation is inert.

use alloc::vec::Vec;

use crate::id::SectionId;
use crate::time::HostTime;

/// Which logical timer a [`TimerId`] belongs to.
///
/// Hosts use this to route a fired timer back to its owning machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TimerKind {
    /// Section entrance ceremony; owner is the section index.
    Entrance,
    /// Section preservation window; owner is the section index.
    Preservation,
    /// Scroll-spy lock safety release.
    ScrollLock,
    /// Rotation signal quiet period.
    RotationQuiet,
    /// Viewport re-check after a rotation settle window.
    RotationSettle,
    /// Viewport re-poll while the rotation signal stays raised.
    RotationPoll,
    /// A debounce/throttle limiter; owner is chosen by whoever creates it.
    ///
    /// The engine's own limiters use owners below
    /// [`FIRST_CALLER_OWNER`](crate::rate_limit::FIRST_CALLER_OWNER).
    RateLimit,
}

/// Identifies one scheduled timer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerId {
    /// Which logical timer this is.
    pub kind: TimerKind,
    /// Owner index within the kind (section index, limiter index, or 0).
    pub owner: u32,
    /// Generation within the owning slot.
    pub generation: u32,
}

/// A side effect the host must perform.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Effect {
    /// Call back with `id` at (or as soon as possible after) `at`.
    Schedule {
        /// Timer to fire.
        id: TimerId,
        /// Deadline.
        at: HostTime,
    },
    /// Drop a previously scheduled timer.
    Cancel {
        /// Timer to drop.
        id: TimerId,
    },
    /// Call back on the next animation frame.
    RequestFrame,
    /// Smoothly scroll the given section into view.
    ScrollTo {
        /// Destination section.
        id: SectionId,
    },
    /// Replace the address fragment with the given section id.
    SetFragment {
        /// Destination section.
        id: SectionId,
    },
}

/// Ordered buffer of [`Effect`]s produced by one or more transitions.
#[derive(Clone, Debug, Default)]
pub struct Effects {
    items: Vec<Effect>,
}

impl Effects {
    /// Creates an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an effect.
    pub fn push(&mut self, effect: Effect) {
        self.items.push(effect);
    }

    /// Returns the buffered effects in order.
    #[must_use]
    pub fn as_slice(&self) -> &[Effect] {
        &self.items
    }

    /// Returns `true` if nothing is buffered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns the number of buffered effects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Removes and returns all buffered effects in order.
    pub fn drain(&mut self) -> alloc::vec::Drain<'_, Effect> {
        self.items.drain(..)
    }

    /// Discards all buffered effects.
    pub fn clear(&mut self) {
        self.items.clear();
    }
}

/// A single logical timer with clear-before-schedule semantics.
#[derive(Clone, Debug)]
pub struct TimerSlot {
    kind: TimerKind,
    owner: u32,
    generation: u32,
    pending: Option<(TimerId, HostTime)>,
}

impl TimerSlot {
    /// Creates an idle slot.
    #[must_use]
    pub const fn new(kind: TimerKind, owner: u32) -> Self {
        Self {
            kind,
            owner,
            generation: 0,
            pending: None,
        }
    }

    /// Schedules the slot to fire at `at`, cancelling any pending timer first.
    pub fn schedule(&mut self, at: HostTime, effects: &mut Effects) -> TimerId {
        self.cancel(effects);
        self.generation = self.generation.wrapping_add(1);
        let id = TimerId {
            kind: self.kind,
            owner: self.owner,
            generation: self.generation,
        };
        self.pending = Some((id, at));
        effects.push(Effect::Schedule { id, at });
        id
    }

    /// Cancels the pending timer, if any. Returns `true` if one was pending.
    pub fn cancel(&mut self, effects: &mut Effects) -> bool {
        match self.pending.take() {
            Some((id, _)) => {
                effects.push(Effect::Cancel { id });
                true
            }
            None => false,
        }
    }

    /// Consumes a fired timer.
    ///
    /// Returns `true` (and clears the slot) only if `id` is the timer that is
    /// currently pending; stale or foreign ids return `false`.
    pub fn take_if_current(&mut self, id: TimerId) -> bool {
        match self.pending {
            Some((pending, _)) if pending == id => {
                self.pending = None;
                true
            }
            _ => false,
        }
    }

    /// Returns `true` if a timer is outstanding.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Returns the deadline of the outstanding timer.
    #[must_use]
    pub fn deadline(&self) -> Option<HostTime> {
        self.pending.map(|(_, at)| at)
    }

    /// Returns the id of the outstanding timer.
    #[must_use]
    pub fn pending_id(&self) -> Option<TimerId> {
        self.pending.map(|(id, _)| id)
    }
}
