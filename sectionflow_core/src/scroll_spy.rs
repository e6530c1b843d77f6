// Copyright 2026 the Sectionflow Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Active-section tracking with a programmatic-navigation lock.
//!
//! The active section is the last one (in document order) whose top edge is
//! at or above `offset` pixels from the viewport top; if none qualifies, the
//! first measured section. Sections without a measurable element are
//! skipped.
//!
//! Recalculation is frame-gated: a scroll or resize emits one
//! [`Effect::RequestFrame`] and further scrolls are coalesced until
//! [`ScrollSpy::on_frame`] runs.
//!
//! # Lock
//!
//! [`ScrollSpy::navigate_to`] sets the active id to the target immediately
//! and locks it there for the duration of the smooth scroll, so navigation UI
//! jumps straight from origin to destination instead of stepping through
//! every section in between. The lock is released when the computed candidate
//! equals the target, or unconditionally when the safety timer fires. A new
//! navigation replaces the previous lock.
//!
//! While the rotation signal is raised, frames are skipped and the last
//! active id is kept.

use alloc::vec::Vec;
use core::fmt;

use crate::effect::{Effect, Effects, TimerId, TimerKind, TimerSlot};
use crate::id::SectionId;
use crate::signal::{SignalWriter, Watch, signal};
use crate::time::{Duration, HostTime};

/// Tuning for the tracker.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScrollSpyConfig {
    /// Pixel line below the viewport top that a section's top must cross.
    pub offset: f64,
    /// Safety release for the navigation lock.
    pub lock_timeout: Duration,
}

impl ScrollSpyConfig {
    /// Reference tuning: 100px offset, 2s lock timeout.
    #[must_use]
    pub const fn reference() -> Self {
        Self {
            offset: 100.0,
            lock_timeout: Duration(2000),
        }
    }
}

impl Default for ScrollSpyConfig {
    fn default() -> Self {
        Self::reference()
    }
}

/// Reads section positions. Implemented by the host's layout layer.
pub trait SectionProbe {
    /// Returns the top edge of the section's element relative to the viewport
    /// top, or `None` if the section has no element.
    fn section_top(&self, id: &SectionId) -> Option<f64>;
}

/// Computes the active section from measured tops.
///
/// `tops` is in document order.
#[must_use]
pub fn compute_active<'a, I>(tops: I, offset: f64) -> Option<&'a SectionId>
where
    I: IntoIterator<Item = (&'a SectionId, Option<f64>)>,
{
    let mut first = None;
    let mut last_above = None;
    for (id, top) in tops {
        let Some(top) = top else {
            continue;
        };
        first.get_or_insert(id);
        if top <= offset {
            last_above = Some(id);
        }
    }
    last_above.or(first)
}

/// Why a lock ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LockRelease {
    /// The scroll reached the target.
    Arrived,
    /// The safety timer fired first.
    TimedOut,
    /// A newer navigation replaced it.
    Superseded,
    /// The host could not start the scroll (the target has no element).
    Unreachable,
}

/// What a tracker input changed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ScrollSpyUpdate {
    /// The active id changed.
    Changed {
        /// Previous active id.
        from: Option<SectionId>,
        /// New active id.
        to: SectionId,
    },
    /// The lock ended.
    Released {
        /// Lock target.
        target: SectionId,
        /// Why it ended.
        reason: LockRelease,
    },
}

/// Error for navigation to an id the tracker does not know.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnknownSection(pub SectionId);

impl fmt::Display for UnknownSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "no tracked section with id `{}`", self.0)
    }
}

impl core::error::Error for UnknownSection {}

#[derive(Clone, Debug)]
struct ScrollLock {
    target: SectionId,
    engaged_at: HostTime,
}

/// Scroll-spy tracker.
#[derive(Debug)]
pub struct ScrollSpy {
    config: ScrollSpyConfig,
    ids: Vec<SectionId>,
    active: SignalWriter<Option<SectionId>>,
    lock: Option<ScrollLock>,
    lock_timer: TimerSlot,
    frame_requested: bool,
    rotation: Option<Watch<bool>>,
}

impl ScrollSpy {
    /// Creates a tracker over `ids` (document order). The active id starts at
    /// the first id, or `None` if `ids` is empty.
    #[must_use]
    pub fn new(config: ScrollSpyConfig, ids: Vec<SectionId>) -> Self {
        let (active, _) = signal(ids.first().cloned());
        Self {
            config,
            ids,
            active,
            lock: None,
            lock_timer: TimerSlot::new(TimerKind::ScrollLock, 0),
            frame_requested: false,
            rotation: None,
        }
    }

    /// Skips recalculation while `rotation` is raised.
    #[must_use]
    pub fn with_rotation(mut self, rotation: Watch<bool>) -> Self {
        self.rotation = Some(rotation);
        self
    }

    /// Returns the tracked ids.
    #[must_use]
    pub fn ids(&self) -> &[SectionId] {
        &self.ids
    }

    /// Returns the active id.
    #[must_use]
    pub fn active(&self) -> Option<SectionId> {
        self.active.get()
    }

    /// Returns a read handle notified on every active-id change.
    #[must_use]
    pub fn watch(&self) -> Watch<Option<SectionId>> {
        self.active.watch()
    }

    /// Returns the lock target, if locked.
    #[must_use]
    pub fn lock_target(&self) -> Option<&SectionId> {
        self.lock.as_ref().map(|l| &l.target)
    }

    /// Returns when the current lock was engaged.
    #[must_use]
    pub fn lock_engaged_at(&self) -> Option<HostTime> {
        self.lock.as_ref().map(|l| l.engaged_at)
    }

    /// Handles a scroll or resize event.
    pub fn on_scroll(&mut self, effects: &mut Effects) {
        if self.ids.is_empty() || self.frame_requested {
            return;
        }
        self.frame_requested = true;
        effects.push(Effect::RequestFrame);
    }

    /// Recomputes the active id on an animation frame.
    pub fn on_frame(&mut self, probe: &dyn SectionProbe, effects: &mut Effects) -> Option<ScrollSpyUpdate> {
        self.frame_requested = false;
        if self.ids.is_empty() || self.rotation.as_ref().is_some_and(Watch::get) {
            return None;
        }

        let tops: Vec<(&SectionId, Option<f64>)> = self
            .ids
            .iter()
            .map(|id| (id, probe.section_top(id)))
            .collect();
        let candidate = compute_active(tops, self.config.offset)?.clone();

        if let Some(lock) = &self.lock {
            if candidate != lock.target {
                return None;
            }
            let target = lock.target.clone();
            self.lock = None;
            self.lock_timer.cancel(effects);
            self.active.set(Some(target.clone()));
            return Some(ScrollSpyUpdate::Released {
                target,
                reason: LockRelease::Arrived,
            });
        }

        let previous = self.active.get();
        if previous.as_ref() == Some(&candidate) {
            return None;
        }
        self.active.set(Some(candidate.clone()));
        Some(ScrollSpyUpdate::Changed {
            from: previous,
            to: candidate,
        })
    }

    /// Starts programmatic navigation to `target`.
    ///
    /// Returns the update for the active id (if it changed) and, if a previous
    /// lock was replaced, its target.
    pub fn navigate_to(
        &mut self,
        target: &SectionId,
        now: HostTime,
        effects: &mut Effects,
    ) -> Result<NavigateOutcome, UnknownSection> {
        if !self.ids.contains(target) {
            return Err(UnknownSection(target.clone()));
        }

        let superseded = self.lock.take().map(|l| l.target);
        self.lock_timer
            .schedule(now + self.config.lock_timeout, effects);
        self.lock = Some(ScrollLock {
            target: target.clone(),
            engaged_at: now,
        });

        let previous = self.active.get();
        let changed = if previous.as_ref() == Some(target) {
            None
        } else {
            self.active.set(Some(target.clone()));
            Some(ScrollSpyUpdate::Changed {
                from: previous,
                to: target.clone(),
            })
        };

        Ok(NavigateOutcome {
            changed,
            superseded,
        })
    }

    /// Handles a fired timer.
    ///
    /// On a safety release the tracker requests a frame so the active id
    /// resynchronizes with the real scroll position.
    pub fn on_timer(&mut self, id: TimerId, effects: &mut Effects) -> Option<ScrollSpyUpdate> {
        if !self.lock_timer.take_if_current(id) {
            return None;
        }
        let lock = self.lock.take()?;
        self.on_scroll(effects);
        Some(ScrollSpyUpdate::Released {
            target: lock.target,
            reason: LockRelease::TimedOut,
        })
    }

    /// Ends the lock on `target` because the host could not scroll to it.
    ///
    /// Ignored unless `target` is the current lock target. Requests a frame
    /// so the active id follows the real scroll position again.
    pub fn abandon(&mut self, target: &SectionId, effects: &mut Effects) -> Option<ScrollSpyUpdate> {
        if self.lock_target() != Some(target) {
            return None;
        }
        let lock = self.lock.take()?;
        self.lock_timer.cancel(effects);
        self.on_scroll(effects);
        Some(ScrollSpyUpdate::Released {
            target: lock.target,
            reason: LockRelease::Unreachable,
        })
    }

    /// Drops the lock, cancels its timer and drops listeners.
    pub fn teardown(&mut self, effects: &mut Effects) {
        self.lock = None;
        self.lock_timer.cancel(effects);
        self.frame_requested = false;
        self.active.clear_listeners();
    }
}

/// Result of [`ScrollSpy::navigate_to`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NavigateOutcome {
    /// Active-id change caused by the navigation.
    pub changed: Option<ScrollSpyUpdate>,
    /// Target of the lock this navigation replaced.
    pub superseded: Option<SectionId>,
}
