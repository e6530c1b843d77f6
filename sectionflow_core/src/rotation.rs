// Copyright 2026 the Sectionflow Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Rotation-in-progress signal.
//!
//! [`RotationTracker`] is the single owner of the page's "a rotation is in
//! flight" condition. An `orientationchange` event raises it; while raised,
//! every resize re-arms a quiet timer of [`settle_window`]; when the quiet
//! timer fires the signal drops.
//!
//! Other machines receive a read-only [`Watch<bool>`] and check it
//! synchronously before honoring new input.
//!
//! [`settle_window`]: crate::viewport::ViewportConfig::settle_window

use crate::effect::{Effects, TimerId, TimerKind, TimerSlot};
use crate::signal::{SignalWriter, Watch, signal};
use crate::time::{Duration, HostTime};

/// Owner of the rotation signal.
#[derive(Debug)]
pub struct RotationTracker {
    signal: SignalWriter<bool>,
    quiet: TimerSlot,
    settle_window: Duration,
}

impl RotationTracker {
    /// Creates a tracker with the signal lowered.
    #[must_use]
    pub fn new(settle_window: Duration) -> Self {
        let (signal, _) = signal(false);
        Self {
            signal,
            quiet: TimerSlot::new(TimerKind::RotationQuiet, 0),
            settle_window,
        }
    }

    /// Returns a read handle to the signal.
    #[must_use]
    pub fn watch(&self) -> Watch<bool> {
        self.signal.watch()
    }

    /// Returns `true` while a rotation is in flight.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.signal.get()
    }

    /// Handles an `orientationchange` event. Returns `true` if this raised the
    /// signal (it was previously lowered).
    pub fn on_orientation_change(&mut self, now: HostTime, effects: &mut Effects) -> bool {
        let raised = self.signal.set(true);
        self.quiet.schedule(now + self.settle_window, effects);
        raised
    }

    /// Handles a resize event. Extends the quiet period while raised.
    pub fn on_resize(&mut self, now: HostTime, effects: &mut Effects) {
        if self.signal.get() {
            self.quiet.schedule(now + self.settle_window, effects);
        }
    }

    /// Handles a fired timer. Returns `true` if this lowered the signal.
    pub fn on_timer(&mut self, id: TimerId) -> bool {
        if self.quiet.take_if_current(id) {
            self.signal.set(false)
        } else {
            false
        }
    }

    /// Cancels the quiet timer, lowers the signal and drops listeners.
    pub fn teardown(&mut self, effects: &mut Effects) {
        self.quiet.cancel(effects);
        self.signal.set(false);
        self.signal.clear_listeners();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effect::Effect;

    fn pending(fx: &Effects) -> Option<(TimerId, HostTime)> {
        fx.as_slice().iter().rev().find_map(|e| match e {
            Effect::Schedule { id, at } => Some((*id, *at)),
            _ => None,
        })
    }

    #[test]
    fn orientation_change_raises_until_quiet() {
        let mut fx = Effects::new();
        let mut r = RotationTracker::new(Duration(400));
        let watch = r.watch();

        assert!(r.on_orientation_change(HostTime(0), &mut fx));
        assert!(watch.get());

        r.on_resize(HostTime(150), &mut fx);
        let (id, at) = pending(&fx).unwrap();
        assert_eq!(at, HostTime(550), "resize while raised extends the quiet period");

        assert!(r.on_timer(id));
        assert!(!watch.get());
    }

    #[test]
    fn plain_resize_does_not_raise() {
        let mut fx = Effects::new();
        let mut r = RotationTracker::new(Duration(400));
        r.on_resize(HostTime(10), &mut fx);
        assert!(!r.is_active());
        assert!(fx.is_empty());
    }

    #[test]
    fn superseded_quiet_timer_is_inert() {
        let mut fx = Effects::new();
        let mut r = RotationTracker::new(Duration(400));
        r.on_orientation_change(HostTime(0), &mut fx);
        let (stale, _) = pending(&fx).unwrap();
        r.on_resize(HostTime(100), &mut fx);

        assert!(!r.on_timer(stale));
        assert!(r.is_active(), "signal stays raised until the latest quiet timer");
    }
}
