// Copyright 2026 the Sectionflow Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Debounce and throttle limiters.
//!
//! Three deadline-driven limiters bound how often a callback runs:
//!
//! - [`Debounce`]: runs once, `delay` after the *last* call. No leading edge.
//! - [`ThrottleLeading`]: runs the first call of a quiet period immediately
//!   and drops calls within `delay` of the last run.
//! - [`ThrottleTrailing`]: like leading, but a dropped call schedules one
//!   trailing run at the boundary carrying the most recent arguments, so the
//!   final call of a burst is never lost.
//!
//! The limiters implement [`Limiter`] and never own a real timer: they emit
//! [`Effect::Schedule`](crate::effect::Effect::Schedule) /
//! [`Effect::Cancel`](crate::effect::Effect::Cancel) and expect the host to
//! call [`Limiter::on_timer`] when the timer fires.
//!
//! [`RateLimited`] pairs a limiter with a replaceable callback so the most
//! recently supplied callback is the one that runs, whichever edge triggers it.
//!
//! Timer-backed limiters tag their timers [`TimerKind::RateLimit`] with a
//! caller-chosen owner. Two limiters whose timers reach the same host must
//! use distinct owners, or each would accept the other's fire. Owners below
//! [`FIRST_CALLER_OWNER`] belong to the engine.

use alloc::boxed::Box;
use core::fmt;
use core::marker::PhantomData;

use crate::effect::{Effects, TimerId, TimerKind, TimerSlot};
use crate::time::{Duration, HostTime};

/// Owner of the viewport's resize debounce.
pub const RESIZE_DEBOUNCE_OWNER: u32 = 0;

/// First owner free for limiters created outside the engine.
pub const FIRST_CALLER_OWNER: u32 = 1;

/// Common interface of the rate limiters.
pub trait Limiter<T> {
    /// Offers a call with `args`. Returns the arguments to run now, if any.
    fn call(&mut self, now: HostTime, args: T, effects: &mut Effects) -> Option<T>;

    /// Handles a fired timer. Returns the arguments to run now, if any.
    fn on_timer(&mut self, id: TimerId, now: HostTime) -> Option<T>;

    /// Drops any pending run and cancels its timer.
    fn cancel(&mut self, effects: &mut Effects);

    /// Returns `true` if a run is scheduled.
    fn is_pending(&self) -> bool;
}

/// Trailing-edge debounce.
#[derive(Debug)]
pub struct Debounce<T> {
    delay: Duration,
    slot: TimerSlot,
    pending: Option<T>,
}

impl<T> Debounce<T> {
    /// Creates a debounce whose timers carry `owner`.
    #[must_use]
    pub const fn new(delay: Duration, owner: u32) -> Self {
        Self {
            delay,
            slot: TimerSlot::new(TimerKind::RateLimit, owner),
            pending: None,
        }
    }

    /// Returns the configured delay.
    #[must_use]
    pub const fn delay(&self) -> Duration {
        self.delay
    }
}

impl<T> Limiter<T> for Debounce<T> {
    fn call(&mut self, now: HostTime, args: T, effects: &mut Effects) -> Option<T> {
        self.pending = Some(args);
        self.slot.schedule(now + self.delay, effects);
        None
    }

    fn on_timer(&mut self, id: TimerId, _now: HostTime) -> Option<T> {
        if self.slot.take_if_current(id) {
            self.pending.take()
        } else {
            None
        }
    }

    fn cancel(&mut self, effects: &mut Effects) {
        self.slot.cancel(effects);
        self.pending = None;
    }

    fn is_pending(&self) -> bool {
        self.slot.is_pending()
    }
}

/// Leading-edge throttle. Calls inside the window are dropped.
pub struct ThrottleLeading<T> {
    delay: Duration,
    last_run: Option<HostTime>,
    _marker: PhantomData<fn(T)>,
}

impl<T> ThrottleLeading<T> {
    /// Creates a leading throttle.
    #[must_use]
    pub const fn new(delay: Duration) -> Self {
        Self {
            delay,
            last_run: None,
            _marker: PhantomData,
        }
    }

    /// Returns the time of the last executed call.
    #[must_use]
    pub const fn last_run(&self) -> Option<HostTime> {
        self.last_run
    }
}

impl<T> fmt::Debug for ThrottleLeading<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThrottleLeading")
            .field("delay", &self.delay)
            .field("last_run", &self.last_run)
            .finish()
    }
}

impl<T> Limiter<T> for ThrottleLeading<T> {
    fn call(&mut self, now: HostTime, args: T, _effects: &mut Effects) -> Option<T> {
        let open = self
            .last_run
            .is_none_or(|last| now.saturating_duration_since(last) >= self.delay);
        if open {
            self.last_run = Some(now);
            Some(args)
        } else {
            None
        }
    }

    fn on_timer(&mut self, _id: TimerId, _now: HostTime) -> Option<T> {
        None
    }

    fn cancel(&mut self, _effects: &mut Effects) {
        self.last_run = None;
    }

    fn is_pending(&self) -> bool {
        false
    }
}

/// Throttle with a guaranteed trailing run.
#[derive(Debug)]
pub struct ThrottleTrailing<T> {
    delay: Duration,
    last_run: Option<HostTime>,
    slot: TimerSlot,
    pending: Option<T>,
}

impl<T> ThrottleTrailing<T> {
    /// Creates a trailing throttle whose timers carry `owner`.
    #[must_use]
    pub const fn new(delay: Duration, owner: u32) -> Self {
        Self {
            delay,
            last_run: None,
            slot: TimerSlot::new(TimerKind::RateLimit, owner),
            pending: None,
        }
    }
}

impl<T> Limiter<T> for ThrottleTrailing<T> {
    fn call(&mut self, now: HostTime, args: T, effects: &mut Effects) -> Option<T> {
        let boundary = self.last_run.map(|last| last + self.delay);
        match boundary {
            Some(at) if now < at => {
                self.pending = Some(args);
                if !self.slot.is_pending() {
                    self.slot.schedule(at, effects);
                }
                None
            }
            _ => {
                // Window is open. A trailing run still queued here means the
                // host fired late; the fresh call supersedes it.
                self.slot.cancel(effects);
                self.pending = None;
                self.last_run = Some(now);
                Some(args)
            }
        }
    }

    fn on_timer(&mut self, id: TimerId, now: HostTime) -> Option<T> {
        if !self.slot.take_if_current(id) {
            return None;
        }
        let args = self.pending.take()?;
        self.last_run = Some(now);
        Some(args)
    }

    fn cancel(&mut self, effects: &mut Effects) {
        self.slot.cancel(effects);
        self.pending = None;
    }

    fn is_pending(&self) -> bool {
        self.slot.is_pending()
    }
}

/// A limiter bound to a callback.
///
/// The callback can be replaced at any time with
/// [`set_callback`](Self::set_callback); runs triggered after the
/// replacement (including already-scheduled trailing runs) use the new one.
pub struct RateLimited<T, L, F = Box<dyn FnMut(T)>> {
    limiter: L,
    callback: F,
    _marker: PhantomData<fn(T)>,
}

impl<T, L: Limiter<T>, F: FnMut(T)> RateLimited<T, L, F> {
    /// Binds `limiter` to `callback`.
    #[must_use]
    pub fn new(limiter: L, callback: F) -> Self {
        Self {
            limiter,
            callback,
            _marker: PhantomData,
        }
    }

    /// Offers a call. Returns `true` if the callback ran synchronously.
    pub fn call(&mut self, now: HostTime, args: T, effects: &mut Effects) -> bool {
        match self.limiter.call(now, args, effects) {
            Some(args) => {
                (self.callback)(args);
                true
            }
            None => false,
        }
    }

    /// Handles a fired timer. Returns `true` if the callback ran.
    pub fn on_timer(&mut self, id: TimerId, now: HostTime) -> bool {
        match self.limiter.on_timer(id, now) {
            Some(args) => {
                (self.callback)(args);
                true
            }
            None => false,
        }
    }

    /// Replaces the callback.
    pub fn set_callback(&mut self, callback: F) {
        self.callback = callback;
    }

    /// Drops any pending run.
    pub fn cancel(&mut self, effects: &mut Effects) {
        self.limiter.cancel(effects);
    }

    /// Returns `true` if a run is scheduled.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.limiter.is_pending()
    }

    /// Returns the underlying limiter.
    #[must_use]
    pub fn limiter(&self) -> &L {
        &self.limiter
    }
}

impl<T, L: fmt::Debug, F> fmt::Debug for RateLimited<T, L, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RateLimited")
            .field("limiter", &self.limiter)
            .finish_non_exhaustive()
    }
}

/// Wraps `callback` in a trailing-edge debounce whose timers carry `owner`.
#[must_use]
pub fn debounce<T, F: FnMut(T)>(
    delay: Duration,
    owner: u32,
    callback: F,
) -> RateLimited<T, Debounce<T>, F> {
    RateLimited::new(Debounce::new(delay, owner), callback)
}

/// Wraps `callback` in a leading-edge throttle.
#[must_use]
pub fn throttle_leading<T, F: FnMut(T)>(
    delay: Duration,
    callback: F,
) -> RateLimited<T, ThrottleLeading<T>, F> {
    RateLimited::new(ThrottleLeading::new(delay), callback)
}

/// Wraps `callback` in a throttle with a trailing run whose timers carry
/// `owner`.
#[must_use]
pub fn throttle_trailing<T, F: FnMut(T)>(
    delay: Duration,
    owner: u32,
    callback: F,
) -> RateLimited<T, ThrottleTrailing<T>, F> {
    RateLimited::new(ThrottleTrailing::new(delay, owner), callback)
}

#[cfg(test)]
mod tests {
    use alloc::rc::Rc;
    use alloc::vec::Vec;
    use core::cell::RefCell;

    use super::*;
    use crate::effect::Effect;

    /// Returns the most recently scheduled timer still outstanding.
    fn last_scheduled(fx: &Effects) -> Option<(TimerId, HostTime)> {
        let mut live: Vec<(TimerId, HostTime)> = Vec::new();
        for effect in fx.as_slice() {
            match effect {
                Effect::Schedule { id, at } => live.push((*id, *at)),
                Effect::Cancel { id } => live.retain(|(l, _)| l != id),
                _ => {}
            }
        }
        live.last().copied()
    }

    fn recorder() -> (Rc<RefCell<Vec<u32>>>, impl FnMut(u32)) {
        let runs = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&runs);
        (runs, move |v| sink.borrow_mut().push(v))
    }

    #[test]
    fn debounce_collapses_burst_to_last_args() {
        let (runs, cb) = recorder();
        let mut d = debounce(Duration(100), FIRST_CALLER_OWNER, cb);
        let mut fx = Effects::new();

        for (i, t) in [(0_u32, 0_u64), (1, 30), (2, 60), (3, 90)] {
            assert!(!d.call(HostTime(t), i, &mut fx), "no leading edge");
        }
        let (id, at) = last_scheduled(&fx).unwrap();
        assert_eq!(at, HostTime(190), "deadline follows the last call");

        assert!(d.on_timer(id, at));
        assert_eq!(*runs.borrow(), [3]);
        assert!(!d.is_pending());
    }

    #[test]
    fn debounce_ignores_superseded_timer() {
        let (runs, cb) = recorder();
        let mut d = debounce(Duration(50), FIRST_CALLER_OWNER, cb);
        let mut fx = Effects::new();

        d.call(HostTime(0), 1, &mut fx);
        let (stale, _) = last_scheduled(&fx).unwrap();
        d.call(HostTime(10), 2, &mut fx);

        assert!(!d.on_timer(stale, HostTime(50)));
        assert!(runs.borrow().is_empty());
    }

    #[test]
    fn debounce_cancel_drops_pending_run() {
        let (runs, cb) = recorder();
        let mut d = debounce(Duration(50), FIRST_CALLER_OWNER, cb);
        let mut fx = Effects::new();

        d.call(HostTime(0), 1, &mut fx);
        let (id, _) = last_scheduled(&fx).unwrap();
        d.cancel(&mut fx);

        assert!(last_scheduled(&fx).is_none(), "cancel emits a Cancel effect");
        assert!(!d.on_timer(id, HostTime(50)));
        assert!(runs.borrow().is_empty());
    }

    #[test]
    fn limiters_with_distinct_owners_ignore_each_others_timers() {
        let (fast_runs, fast_cb) = recorder();
        let (slow_runs, slow_cb) = recorder();
        let mut fast = debounce(Duration(100), FIRST_CALLER_OWNER, fast_cb);
        let mut slow = debounce(Duration(300), FIRST_CALLER_OWNER + 1, slow_cb);
        let mut fx = Effects::new();

        fast.call(HostTime(0), 1, &mut fx);
        let (fast_id, fast_at) = last_scheduled(&fx).unwrap();
        slow.call(HostTime(0), 2, &mut fx);
        let (slow_id, slow_at) = last_scheduled(&fx).unwrap();
        assert_ne!(fast_id, slow_id, "timer ids must not collide across limiters");

        assert!(!slow.on_timer(fast_id, fast_at), "foreign fire must be inert");
        assert!(slow_runs.borrow().is_empty());
        assert!(slow.is_pending(), "slow debounce still waits for its own deadline");

        assert!(fast.on_timer(fast_id, fast_at));
        assert!(slow.on_timer(slow_id, slow_at));
        assert_eq!(*fast_runs.borrow(), [1]);
        assert_eq!(*slow_runs.borrow(), [2]);
        assert_eq!(slow_at, HostTime(300));
    }

    #[test]
    fn leading_throttle_runs_first_and_drops_rest() {
        let (runs, cb) = recorder();
        let mut t = throttle_leading(Duration(100), cb);
        let mut fx = Effects::new();

        assert!(t.call(HostTime(0), 1, &mut fx));
        assert!(!t.call(HostTime(50), 2, &mut fx));
        assert!(!t.call(HostTime(99), 3, &mut fx));
        assert!(t.call(HostTime(100), 4, &mut fx));

        assert_eq!(*runs.borrow(), [1, 4]);
        assert!(fx.is_empty(), "leading throttle never schedules timers");
    }

    #[test]
    fn trailing_throttle_schedules_one_boundary_run() {
        let (runs, cb) = recorder();
        let mut t = throttle_trailing(Duration(100), FIRST_CALLER_OWNER, cb);
        let mut fx = Effects::new();

        assert!(t.call(HostTime(0), 1, &mut fx));
        t.call(HostTime(20), 2, &mut fx);
        t.call(HostTime(40), 3, &mut fx);

        let schedules = fx
            .as_slice()
            .iter()
            .filter(|e| matches!(e, Effect::Schedule { .. }))
            .count();
        assert_eq!(schedules, 1, "exactly one trailing run is scheduled");

        let (id, at) = last_scheduled(&fx).unwrap();
        assert_eq!(at, HostTime(100));
        assert!(t.on_timer(id, at));
        assert_eq!(*runs.borrow(), [1, 3], "trailing run carries latest args");
    }

    #[test]
    fn trailing_throttle_continuous_stream() {
        // Calls every 10ms for 5 windows of 100ms: at least 5 runs, and the
        // final call's arguments are applied.
        let (runs, cb) = recorder();
        let mut t = throttle_trailing(Duration(100), FIRST_CALLER_OWNER, cb);
        let mut fx = Effects::new();

        let mut next_timer: Option<(TimerId, HostTime)> = None;
        for step in 0..=50_u32 {
            let now = HostTime(u64::from(step) * 10);
            if let Some((id, at)) = next_timer
                && at <= now
            {
                t.on_timer(id, at);
                next_timer = None;
            }
            fx.clear();
            t.call(now, step, &mut fx);
            if let Some(timer) = last_scheduled(&fx) {
                next_timer = Some(timer);
            }
        }
        if let Some((id, at)) = next_timer {
            t.on_timer(id, at);
        }

        let runs = runs.borrow();
        assert!(runs.len() >= 5, "got {} runs", runs.len());
        assert_eq!(runs.last(), Some(&50), "final arguments must be applied");
    }

    #[test]
    fn replaced_callback_runs_for_scheduled_trailing_call() {
        let (old_runs, old_cb) = recorder();
        let (new_runs, new_cb) = recorder();
        let mut t: RateLimited<u32, ThrottleTrailing<u32>> =
            RateLimited::new(ThrottleTrailing::new(Duration(100), FIRST_CALLER_OWNER), Box::new(old_cb));
        let mut fx = Effects::new();

        t.call(HostTime(0), 1, &mut fx);
        t.call(HostTime(10), 2, &mut fx);
        t.set_callback(Box::new(new_cb));
        let (id, at) = last_scheduled(&fx).unwrap();
        t.on_timer(id, at);

        assert_eq!(*old_runs.borrow(), [1]);
        assert_eq!(*new_runs.borrow(), [2], "latest callback reference is used");
    }
}
