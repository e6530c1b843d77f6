// Copyright 2026 the Sectionflow Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-section lifecycle state machine.
//!
//! A section's raw "is intersecting the viewport" boolean is turned into a
//! staged lifecycle that the visual layer uses to sequence its entrance
//! animation and to gate media decode:
//!
//! ```text
//!            shown                 entrance elapsed
//!   Idle ─────────────► Entering ────────────────────► Active
//!     ▲                  │   ▲                          │
//!     │            hidden│   │shown (entrance          │hidden
//!     │                  ▼   │ not complete)            ▼
//!     │                 Preserving ◄─────────────────────┘
//!     │                  │   │
//!     │ (re-entry)       │   └──shown (entrance complete)──► Active
//!   Cleaned ◄────────────┘
//!         preservation elapsed
//! ```
//!
//! `Cleaned` re-enters through `Entering` on the next `shown`, exactly like
//! `Idle`.
//!
//! [`transition`] is the complete, pure edge table. [`SectionLifecycle`] is a
//! thin stateful shell around it that owns the entrance and preservation
//! timers. Every transition cancels the timer it supersedes before scheduling
//! a new one, so no timer can fire into a state it was not scheduled for.

use crate::effect::{Effects, TimerId, TimerKind, TimerSlot};
use crate::time::{Duration, HostTime};

/// Lifecycle state of one section.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum LifecycleState {
    /// Never shown, resources dormant.
    #[default]
    Idle,
    /// Entrance ceremony running.
    Entering,
    /// Settled and visible.
    Active,
    /// Out of view, visuals kept in their last state.
    Preserving,
    /// Torn down after the preservation window.
    Cleaned,
}

impl LifecycleState {
    /// All states, for exhaustive checks.
    pub const ALL: [Self; 5] = [
        Self::Idle,
        Self::Entering,
        Self::Active,
        Self::Preserving,
        Self::Cleaned,
    ];

    /// `Entering` or `Active`: the section is driving visible output.
    #[must_use]
    pub const fn is_live(self) -> bool {
        matches!(self, Self::Entering | Self::Active)
    }

    /// Returns a short label for diagnostics and DOM attributes.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Entering => "entering",
            Self::Active => "active",
            Self::Preserving => "preserving",
            Self::Cleaned => "cleaned",
        }
    }
}

/// Inputs to the lifecycle edge table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LifecycleEvent {
    /// Visibility became true.
    Shown,
    /// Visibility became false.
    Hidden,
    /// The entrance timer elapsed.
    EntranceElapsed,
    /// The preservation timer elapsed.
    PreservationElapsed,
}

impl LifecycleEvent {
    /// All events, for exhaustive checks.
    pub const ALL: [Self; 4] = [
        Self::Shown,
        Self::Hidden,
        Self::EntranceElapsed,
        Self::PreservationElapsed,
    ];

    /// Returns a short label for diagnostics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Shown => "shown",
            Self::Hidden => "hidden",
            Self::EntranceElapsed => "entrance-elapsed",
            Self::PreservationElapsed => "preservation-elapsed",
        }
    }
}

/// Returns the state reached from `state` on `event`, or `None` if the event
/// does not move the machine.
///
/// `entrance_complete` only matters for `Preserving` + `Shown`.
#[must_use]
pub const fn transition(
    state: LifecycleState,
    event: LifecycleEvent,
    entrance_complete: bool,
) -> Option<LifecycleState> {
    use LifecycleEvent as E;
    use LifecycleState as S;
    match (state, event) {
        (S::Idle | S::Cleaned, E::Shown) => Some(S::Entering),
        (S::Entering, E::EntranceElapsed) => Some(S::Active),
        (S::Entering | S::Active, E::Hidden) => Some(S::Preserving),
        (S::Preserving, E::PreservationElapsed) => Some(S::Cleaned),
        (S::Preserving, E::Shown) => {
            if entrance_complete {
                Some(S::Active)
            } else {
                Some(S::Entering)
            }
        }
        _ => None,
    }
}

/// A state change produced by [`SectionLifecycle`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Transition {
    /// State before.
    pub from: LifecycleState,
    /// State after.
    pub to: LifecycleState,
    /// Event that caused it.
    pub event: LifecycleEvent,
}

/// Timer durations for the lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LifecycleConfig {
    /// Length of the entrance ceremony.
    pub entrance: Duration,
    /// Length of the preservation window.
    pub preservation: Duration,
}

impl LifecycleConfig {
    /// Reference tuning: 4s entrance, 4s preservation.
    #[must_use]
    pub const fn reference() -> Self {
        Self {
            entrance: Duration(4000),
            preservation: Duration(4000),
        }
    }
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self::reference()
    }
}

/// What the rendering layer reads for one section.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LifecycleOutput {
    /// Current state.
    pub state: LifecycleState,
    /// `true` only in `Entering`.
    pub should_animate: bool,
    /// `true` only in `Active`.
    pub is_active: bool,
    /// `true` only in `Preserving`.
    pub is_preserved: bool,
}

/// Lifecycle controller for one section.
#[derive(Clone, Debug)]
pub struct SectionLifecycle {
    config: LifecycleConfig,
    state: LifecycleState,
    visible: bool,
    entrance_complete: bool,
    entrance: TimerSlot,
    preservation: TimerSlot,
}

impl SectionLifecycle {
    /// Creates an idle controller whose timers carry `owner` (the section
    /// index).
    #[must_use]
    pub const fn new(config: LifecycleConfig, owner: u32) -> Self {
        Self {
            config,
            state: LifecycleState::Idle,
            visible: false,
            entrance_complete: false,
            entrance: TimerSlot::new(TimerKind::Entrance, owner),
            preservation: TimerSlot::new(TimerKind::Preservation, owner),
        }
    }

    /// Returns the current state.
    #[must_use]
    pub const fn state(&self) -> LifecycleState {
        self.state
    }

    /// Returns `true` once the entrance timer has fully elapsed (cleared on
    /// re-entry from `Idle`/`Cleaned`).
    #[must_use]
    pub const fn entrance_complete(&self) -> bool {
        self.entrance_complete
    }

    /// Returns the last visibility signal.
    #[must_use]
    pub const fn is_visible(&self) -> bool {
        self.visible
    }

    /// Returns the rendering-layer view of the state.
    #[must_use]
    pub const fn output(&self) -> LifecycleOutput {
        LifecycleOutput {
            state: self.state,
            should_animate: matches!(self.state, LifecycleState::Entering),
            is_active: matches!(self.state, LifecycleState::Active),
            is_preserved: matches!(self.state, LifecycleState::Preserving),
        }
    }

    /// Returns the deadline of whichever lifecycle timer is pending.
    #[must_use]
    pub fn next_deadline(&self) -> Option<HostTime> {
        self.entrance.deadline().or(self.preservation.deadline())
    }

    /// Feeds the visibility signal. Repeated values are ignored.
    pub fn set_visible(
        &mut self,
        visible: bool,
        now: HostTime,
        effects: &mut Effects,
    ) -> Option<Transition> {
        if visible == self.visible {
            return None;
        }
        self.visible = visible;
        let event = if visible {
            LifecycleEvent::Shown
        } else {
            LifecycleEvent::Hidden
        };
        self.apply(event, now, effects)
    }

    /// Handles a fired timer. Ids that are not this section's pending timer
    /// are ignored.
    pub fn on_timer(
        &mut self,
        id: TimerId,
        now: HostTime,
        effects: &mut Effects,
    ) -> Option<Transition> {
        if self.entrance.take_if_current(id) {
            self.apply(LifecycleEvent::EntranceElapsed, now, effects)
        } else if self.preservation.take_if_current(id) {
            self.apply(LifecycleEvent::PreservationElapsed, now, effects)
        } else {
            None
        }
    }

    /// Cancels every pending timer. The state is left as is.
    pub fn unmount(&mut self, effects: &mut Effects) {
        self.entrance.cancel(effects);
        self.preservation.cancel(effects);
    }

    fn apply(
        &mut self,
        event: LifecycleEvent,
        now: HostTime,
        effects: &mut Effects,
    ) -> Option<Transition> {
        let from = self.state;
        let to = transition(from, event, self.entrance_complete)?;

        match to {
            LifecycleState::Entering => {
                self.preservation.cancel(effects);
                if matches!(from, LifecycleState::Idle | LifecycleState::Cleaned) {
                    self.entrance_complete = false;
                }
                self.entrance
                    .schedule(now + self.config.entrance, effects);
            }
            LifecycleState::Active => {
                self.preservation.cancel(effects);
                self.entrance.cancel(effects);
                if from == LifecycleState::Entering {
                    self.entrance_complete = true;
                }
            }
            LifecycleState::Preserving => {
                self.entrance.cancel(effects);
                self.preservation
                    .schedule(now + self.config.preservation, effects);
            }
            LifecycleState::Cleaned => {
                self.entrance.cancel(effects);
                self.preservation.cancel(effects);
                self.entrance_complete = false;
            }
            LifecycleState::Idle => {}
        }

        self.state = to;
        Some(Transition { from, to, event })
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec::Vec;

    use super::*;
    use crate::effect::Effect;

    /// Minimal fake clock: tracks outstanding timers from effects.
    #[derive(Default)]
    struct Timers {
        live: Vec<(TimerId, HostTime)>,
    }

    impl Timers {
        fn absorb(&mut self, fx: &mut Effects) {
            for effect in fx.drain() {
                match effect {
                    Effect::Schedule { id, at } => self.live.push((id, at)),
                    Effect::Cancel { id } => self.live.retain(|(l, _)| *l != id),
                    _ => {}
                }
            }
        }

        /// Fires every timer due at or before `now`, in deadline order.
        fn advance(&mut self, s: &mut SectionLifecycle, now: HostTime) {
            loop {
                self.live.sort_by_key(|(_, at)| *at);
                let Some(&(id, at)) = self.live.first() else {
                    return;
                };
                if at > now {
                    return;
                }
                self.live.remove(0);
                let mut fx = Effects::new();
                s.on_timer(id, at, &mut fx);
                self.absorb(&mut fx);
            }
        }
    }

    fn section() -> (SectionLifecycle, Timers) {
        (
            SectionLifecycle::new(LifecycleConfig::reference(), 0),
            Timers::default(),
        )
    }

    fn show(s: &mut SectionLifecycle, t: &mut Timers, visible: bool, now: u64) {
        t.advance(s, HostTime(now));
        let mut fx = Effects::new();
        s.set_visible(visible, HostTime(now), &mut fx);
        t.absorb(&mut fx);
    }

    #[test]
    fn edge_table_is_exactly_the_documented_edges() {
        use LifecycleEvent as E;
        use LifecycleState as S;
        let expected: &[(S, E, bool, S)] = &[
            (S::Idle, E::Shown, false, S::Entering),
            (S::Idle, E::Shown, true, S::Entering),
            (S::Cleaned, E::Shown, false, S::Entering),
            (S::Cleaned, E::Shown, true, S::Entering),
            (S::Entering, E::EntranceElapsed, false, S::Active),
            (S::Entering, E::EntranceElapsed, true, S::Active),
            (S::Entering, E::Hidden, false, S::Preserving),
            (S::Entering, E::Hidden, true, S::Preserving),
            (S::Active, E::Hidden, false, S::Preserving),
            (S::Active, E::Hidden, true, S::Preserving),
            (S::Preserving, E::PreservationElapsed, false, S::Cleaned),
            (S::Preserving, E::PreservationElapsed, true, S::Cleaned),
            (S::Preserving, E::Shown, false, S::Entering),
            (S::Preserving, E::Shown, true, S::Active),
        ];

        let mut reachable = 0;
        for state in S::ALL {
            for event in E::ALL {
                for complete in [false, true] {
                    let got = transition(state, event, complete);
                    let want = expected
                        .iter()
                        .find(|(s, e, c, _)| *s == state && *e == event && *c == complete)
                        .map(|(_, _, _, to)| *to);
                    assert_eq!(got, want, "{state:?} on {event:?} (complete={complete})");
                    reachable += usize::from(got.is_some());
                }
            }
        }
        assert_eq!(reachable, expected.len());
    }

    #[test]
    fn entrance_completes_after_configured_duration() {
        let (mut s, mut t) = section();
        show(&mut s, &mut t, true, 0);
        assert!(s.output().should_animate);

        t.advance(&mut s, HostTime(3999));
        assert_eq!(s.state(), LifecycleState::Entering);
        t.advance(&mut s, HostTime(4000));
        assert!(s.output().is_active);
        assert!(s.entrance_complete());
    }

    #[test]
    fn return_within_preservation_resumes_active() {
        let (mut s, mut t) = section();
        show(&mut s, &mut t, true, 0);
        show(&mut s, &mut t, false, 5000);
        assert!(s.output().is_preserved);

        let mut fx = Effects::new();
        let tr = s.set_visible(true, HostTime(6000), &mut fx);
        assert_eq!(
            tr.map(|tr| tr.to),
            Some(LifecycleState::Active),
            "no second entrance ceremony"
        );
        assert!(
            !fx.as_slice()
                .iter()
                .any(|e| matches!(e, Effect::Schedule { id, .. } if id.kind == TimerKind::Entrance)),
            "entrance timer must not restart"
        );
        t.absorb(&mut fx);
        assert!(t.live.is_empty(), "preservation timer was cancelled");
    }

    #[test]
    fn interrupted_entrance_restarts_from_latest_show() {
        let (mut s, mut t) = section();
        show(&mut s, &mut t, true, 0);
        show(&mut s, &mut t, false, 1500);
        show(&mut s, &mut t, true, 2500);
        assert_eq!(s.state(), LifecycleState::Entering);

        t.advance(&mut s, HostTime(2500 + 3999));
        assert_eq!(s.state(), LifecycleState::Entering, "old timer must not fire");
        t.advance(&mut s, HostTime(2500 + 4000));
        assert_eq!(s.state(), LifecycleState::Active);
    }

    #[test]
    fn preservation_elapses_into_cleaned() {
        let (mut s, mut t) = section();
        show(&mut s, &mut t, true, 0);
        show(&mut s, &mut t, false, 4001);

        t.advance(&mut s, HostTime(4000 + 3999));
        assert!(s.output().is_preserved);
        t.advance(&mut s, HostTime(4000 + 4001));
        assert_eq!(s.state(), LifecycleState::Cleaned);
        assert!(!s.entrance_complete(), "cleanup resets the entrance flag");
    }

    #[test]
    fn cleaned_section_reenters_from_scratch() {
        let (mut s, mut t) = section();
        show(&mut s, &mut t, true, 0);
        show(&mut s, &mut t, false, 4500);
        t.advance(&mut s, HostTime(9000));
        assert_eq!(s.state(), LifecycleState::Cleaned);

        show(&mut s, &mut t, true, 10_000);
        assert_eq!(s.state(), LifecycleState::Entering);
        t.advance(&mut s, HostTime(14_000));
        assert_eq!(s.state(), LifecycleState::Active);
    }

    #[test]
    fn repeated_visibility_is_ignored() {
        let (mut s, mut t) = section();
        show(&mut s, &mut t, true, 0);
        let mut fx = Effects::new();
        assert_eq!(s.set_visible(true, HostTime(100), &mut fx), None);
        assert!(fx.is_empty(), "duplicate signal must not restart the entrance");
        assert_eq!(s.next_deadline(), Some(HostTime(4000)));
    }

    #[test]
    fn unmount_cancels_everything() {
        let (mut s, mut t) = section();
        show(&mut s, &mut t, true, 0);
        let mut fx = Effects::new();
        s.unmount(&mut fx);
        t.absorb(&mut fx);
        assert!(t.live.is_empty());
        assert_eq!(s.next_deadline(), None);
    }

    #[test]
    fn foreign_timer_ids_are_ignored() {
        let mut a = SectionLifecycle::new(LifecycleConfig::reference(), 0);
        let mut b = SectionLifecycle::new(LifecycleConfig::reference(), 1);
        let mut fx = Effects::new();
        a.set_visible(true, HostTime(0), &mut fx);
        b.set_visible(true, HostTime(0), &mut fx);
        let a_timer = a.entrance.pending_id().unwrap();

        assert_eq!(b.on_timer(a_timer, HostTime(4000), &mut fx), None);
        assert_eq!(b.state(), LifecycleState::Entering);
    }
}
