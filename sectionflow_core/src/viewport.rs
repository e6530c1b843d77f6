// Copyright 2026 the Sectionflow Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Device-mode classification with rotation freeze.
//!
//! Mobile browsers fire a burst of resize events with inconsistent dimensions
//! while the device rotates and the browser chrome collapses or expands.
//! Recomputing layout mode on each one thrashes the page. The
//! [`ViewportClassifier`] therefore splits into:
//!
//! - pure decision functions ([`is_touch_device`], [`is_portrait`],
//!   [`classify`]) over a measured [`ViewportSnapshot`], and
//! - a state machine that decides *when* to recompute.
//!
//! # Rotation freeze
//!
//! When a resize arrives while the rotation signal (see
//! [`RotationTracker`](crate::rotation::RotationTracker)) is raised, the
//! classifier enters `is_rotating`, remembers the current mode as
//! `frozen_mode`, and schedules a re-check after
//! `settle_window + settle_buffer`. If the signal is still raised at the
//! re-check it polls every `poll_interval`; once it has dropped, it recomputes
//! exactly once from a fresh snapshot. A plain resize recomputes after
//! `resize_debounce` with no freeze.
//!
//! Under a resize storm that never goes quiet the classifier keeps deferring;
//! there is no absolute timeout.

use kurbo::Size;

use crate::effect::{Effects, TimerId, TimerKind, TimerSlot};
use crate::rate_limit::{Debounce, Limiter, RESIZE_DEBOUNCE_OWNER};
use crate::signal::{SignalWriter, Watch, signal};
use crate::time::{Duration, HostTime};

/// Layout class of the device.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DeviceMode {
    /// Anything that is not a touch device in the tablet width band.
    Desktop,
    /// Touch device in the tablet band, held upright.
    TabletPortrait,
    /// Touch device in the tablet band, held sideways.
    TabletLandscape,
}

impl DeviceMode {
    /// Returns a short label for diagnostics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Desktop => "desktop",
            Self::TabletPortrait => "tablet-portrait",
            Self::TabletLandscape => "tablet-landscape",
        }
    }
}

/// Raw touch capability signals, re-read on every measurement.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TouchSignals {
    /// `navigator.maxTouchPoints`.
    pub max_touch_points: u32,
    /// `(pointer: coarse)` media query match.
    pub coarse_pointer: bool,
    /// Touch events are supported (`ontouchstart` in window).
    pub touch_events: bool,
}

/// One measurement of the viewport.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewportSnapshot {
    /// Inner window size in CSS pixels.
    pub size: Size,
    /// `(orientation: portrait)` media query result, if available.
    pub portrait_query: Option<bool>,
    /// Touch capability signals.
    pub touch: TouchSignals,
}

impl ViewportSnapshot {
    /// A snapshot of a non-touch window of the given size.
    #[must_use]
    pub const fn desktop(width: f64, height: f64) -> Self {
        Self {
            size: Size::new(width, height),
            portrait_query: None,
            touch: TouchSignals {
                max_touch_points: 0,
                coarse_pointer: false,
                touch_events: false,
            },
        }
    }

    /// A snapshot of a touch device of the given size.
    #[must_use]
    pub const fn touch(width: f64, height: f64) -> Self {
        Self {
            size: Size::new(width, height),
            portrait_query: None,
            touch: TouchSignals {
                max_touch_points: 5,
                coarse_pointer: true,
                touch_events: true,
            },
        }
    }
}

/// Tuning for the classifier.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewportConfig {
    /// Smallest width (inclusive) classified as tablet.
    pub tablet_min_width: f64,
    /// Largest width (inclusive) classified as tablet.
    pub tablet_max_width: f64,
    /// Debounce for plain resizes.
    pub resize_debounce: Duration,
    /// Quiet period after the last rotation resize.
    pub settle_window: Duration,
    /// Extra delay after the settle window before the first re-check.
    pub settle_buffer: Duration,
    /// Re-poll interval while the rotation signal stays raised.
    pub poll_interval: Duration,
}

impl ViewportConfig {
    /// Reference tuning: tablet band 600–1400px, 100ms resize debounce,
    /// 400ms settle window plus 100ms buffer, 50ms polling.
    #[must_use]
    pub const fn reference() -> Self {
        Self {
            tablet_min_width: 600.0,
            tablet_max_width: 1400.0,
            resize_debounce: Duration(100),
            settle_window: Duration(400),
            settle_buffer: Duration(100),
            poll_interval: Duration(50),
        }
    }
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self::reference()
    }
}

/// Returns `true` if any touch capability signal is present.
#[must_use]
pub fn is_touch_device(touch: &TouchSignals) -> bool {
    touch.max_touch_points > 0 || touch.coarse_pointer || touch.touch_events
}

/// Returns `true` if the viewport is portrait.
///
/// Prefers the media-query result, which is stable while browser chrome
/// resizes; falls back to comparing dimensions.
#[must_use]
pub fn is_portrait(snapshot: &ViewportSnapshot) -> bool {
    snapshot
        .portrait_query
        .unwrap_or(snapshot.size.height > snapshot.size.width)
}

/// Classifies a snapshot.
#[must_use]
pub fn classify(snapshot: &ViewportSnapshot, config: &ViewportConfig) -> DeviceMode {
    let width = snapshot.size.width;
    let in_band = width >= config.tablet_min_width && width <= config.tablet_max_width;
    if !(in_band && is_touch_device(&snapshot.touch)) {
        DeviceMode::Desktop
    } else if is_portrait(snapshot) {
        DeviceMode::TabletPortrait
    } else {
        DeviceMode::TabletLandscape
    }
}

/// The reported viewport tuple.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewportState {
    /// Reported mode. Equals `frozen_mode` while rotating.
    pub mode: DeviceMode,
    /// Size at the last recomputation.
    pub size: Size,
    /// Orientation at the last recomputation.
    pub is_portrait: bool,
    /// Touch capability at the last recomputation.
    pub is_touch_device: bool,
    /// A rotation is in flight and the mode is frozen.
    pub is_rotating: bool,
    /// Mode captured when the rotation started.
    pub frozen_mode: Option<DeviceMode>,
}

impl ViewportState {
    fn measure(snapshot: &ViewportSnapshot, config: &ViewportConfig) -> Self {
        Self {
            mode: classify(snapshot, config),
            size: snapshot.size,
            is_portrait: is_portrait(snapshot),
            is_touch_device: is_touch_device(&snapshot.touch),
            is_rotating: false,
            frozen_mode: None,
        }
    }

    /// `mode == Desktop`.
    #[must_use]
    pub fn is_desktop(&self) -> bool {
        self.mode == DeviceMode::Desktop
    }

    /// Either tablet mode.
    #[must_use]
    pub fn is_tablet(&self) -> bool {
        !self.is_desktop()
    }

    /// `mode == TabletPortrait`.
    #[must_use]
    pub fn is_tablet_portrait(&self) -> bool {
        self.mode == DeviceMode::TabletPortrait
    }

    /// `mode == TabletLandscape`.
    #[must_use]
    pub fn is_tablet_landscape(&self) -> bool {
        self.mode == DeviceMode::TabletLandscape
    }
}

/// What a classifier input did to the reported state.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ViewportUpdate {
    /// A rotation started; the mode is frozen at `mode`.
    Frozen {
        /// The frozen mode.
        mode: DeviceMode,
    },
    /// The state was recomputed from a fresh snapshot.
    Recomputed {
        /// Mode reported before the recomputation.
        previous: DeviceMode,
        /// Mode reported now.
        mode: DeviceMode,
        /// Whether this recomputation ended a rotation freeze.
        after_rotation: bool,
    },
}

/// Rotation-aware viewport classifier.
#[derive(Debug)]
pub struct ViewportClassifier {
    config: ViewportConfig,
    state: SignalWriter<ViewportState>,
    rotation: Watch<bool>,
    settle: TimerSlot,
    poll: TimerSlot,
    debounce: Debounce<()>,
}

impl ViewportClassifier {
    /// Creates a classifier from an initial measurement.
    #[must_use]
    pub fn new(config: ViewportConfig, rotation: Watch<bool>, initial: &ViewportSnapshot) -> Self {
        let (state, _) = signal(ViewportState::measure(initial, &config));
        let debounce = Debounce::new(config.resize_debounce, RESIZE_DEBOUNCE_OWNER);
        Self {
            config,
            state,
            rotation,
            settle: TimerSlot::new(TimerKind::RotationSettle, 0),
            poll: TimerSlot::new(TimerKind::RotationPoll, 0),
            debounce,
        }
    }

    /// Returns the reported state.
    #[must_use]
    pub fn state(&self) -> ViewportState {
        self.state.get()
    }

    /// Returns a read handle that is notified when the reported state changes.
    #[must_use]
    pub fn watch(&self) -> Watch<ViewportState> {
        self.state.watch()
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &ViewportConfig {
        &self.config
    }

    /// Handles a resize or orientation-change event.
    ///
    /// The rotation signal must already reflect this event (the page feeds
    /// the rotation tracker first).
    pub fn on_resize(&mut self, now: HostTime, effects: &mut Effects) -> Option<ViewportUpdate> {
        if self.rotation.get() {
            self.debounce.cancel(effects);
            self.poll.cancel(effects);
            let at = now + self.config.settle_window + self.config.settle_buffer;
            self.settle.schedule(at, effects);

            let mut state = self.state.get();
            if state.is_rotating {
                return None;
            }
            state.is_rotating = true;
            state.frozen_mode = Some(state.mode);
            self.state.set(state);
            Some(ViewportUpdate::Frozen { mode: state.mode })
        } else if self.state.get().is_rotating {
            // Signal already dropped; the pending re-check will recompute.
            None
        } else {
            // Debounce has no leading edge; the recompute waits for the timer.
            let _ = self.debounce.call(now, (), effects);
            None
        }
    }

    /// Handles a fired timer, reading `snapshot` if a recomputation is due.
    pub fn on_timer(
        &mut self,
        id: TimerId,
        snapshot: &ViewportSnapshot,
        now: HostTime,
        effects: &mut Effects,
    ) -> Option<ViewportUpdate> {
        if self.settle.take_if_current(id) || self.poll.take_if_current(id) {
            if self.rotation.get() {
                self.poll.schedule(now + self.config.poll_interval, effects);
                return None;
            }
            return Some(self.recompute(snapshot, true));
        }
        if self.debounce.on_timer(id, now).is_some() {
            return Some(self.recompute(snapshot, false));
        }
        None
    }

    /// Cancels every timer and drops listeners.
    pub fn teardown(&mut self, effects: &mut Effects) {
        self.settle.cancel(effects);
        self.poll.cancel(effects);
        self.debounce.cancel(effects);
        self.state.clear_listeners();
    }

    fn recompute(&mut self, snapshot: &ViewportSnapshot, after_rotation: bool) -> ViewportUpdate {
        let previous = self.state.get().mode;
        let next = ViewportState::measure(snapshot, &self.config);
        self.state.set(next);
        ViewportUpdate::Recomputed {
            previous,
            mode: next.mode,
            after_rotation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effect::Effect;
    use crate::rotation::RotationTracker;

    fn last_schedule(fx: &Effects, kind: TimerKind) -> Option<(TimerId, HostTime)> {
        fx.as_slice().iter().rev().find_map(|e| match e {
            Effect::Schedule { id, at } if id.kind == kind => Some((*id, *at)),
            _ => None,
        })
    }

    #[test]
    fn classification_table() {
        let cfg = ViewportConfig::reference();
        assert_eq!(classify(&ViewportSnapshot::desktop(1024.0, 768.0), &cfg), DeviceMode::Desktop);
        assert_eq!(
            classify(&ViewportSnapshot::touch(1024.0, 768.0), &cfg),
            DeviceMode::TabletLandscape
        );
        assert_eq!(
            classify(&ViewportSnapshot::touch(768.0, 1024.0), &cfg),
            DeviceMode::TabletPortrait
        );
        assert_eq!(
            classify(&ViewportSnapshot::touch(599.0, 900.0), &cfg),
            DeviceMode::Desktop,
            "below the tablet band"
        );
        assert_eq!(
            classify(&ViewportSnapshot::touch(1400.0, 900.0), &cfg),
            DeviceMode::TabletLandscape,
            "band is inclusive"
        );
        assert_eq!(classify(&ViewportSnapshot::touch(1401.0, 900.0), &cfg), DeviceMode::Desktop);
    }

    #[test]
    fn media_query_wins_over_dimensions() {
        let mut snap = ViewportSnapshot::touch(800.0, 700.0);
        snap.portrait_query = Some(true);
        assert!(is_portrait(&snap));
        assert_eq!(
            classify(&snap, &ViewportConfig::reference()),
            DeviceMode::TabletPortrait
        );
    }

    #[test]
    fn any_touch_signal_counts() {
        assert!(!is_touch_device(&TouchSignals::default()));
        assert!(is_touch_device(&TouchSignals {
            coarse_pointer: true,
            ..TouchSignals::default()
        }));
        assert!(is_touch_device(&TouchSignals {
            max_touch_points: 1,
            ..TouchSignals::default()
        }));
    }

    #[test]
    fn plain_resize_recomputes_after_debounce() {
        let mut fx = Effects::new();
        let rotation = RotationTracker::new(Duration(400));
        let mut vc = ViewportClassifier::new(
            ViewportConfig::reference(),
            rotation.watch(),
            &ViewportSnapshot::touch(1024.0, 768.0),
        );

        assert_eq!(vc.on_resize(HostTime(0), &mut fx), None);
        vc.on_resize(HostTime(50), &mut fx);
        let (id, at) = last_schedule(&fx, TimerKind::RateLimit).unwrap();
        assert_eq!(at, HostTime(150));
        assert!(!vc.state().is_rotating, "plain resize never freezes");

        let update = vc.on_timer(id, &ViewportSnapshot::desktop(1600.0, 900.0), at, &mut fx);
        assert_eq!(
            update,
            Some(ViewportUpdate::Recomputed {
                previous: DeviceMode::TabletLandscape,
                mode: DeviceMode::Desktop,
                after_rotation: false,
            })
        );
    }

    #[test]
    fn rotation_freezes_mode_until_signal_clears() {
        let cfg = ViewportConfig::reference();
        let mut fx = Effects::new();
        let mut rotation = RotationTracker::new(cfg.settle_window);
        let mut vc = ViewportClassifier::new(
            cfg,
            rotation.watch(),
            &ViewportSnapshot::touch(1024.0, 768.0),
        );

        rotation.on_orientation_change(HostTime(0), &mut fx);
        assert_eq!(
            vc.on_resize(HostTime(0), &mut fx),
            Some(ViewportUpdate::Frozen {
                mode: DeviceMode::TabletLandscape
            })
        );
        for t in [20_u64, 60, 90, 140] {
            rotation.on_resize(HostTime(t), &mut fx);
            assert_eq!(vc.on_resize(HostTime(t), &mut fx), None);
            assert_eq!(vc.state().mode, DeviceMode::TabletLandscape);
            assert!(vc.state().is_rotating);
        }

        let (settle, settle_at) = last_schedule(&fx, TimerKind::RotationSettle).unwrap();
        assert_eq!(settle_at, HostTime(640), "140 + 400 settle + 100 buffer");
        let (quiet, quiet_at) = last_schedule(&fx, TimerKind::RotationQuiet).unwrap();
        assert_eq!(quiet_at, HostTime(540));

        assert!(rotation.on_timer(quiet));
        let portrait = ViewportSnapshot::touch(768.0, 1024.0);
        let update = vc.on_timer(settle, &portrait, settle_at, &mut fx);
        assert_eq!(
            update,
            Some(ViewportUpdate::Recomputed {
                previous: DeviceMode::TabletLandscape,
                mode: DeviceMode::TabletPortrait,
                after_rotation: true,
            })
        );
        assert!(!vc.state().is_rotating);
        assert_eq!(vc.state().frozen_mode, None);
    }

    #[test]
    fn rotation_polls_while_signal_is_raised() {
        let cfg = ViewportConfig::reference();
        let mut fx = Effects::new();
        let mut rotation = RotationTracker::new(Duration(10_000));
        let mut vc = ViewportClassifier::new(
            cfg,
            rotation.watch(),
            &ViewportSnapshot::touch(1024.0, 768.0),
        );
        rotation.on_orientation_change(HostTime(0), &mut fx);
        vc.on_resize(HostTime(0), &mut fx);

        let (settle, at) = last_schedule(&fx, TimerKind::RotationSettle).unwrap();
        let snap = ViewportSnapshot::touch(768.0, 1024.0);
        assert_eq!(vc.on_timer(settle, &snap, at, &mut fx), None);
        let (poll, poll_at) = last_schedule(&fx, TimerKind::RotationPoll).unwrap();
        assert_eq!(poll_at, HostTime(550));
        assert_eq!(vc.on_timer(poll, &snap, poll_at, &mut fx), None);
        assert_eq!(vc.state().mode, DeviceMode::TabletLandscape, "still frozen");

        let (quiet, _) = last_schedule(&fx, TimerKind::RotationQuiet).unwrap();
        rotation.on_timer(quiet);
        let (poll, poll_at) = last_schedule(&fx, TimerKind::RotationPoll).unwrap();
        assert!(matches!(
            vc.on_timer(poll, &snap, poll_at, &mut fx),
            Some(ViewportUpdate::Recomputed {
                mode: DeviceMode::TabletPortrait,
                ..
            })
        ));
    }

    #[test]
    fn watch_sees_recomputed_state() {
        let mut fx = Effects::new();
        let rotation = RotationTracker::new(Duration(400));
        let mut vc = ViewportClassifier::new(
            ViewportConfig::reference(),
            rotation.watch(),
            &ViewportSnapshot::desktop(1280.0, 800.0),
        );
        let watch = vc.watch();
        vc.on_resize(HostTime(0), &mut fx);
        let (id, at) = last_schedule(&fx, TimerKind::RateLimit).unwrap();
        vc.on_timer(id, &ViewportSnapshot::touch(700.0, 1000.0), at, &mut fx);

        assert!(watch.get().is_tablet_portrait());
        assert!(watch.get().is_touch_device);
        assert_eq!(watch.get().size, Size::new(700.0, 1000.0));
    }
}
