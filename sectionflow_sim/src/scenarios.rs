// Copyright 2026 the Sectionflow Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! End-to-end scenarios: a whole page driven through [`SimHost`].

use alloc::vec::Vec;

use sectionflow_core::config::EngineConfig;
use sectionflow_core::id::SectionId;
use sectionflow_core::lifecycle::LifecycleState;
use sectionflow_core::page::{NavigateError, Page};
use sectionflow_core::scroll_spy::LockRelease;
use sectionflow_core::section::SectionSpec;
use sectionflow_core::time::{Duration, HostTime};
use sectionflow_core::trace::{
    ActiveSectionEvent, LifecycleTransitionEvent, LockPhase, RotationSignalEvent,
    ScrollLockEvent, TraceSink, ViewportEvent,
};
use sectionflow_core::viewport::{DeviceMode, ViewportSnapshot};

use crate::host::SimHost;
use crate::layout::SimLayout;

#[derive(Debug, Default)]
struct Log {
    lifecycle: Vec<LifecycleTransitionEvent>,
    active: Vec<ActiveSectionEvent>,
    locks: Vec<ScrollLockEvent>,
    viewport: Vec<ViewportEvent>,
    rotation: Vec<RotationSignalEvent>,
}

impl TraceSink for Log {
    fn on_lifecycle_transition(&mut self, e: &LifecycleTransitionEvent) {
        self.lifecycle.push(*e);
    }
    fn on_active_section(&mut self, e: &ActiveSectionEvent) {
        self.active.push(*e);
    }
    fn on_scroll_lock(&mut self, e: &ScrollLockEvent) {
        self.locks.push(*e);
    }
    fn on_viewport(&mut self, e: &ViewportEvent) {
        self.viewport.push(*e);
    }
    fn on_rotation_signal(&mut self, e: &RotationSignalEvent) {
        self.rotation.push(*e);
    }
}

fn id(s: &str) -> SectionId {
    SectionId::from(s)
}

/// hero 800, story 1600 (four stacked layers), contact 1000, in an 800 tall
/// viewport.
fn landing(viewport: ViewportSnapshot) -> SimHost<Log> {
    let layout = SimLayout::stacked(
        &[("hero", 800.0), ("story", 1600.0), ("contact", 1000.0)],
        viewport,
    );
    let specs = [
        SectionSpec::plain("hero"),
        SectionSpec::story("story", 4),
        SectionSpec::plain("contact"),
    ];
    let page = Page::new(EngineConfig::reference(), specs, &viewport).unwrap();
    SimHost::with_sink(page, layout, Log::default())
}

fn desktop() -> SimHost<Log> {
    landing(ViewportSnapshot::desktop(1280.0, 800.0))
}

fn state(host: &SimHost<Log>, section: &str) -> LifecycleState {
    host.page().output(&id(section)).unwrap().state
}

#[test]
fn entrance_then_preservation_then_cleanup() {
    let mut h = desktop();
    let hero = id("hero");

    h.set_visible(&hero, true);
    assert_eq!(state(&h, "hero"), LifecycleState::Entering);
    assert!(h.presenter().output(0).unwrap().should_animate);

    h.advance_to(HostTime(3999));
    assert_eq!(state(&h, "hero"), LifecycleState::Entering);
    h.advance_to(HostTime(4000));
    assert_eq!(state(&h, "hero"), LifecycleState::Active, "entrance is 4s");

    h.advance_to(HostTime(4001));
    h.set_visible(&hero, false);
    assert_eq!(state(&h, "hero"), LifecycleState::Preserving);
    assert!(h.presenter().output(0).unwrap().is_preserved);

    h.advance_to(HostTime(7999));
    assert_eq!(state(&h, "hero"), LifecycleState::Preserving);
    h.advance_to(HostTime(8001));
    assert_eq!(state(&h, "hero"), LifecycleState::Cleaned);
    assert_eq!(h.pending_timers(), 0);

    let path: Vec<_> = h.sink().lifecycle.iter().map(|e| (e.to, e.at)).collect();
    assert_eq!(
        path,
        [
            (LifecycleState::Entering, HostTime(0)),
            (LifecycleState::Active, HostTime(4000)),
            (LifecycleState::Preserving, HostTime(4001)),
            (LifecycleState::Cleaned, HostTime(8001)),
        ]
    );
}

#[test]
fn returning_during_preservation_resumes_without_replaying_entrance() {
    let mut h = desktop();
    let hero = id("hero");

    h.set_visible(&hero, true);
    h.advance_to(HostTime(4000));
    h.advance_to(HostTime(5000));
    h.set_visible(&hero, false);
    h.advance_to(HostTime(6000));
    h.set_visible(&hero, true);

    assert_eq!(state(&h, "hero"), LifecycleState::Active);
    assert!(
        !h.presenter().output(0).unwrap().should_animate,
        "entrance does not replay"
    );
    assert_eq!(h.pending_timers(), 0, "preservation timer was cancelled");

    h.advance(Duration(10_000));
    assert_eq!(state(&h, "hero"), LifecycleState::Active);
}

#[test]
fn interrupted_entrance_restarts_from_the_last_show() {
    let mut h = desktop();
    let hero = id("hero");

    h.set_visible(&hero, true);
    h.advance_to(HostTime(1000));
    h.set_visible(&hero, false);
    assert_eq!(state(&h, "hero"), LifecycleState::Preserving);
    h.advance_to(HostTime(2000));
    h.set_visible(&hero, true);
    assert_eq!(
        state(&h, "hero"),
        LifecycleState::Entering,
        "entrance never completed"
    );

    h.advance_to(HostTime(5999));
    assert_eq!(state(&h, "hero"), LifecycleState::Entering);
    h.advance_to(HostTime(6000));
    assert_eq!(state(&h, "hero"), LifecycleState::Active);
}

#[test]
fn cleaned_section_enters_again() {
    let mut h = desktop();
    let hero = id("hero");

    h.set_visible(&hero, true);
    h.advance_to(HostTime(500));
    h.set_visible(&hero, false);
    h.advance_to(HostTime(4500));
    assert_eq!(state(&h, "hero"), LifecycleState::Cleaned);

    h.advance_to(HostTime(10_000));
    h.set_visible(&hero, true);
    assert_eq!(state(&h, "hero"), LifecycleState::Entering);
    h.advance_to(HostTime(14_000));
    assert_eq!(state(&h, "hero"), LifecycleState::Active);
}

#[test]
fn organic_scrolling_moves_the_active_section() {
    let mut h = desktop();
    h.observe();
    assert_eq!(h.page().active(), Some(id("hero")), "first section at load");
    let watch = h.page().active_watch();

    h.scroll_to(750.0);
    assert_eq!(h.page().active(), Some(id("hero")), "waits for the frame");
    h.advance(Duration(16));
    assert_eq!(watch.get(), Some(id("story")), "story top is at 50");

    h.scroll_to(2000.0);
    h.advance(Duration(16));
    assert_eq!(h.page().active(), Some(id("story")), "contact top is at 400");

    h.scroll_to(2400.0);
    h.advance(Duration(16));
    assert_eq!(h.page().active(), Some(id("contact")));

    h.scroll_to(0.0);
    h.advance(Duration(16));
    assert_eq!(h.page().active(), Some(id("hero")));

    let changes: Vec<_> = h.sink().active.iter().map(|e| e.to).collect();
    assert_eq!(changes, [1, 2, 0]);
    assert!(h.sink().active.iter().all(|e| !e.locked));
}

#[test]
fn scroll_bursts_coalesce_into_one_frame() {
    let mut h = desktop();
    h.observe();
    for y in [100.0, 200.0, 300.0, 400.0, 750.0] {
        h.scroll_to(y);
    }
    h.advance(Duration(40));
    assert_eq!(h.frames(), 1);
    assert_eq!(h.sink().active.len(), 1);
}

#[test]
fn navigation_locks_until_arrival() {
    let mut h = desktop();
    h.observe();
    h.navigate(&id("contact")).unwrap();

    assert_eq!(h.page().active(), Some(id("contact")), "set immediately");
    assert_eq!(h.fragment(), Some(&id("contact")));
    assert_eq!(h.scroll_requests(), [id("contact")]);
    assert!(h.is_scrolling());

    // The smooth scroll passes over story; the lock holds the highlight.
    while h.is_scrolling() {
        h.advance(Duration(16));
        assert_eq!(h.page().active(), Some(id("contact")));
    }
    h.advance(Duration(16));

    assert_eq!(h.page().scroll_spy().lock_target(), None, "released");
    assert_eq!(h.layout().scroll_y(), 2400.0);
    let phases: Vec<_> = h.sink().locks.iter().map(|e| e.phase).collect();
    assert_eq!(
        phases,
        [
            LockPhase::Engaged,
            LockPhase::Released(LockRelease::Arrived)
        ]
    );
    assert_eq!(h.sink().active.len(), 1, "only the navigation itself");
    assert!(h.sink().active[0].locked);

    // Sections crossed by the scroll ran their lifecycles.
    assert_eq!(state(&h, "contact"), LifecycleState::Entering);
    assert_eq!(state(&h, "hero"), LifecycleState::Preserving);
}

#[test]
fn slow_scroll_releases_the_lock_on_timeout() {
    let mut h = desktop().with_scroll_duration(Duration(5000));
    h.observe();
    h.navigate(&id("contact")).unwrap();

    h.advance_to(HostTime(1999));
    assert_eq!(h.page().scroll_spy().lock_target(), Some(&id("contact")));

    h.advance_to(HostTime(2000));
    assert_eq!(h.page().scroll_spy().lock_target(), None);
    assert_eq!(
        h.sink().locks.last().map(|e| e.phase),
        Some(LockPhase::Released(LockRelease::TimedOut))
    );

    // Resynchronized with the real position (about 970px down).
    h.advance_to(HostTime(2032));
    assert_eq!(h.page().active(), Some(id("story")));

    h.advance_to(HostTime(5100));
    assert_eq!(h.page().active(), Some(id("contact")), "organic tracking");
}

#[test]
fn navigation_to_a_missing_element_releases_the_lock_at_once() {
    let mut h = desktop();
    h.observe();
    h.remove_element(&id("contact"));
    h.navigate(&id("contact")).unwrap();

    assert_eq!(h.page().scroll_spy().lock_target(), None, "no 2s wait");
    assert!(!h.is_scrolling());
    assert_eq!(h.scroll_requests(), [id("contact")]);
    assert_eq!(
        h.sink().locks.last().map(|e| e.phase),
        Some(LockPhase::Released(LockRelease::Unreachable))
    );

    h.advance(Duration(32));
    assert_eq!(
        h.page().active(),
        Some(id("hero")),
        "highlight returns to the real scroll position"
    );
}

#[test]
fn second_navigation_supersedes_the_first() {
    let mut h = desktop();
    h.observe();
    h.navigate(&id("contact")).unwrap();
    h.advance(Duration(100));
    h.navigate(&id("story")).unwrap();

    assert_eq!(h.page().scroll_spy().lock_target(), Some(&id("story")));
    let phases: Vec<_> = h.sink().locks.iter().map(|e| (e.target, e.phase)).collect();
    assert_eq!(
        phases,
        [
            (2, LockPhase::Engaged),
            (2, LockPhase::Released(LockRelease::Superseded)),
            (1, LockPhase::Engaged),
        ]
    );

    h.advance(Duration(2000));
    assert_eq!(h.page().active(), Some(id("story")));
    assert_eq!(h.page().scroll_spy().lock_target(), None);
    assert_eq!(h.fragment(), Some(&id("story")));
}

#[test]
fn navigating_to_an_unknown_section_changes_nothing() {
    let mut h = desktop();
    h.observe();
    let err = h.navigate(&id("pricing")).unwrap_err();
    assert!(matches!(err, NavigateError::UnknownSection(ref s) if *s == id("pricing")));
    assert_eq!(h.fragment(), None);
    assert!(!h.is_scrolling());
    assert!(h.sink().locks.is_empty());
}

#[test]
fn rotation_storm_recomputes_exactly_once() {
    let portrait = ViewportSnapshot::touch(800.0, 1200.0);
    let mut h = landing(portrait);
    assert_eq!(h.page().viewport().mode, DeviceMode::TabletPortrait);

    h.orientation_change(ViewportSnapshot::touch(1200.0, 800.0));
    assert!(h.page().rotation_watch().get());
    assert!(h.page().viewport().is_rotating);

    // Browser chrome settles over 300ms with inconsistent sizes.
    let sizes = [(1180.0, 760.0), (1200.0, 740.0), (1190.0, 800.0), (1200.0, 800.0)];
    for (step, (w, hgt)) in (1_u64..).zip(sizes) {
        h.advance_to(HostTime(75 * step));
        h.resize(ViewportSnapshot::touch(w, hgt));
        assert_eq!(
            h.page().viewport().mode,
            DeviceMode::TabletPortrait,
            "frozen during the storm"
        );
    }

    // Quiet 400ms after the last resize at 300, first re-check 500ms after it.
    h.advance_to(HostTime(699));
    assert!(h.page().rotation_watch().get());
    h.advance_to(HostTime(700));
    assert!(!h.page().rotation_watch().get());
    assert!(h.page().viewport().is_rotating, "re-check not yet due");

    h.advance_to(HostTime(800));
    let vp = h.page().viewport();
    assert_eq!(vp.mode, DeviceMode::TabletLandscape);
    assert!(!vp.is_rotating);
    assert_eq!(vp.frozen_mode, None);

    let log = &h.sink().viewport;
    assert_eq!(log.len(), 2, "one freeze, one recompute");
    assert!(log[0].frozen);
    assert!(!log[1].frozen && log[1].after_rotation);
    assert_eq!(log[1].at, HostTime(800));

    let signal: Vec<_> = h.sink().rotation.iter().map(|e| (e.raised, e.at)).collect();
    assert_eq!(signal, [(true, HostTime(0)), (false, HostTime(700))]);
}

#[test]
fn scroll_spy_sleeps_through_rotation_and_resyncs() {
    let portrait = ViewportSnapshot::touch(800.0, 1200.0);
    let mut h = landing(portrait);
    h.observe();

    h.orientation_change(ViewportSnapshot::touch(1200.0, 800.0));
    h.scroll_to(900.0);
    h.advance_to(HostTime(399));
    assert_eq!(h.page().active(), Some(id("hero")), "frames skipped");

    h.advance_to(HostTime(420));
    assert_eq!(h.page().active(), Some(id("story")), "resync after the signal drops");
}

#[test]
fn plain_resize_is_debounced() {
    let mut h = desktop();
    h.resize(ViewportSnapshot::touch(1000.0, 800.0));
    h.advance_to(HostTime(50));
    h.resize(ViewportSnapshot::touch(900.0, 1200.0));
    h.advance_to(HostTime(149));
    assert_eq!(h.page().viewport().mode, DeviceMode::Desktop);
    h.advance_to(HostTime(150));
    assert_eq!(h.page().viewport().mode, DeviceMode::TabletPortrait);
    assert_eq!(h.sink().viewport.len(), 1);
    assert!(!h.sink().viewport[0].after_rotation);
}

#[test]
fn story_playback_follows_selection_and_liveness() {
    let mut h = desktop();
    let story = id("story");

    // Selecting while off-screen decodes nothing.
    assert!(h.hover(&story, 2));
    assert_eq!(h.presenter().playing_layers(), 0);

    h.set_visible(&story, true);
    let plan = h.presenter().plan(1).unwrap();
    assert!(plan.base);
    assert_eq!(plan.stacked, [false, false, true, false]);
    assert_eq!(h.presenter().playing_layers(), 2);

    // Hover is throttled, focus is not.
    h.advance(Duration(50));
    assert!(!h.hover(&story, 3));
    assert!(h.focus(&story, 0));
    assert_eq!(h.presenter().plan(1).unwrap().stacked, [true, false, false, false]);

    h.advance(Duration(200));
    assert!(h.hover(&story, 3));
    assert_eq!(h.presenter().plan(1).unwrap().stacked, [false, false, false, true]);

    // Hidden pauses everything, including during preservation.
    h.set_visible(&story, false);
    assert_eq!(state(&h, "story"), LifecycleState::Preserving);
    assert_eq!(h.presenter().playing_layers(), 0);

    h.set_visible(&story, true);
    assert_eq!(h.presenter().playing_layers(), 2, "selection survives");
}

#[test]
fn teardown_leaves_nothing_behind() {
    let mut h = desktop();
    h.observe();
    h.navigate(&id("story")).unwrap();
    h.orientation_change(ViewportSnapshot::desktop(800.0, 1280.0));
    h.advance(Duration(50));
    assert!(h.pending_timers() > 0);

    h.teardown();
    assert_eq!(h.pending_timers(), 0);
    let updates = h.presenter().lifecycle_updates();
    let events = h.sink().lifecycle.len();

    h.advance(Duration(60_000));
    assert_eq!(h.presenter().lifecycle_updates(), updates);
    assert_eq!(h.sink().lifecycle.len(), events, "no callback after unmount");
}
