// Copyright 2026 the Sectionflow Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Page orchestrator.
//!
//! [`Page`] owns every machine on the page and is the only thing a host talks
//! to. It fans host input out to the machines in a fixed order, routes fired
//! timers back to their owner by [`TimerKind`], and reports what happened
//! through the [`Tracer`].
//!
//! Resize ordering matters: the rotation tracker sees a resize first, so the
//! classifier and the scroll-spy read an up-to-date rotation signal.

use alloc::vec::Vec;
use core::fmt;

use crate::config::EngineConfig;
use crate::effect::{Effect, Effects, TimerId, TimerKind};
use crate::rate_limit::RESIZE_DEBOUNCE_OWNER;
use crate::id::SectionId;
use crate::lifecycle::{LifecycleOutput, Transition};
use crate::rotation::RotationTracker;
use crate::scroll_spy::{LockRelease, ScrollSpy, ScrollSpyUpdate, SectionProbe};
use crate::section::{RegisterError, SectionChanges, SectionSpec, SectionStore};
use crate::signal::Watch;
use crate::time::HostTime;
use crate::trace::{
    ActiveSectionEvent, CarouselEvent, LifecycleTransitionEvent, LockPhase, RotationSignalEvent,
    ScrollLockEvent, Tracer, ViewportEvent,
};
use crate::viewport::{ViewportClassifier, ViewportSnapshot, ViewportState, ViewportUpdate};

/// Host-side layout reads.
pub trait LayoutProbe: SectionProbe {
    /// Measures the viewport.
    fn viewport(&self) -> ViewportSnapshot;
}

/// Error returned by [`Page::navigate`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NavigateError {
    /// No section with this id is mounted.
    UnknownSection(SectionId),
}

impl fmt::Display for NavigateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownSection(id) => write!(f, "cannot navigate to unknown section `{id}`"),
        }
    }
}

impl core::error::Error for NavigateError {}

/// All engine state for one page.
#[derive(Debug)]
pub struct Page {
    store: SectionStore,
    spy: ScrollSpy,
    viewport: ViewportClassifier,
    rotation: RotationTracker,
}

impl Page {
    /// Mounts `sections` (document order) and takes the initial viewport
    /// measurement.
    pub fn new(
        config: EngineConfig,
        sections: impl IntoIterator<Item = SectionSpec>,
        initial: &ViewportSnapshot,
    ) -> Result<Self, RegisterError> {
        let mut store = SectionStore::new(config.lifecycle);
        for spec in sections {
            store.register(spec)?;
        }
        let rotation = RotationTracker::new(config.viewport.settle_window);
        let viewport = ViewportClassifier::new(config.viewport, rotation.watch(), initial);
        let spy = ScrollSpy::new(config.scroll_spy, store.ids().to_vec())
            .with_rotation(rotation.watch());
        Ok(Self {
            store,
            spy,
            viewport,
            rotation,
        })
    }

    // -- Accessors --

    /// The section store.
    #[must_use]
    pub fn sections(&self) -> &SectionStore {
        &self.store
    }

    /// The scroll-spy tracker.
    #[must_use]
    pub fn scroll_spy(&self) -> &ScrollSpy {
        &self.spy
    }

    /// Current active section.
    #[must_use]
    pub fn active(&self) -> Option<SectionId> {
        self.spy.active()
    }

    /// Subscribable active section.
    #[must_use]
    pub fn active_watch(&self) -> Watch<Option<SectionId>> {
        self.spy.watch()
    }

    /// Reported viewport state.
    #[must_use]
    pub fn viewport(&self) -> ViewportState {
        self.viewport.state()
    }

    /// Subscribable viewport state.
    #[must_use]
    pub fn viewport_watch(&self) -> Watch<ViewportState> {
        self.viewport.watch()
    }

    /// Subscribable rotation signal.
    #[must_use]
    pub fn rotation_watch(&self) -> Watch<bool> {
        self.rotation.watch()
    }

    /// Lifecycle output for the section with `id`.
    #[must_use]
    pub fn output(&self, id: &SectionId) -> Option<LifecycleOutput> {
        self.store.output(self.store.index_of(id)?)
    }

    // -- Input --

    /// Feeds the visibility signal for one section. Unknown ids are ignored.
    pub fn on_visibility(
        &mut self,
        id: &SectionId,
        visible: bool,
        now: HostTime,
        effects: &mut Effects,
        tracer: &mut Tracer<'_>,
    ) -> Option<Transition> {
        let idx = self.store.index_of(id)?;
        let t = self.store.set_visible(idx, visible, now, effects)?;
        trace_transition(tracer, idx, &t, now);
        Some(t)
    }

    /// Handles a scroll event.
    pub fn on_scroll(&mut self, effects: &mut Effects) {
        self.spy.on_scroll(effects);
    }

    /// Handles a resize event.
    pub fn on_resize(&mut self, now: HostTime, effects: &mut Effects, tracer: &mut Tracer<'_>) {
        self.rotation.on_resize(now, effects);
        let update = self.viewport.on_resize(now, effects);
        self.trace_viewport(update, now, tracer);
        self.spy.on_scroll(effects);
    }

    /// Handles an `orientationchange` event.
    pub fn on_orientation_change(
        &mut self,
        now: HostTime,
        effects: &mut Effects,
        tracer: &mut Tracer<'_>,
    ) {
        if self.rotation.on_orientation_change(now, effects) {
            tracer.rotation_signal(&RotationSignalEvent {
                raised: true,
                at: now,
            });
        }
        let update = self.viewport.on_resize(now, effects);
        self.trace_viewport(update, now, tracer);
    }

    /// Runs the frame requested by an earlier [`Effect::RequestFrame`].
    pub fn on_frame(
        &mut self,
        probe: &dyn LayoutProbe,
        now: HostTime,
        effects: &mut Effects,
        tracer: &mut Tracer<'_>,
    ) {
        let update = self.spy.on_frame(probe, effects);
        self.trace_spy(update, false, now, tracer);
    }

    /// Handles a fired timer. Returns `false` for ids no machine owns.
    pub fn on_timer(
        &mut self,
        id: TimerId,
        probe: &dyn LayoutProbe,
        now: HostTime,
        effects: &mut Effects,
        tracer: &mut Tracer<'_>,
    ) -> bool {
        match id.kind {
            TimerKind::Entrance | TimerKind::Preservation => {
                if let Some((idx, t)) = self.store.on_timer(id, now, effects) {
                    trace_transition(tracer, idx, &t, now);
                }
            }
            TimerKind::ScrollLock => {
                let update = self.spy.on_timer(id, effects);
                self.trace_spy(update, false, now, tracer);
            }
            TimerKind::RotationQuiet => {
                if self.rotation.on_timer(id) {
                    tracer.rotation_signal(&RotationSignalEvent {
                        raised: false,
                        at: now,
                    });
                    // Frames were skipped while rotating.
                    self.spy.on_scroll(effects);
                }
            }
            TimerKind::RotationSettle | TimerKind::RotationPoll => {
                let update = self
                    .viewport
                    .on_timer(id, &probe.viewport(), now, effects);
                self.trace_viewport(update, now, tracer);
            }
            TimerKind::RateLimit => match id.owner {
                RESIZE_DEBOUNCE_OWNER => {
                    let update = self
                        .viewport
                        .on_timer(id, &probe.viewport(), now, effects);
                    self.trace_viewport(update, now, tracer);
                }
                _ => return false,
            },
        }
        true
    }

    /// Navigates to `target`: locks the scroll-spy, then asks the host to
    /// scroll and to update the address fragment.
    pub fn navigate(
        &mut self,
        target: &SectionId,
        now: HostTime,
        effects: &mut Effects,
        tracer: &mut Tracer<'_>,
    ) -> Result<(), NavigateError> {
        let outcome = self
            .spy
            .navigate_to(target, now, effects)
            .map_err(|e| NavigateError::UnknownSection(e.0))?;

        if let Some(prev) = outcome.superseded.as_ref().and_then(|id| self.store.index_of(id)) {
            tracer.scroll_lock(&ScrollLockEvent {
                target: prev,
                phase: LockPhase::Released(LockRelease::Superseded),
                at: now,
            });
        }
        if let Some(idx) = self.store.index_of(target) {
            tracer.scroll_lock(&ScrollLockEvent {
                target: idx,
                phase: LockPhase::Engaged,
                at: now,
            });
        }
        self.trace_spy(outcome.changed, true, now, tracer);

        effects.push(Effect::ScrollTo { id: target.clone() });
        effects.push(Effect::SetFragment { id: target.clone() });
        Ok(())
    }

    /// Reports that the host could not start the scroll requested by
    /// [`Effect::ScrollTo`] for `target`, releasing the navigation lock
    /// early. Returns `false` if no lock on `target` was held.
    pub fn on_scroll_unavailable(
        &mut self,
        target: &SectionId,
        now: HostTime,
        effects: &mut Effects,
        tracer: &mut Tracer<'_>,
    ) -> bool {
        let update = self.spy.abandon(target, effects);
        let released = update.is_some();
        self.trace_spy(update, false, now, tracer);
        released
    }

    /// Pointer hover over a carousel item.
    pub fn on_hover(
        &mut self,
        id: &SectionId,
        item: usize,
        now: HostTime,
        tracer: &mut Tracer<'_>,
    ) -> bool {
        let Some(idx) = self.store.index_of(id) else {
            return false;
        };
        let changed = self.store.on_hover(idx, item, now);
        self.trace_carousel(changed, idx, now, tracer);
        changed
    }

    /// Keyboard focus on a carousel item.
    pub fn on_focus(
        &mut self,
        id: &SectionId,
        item: usize,
        now: HostTime,
        tracer: &mut Tracer<'_>,
    ) -> bool {
        let Some(idx) = self.store.index_of(id) else {
            return false;
        };
        let changed = self.store.on_focus(idx, item);
        self.trace_carousel(changed, idx, now, tracer);
        changed
    }

    /// Drains section changes for presenters.
    pub fn evaluate(&mut self) -> SectionChanges {
        self.store.evaluate()
    }

    /// Cancels every timer and drops every listener.
    pub fn teardown(&mut self, effects: &mut Effects) {
        self.store.unmount_all(effects);
        self.spy.teardown(effects);
        self.viewport.teardown(effects);
        self.rotation.teardown(effects);
    }

    // -- Tracing helpers --

    fn trace_spy(
        &self,
        update: Option<ScrollSpyUpdate>,
        locked: bool,
        now: HostTime,
        tracer: &mut Tracer<'_>,
    ) {
        match update {
            Some(ScrollSpyUpdate::Changed { from, to }) => {
                let Some(to) = self.store.index_of(&to) else {
                    return;
                };
                tracer.active_section(&ActiveSectionEvent {
                    from: from.and_then(|id| self.store.index_of(&id)),
                    to,
                    locked,
                    at: now,
                });
            }
            Some(ScrollSpyUpdate::Released { target, reason }) => {
                if let Some(target) = self.store.index_of(&target) {
                    tracer.scroll_lock(&ScrollLockEvent {
                        target,
                        phase: LockPhase::Released(reason),
                        at: now,
                    });
                }
            }
            None => {}
        }
    }

    fn trace_viewport(&self, update: Option<ViewportUpdate>, now: HostTime, tracer: &mut Tracer<'_>) {
        let event = match update {
            Some(ViewportUpdate::Frozen { mode }) => ViewportEvent {
                previous: mode,
                mode,
                frozen: true,
                after_rotation: false,
                at: now,
            },
            Some(ViewportUpdate::Recomputed {
                previous,
                mode,
                after_rotation,
            }) => ViewportEvent {
                previous,
                mode,
                frozen: false,
                after_rotation,
                at: now,
            },
            None => return,
        };
        tracer.viewport(&event);
    }

    fn trace_carousel(&self, changed: bool, idx: u32, now: HostTime, tracer: &mut Tracer<'_>) {
        if !changed {
            return;
        }
        if let Some(carousel) = self.store.carousel(idx) {
            #[expect(
                clippy::cast_possible_truncation,
                reason = "carousels hold a handful of items"
            )]
            tracer.carousel(&CarouselEvent {
                section: idx,
                selected: carousel.selected() as u32,
                at: now,
            });
        }
    }
}

fn trace_transition(tracer: &mut Tracer<'_>, idx: u32, t: &Transition, now: HostTime) {
    tracer.lifecycle_transition(&LifecycleTransitionEvent {
        section: idx,
        from: t.from,
        to: t.to,
        cause: t.event,
        at: now,
    });
}

/// Collects the ids of every section whose lifecycle output changed.
///
/// Convenience for hosts that key their presenters by id.
#[must_use]
pub fn changed_ids(page: &Page, changes: &SectionChanges) -> Vec<SectionId> {
    let mut indices: Vec<u32> = changes
        .lifecycle
        .iter()
        .chain(&changes.playback)
        .copied()
        .collect();
    indices.sort_unstable();
    indices.dedup();
    indices
        .into_iter()
        .filter_map(|idx| page.sections().id_at(idx).cloned())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::LifecycleState;
    use crate::rate_limit::FIRST_CALLER_OWNER;
    use crate::viewport::DeviceMode;

    struct Fixed {
        tops: Vec<(SectionId, f64)>,
        viewport: ViewportSnapshot,
    }

    impl SectionProbe for Fixed {
        fn section_top(&self, id: &SectionId) -> Option<f64> {
            self.tops.iter().find(|(s, _)| s == id).map(|(_, t)| *t)
        }
    }

    impl LayoutProbe for Fixed {
        fn viewport(&self) -> ViewportSnapshot {
            self.viewport
        }
    }

    fn page() -> Page {
        Page::new(
            EngineConfig::reference(),
            [
                SectionSpec::plain("hero"),
                SectionSpec::story("story", 2),
                SectionSpec::plain("contact"),
            ],
            &ViewportSnapshot::touch(800.0, 1200.0),
        )
        .unwrap()
    }

    fn first_schedule(fx: &Effects, kind: TimerKind) -> TimerId {
        fx.as_slice()
            .iter()
            .rev()
            .find_map(|e| match e {
                Effect::Schedule { id, .. } if id.kind == kind => Some(*id),
                _ => None,
            })
            .unwrap()
    }

    #[test]
    fn duplicate_sections_fail_to_mount() {
        let err = Page::new(
            EngineConfig::reference(),
            [SectionSpec::plain("a"), SectionSpec::plain("a")],
            &ViewportSnapshot::desktop(1280.0, 800.0),
        )
        .unwrap_err();
        assert_eq!(err, RegisterError::DuplicateSection(SectionId::from("a")));
    }

    #[test]
    fn initial_state() {
        let page = page();
        assert_eq!(page.active().unwrap(), "hero", "active starts at the first id");
        assert_eq!(page.viewport().mode, DeviceMode::TabletPortrait);
        assert!(!page.rotation_watch().get());
    }

    #[test]
    fn navigate_locks_scrolls_and_sets_fragment() {
        let mut page = page();
        let mut fx = Effects::new();
        let target = SectionId::from("contact");
        page.navigate(&target, HostTime(0), &mut fx, &mut Tracer::none())
            .unwrap();
        assert_eq!(page.active().unwrap(), "contact");
        assert_eq!(page.scroll_spy().lock_target(), Some(&target));
        let tail = &fx.as_slice()[fx.len() - 2..];
        assert_eq!(
            tail,
            &[
                Effect::ScrollTo { id: target.clone() },
                Effect::SetFragment { id: target }
            ]
        );
    }

    #[test]
    fn navigate_to_unknown_section_is_an_error() {
        let mut page = page();
        let mut fx = Effects::new();
        let err = page
            .navigate(&SectionId::from("faq"), HostTime(0), &mut fx, &mut Tracer::none())
            .unwrap_err();
        assert_eq!(err, NavigateError::UnknownSection(SectionId::from("faq")));
        assert!(fx.is_empty());
    }

    #[test]
    fn timers_route_to_their_owner() {
        let mut page = page();
        let mut fx = Effects::new();
        let probe = Fixed {
            tops: Vec::new(),
            viewport: ViewportSnapshot::touch(800.0, 1200.0),
        };
        let story = SectionId::from("story");
        page.on_visibility(&story, true, HostTime(0), &mut fx, &mut Tracer::none());
        let entrance = first_schedule(&fx, TimerKind::Entrance);
        assert!(page.on_timer(entrance, &probe, HostTime(4000), &mut fx, &mut Tracer::none()));
        assert_eq!(page.output(&story).unwrap().state, LifecycleState::Active);

        let foreign = TimerId {
            kind: TimerKind::RateLimit,
            owner: FIRST_CALLER_OWNER,
            generation: 1,
        };
        assert!(
            !page.on_timer(foreign, &probe, HostTime(4001), &mut fx, &mut Tracer::none()),
            "caller-owned limiter timers are not the page's"
        );
    }

    #[test]
    fn resize_debounce_timer_reaches_the_viewport() {
        let mut page = page();
        let mut fx = Effects::new();
        let widened = Fixed {
            tops: Vec::new(),
            viewport: ViewportSnapshot::desktop(1600.0, 900.0),
        };
        page.on_resize(HostTime(0), &mut fx, &mut Tracer::none());
        let debounce = first_schedule(&fx, TimerKind::RateLimit);
        assert_eq!(debounce.owner, RESIZE_DEBOUNCE_OWNER);

        assert!(page.on_timer(debounce, &widened, HostTime(100), &mut fx, &mut Tracer::none()));
        assert!(page.viewport().is_desktop(), "debounced resize recomputes the mode");
    }

    #[test]
    fn rotation_freezes_mode_and_skips_scroll_spy() {
        let mut page = page();
        let mut fx = Effects::new();
        let rotated = Fixed {
            tops: alloc::vec![
                (SectionId::from("hero"), -2000.0),
                (SectionId::from("story"), -1000.0),
                (SectionId::from("contact"), 0.0),
            ],
            viewport: ViewportSnapshot::touch(1200.0, 800.0),
        };

        page.on_orientation_change(HostTime(0), &mut fx, &mut Tracer::none());
        assert!(page.viewport().is_rotating);
        page.on_resize(HostTime(20), &mut fx, &mut Tracer::none());
        page.on_frame(&rotated, HostTime(30), &mut fx, &mut Tracer::none());
        assert_eq!(page.active().unwrap(), "hero", "no recalculation mid-rotation");
        assert_eq!(page.viewport().mode, DeviceMode::TabletPortrait);

        let quiet = first_schedule(&fx, TimerKind::RotationQuiet);
        let settle = first_schedule(&fx, TimerKind::RotationSettle);
        fx.clear();
        page.on_timer(quiet, &rotated, HostTime(420), &mut fx, &mut Tracer::none());
        assert!(!page.rotation_watch().get());
        assert!(
            fx.as_slice().contains(&Effect::RequestFrame),
            "scroll-spy resyncs once the rotation settles"
        );
        assert!(page.viewport().is_rotating, "mode stays frozen until the re-check");

        page.on_timer(settle, &rotated, HostTime(520), &mut fx, &mut Tracer::none());
        assert_eq!(page.viewport().mode, DeviceMode::TabletLandscape);
        assert!(!page.viewport().is_rotating);

        page.on_frame(&rotated, HostTime(530), &mut fx, &mut Tracer::none());
        assert_eq!(page.active().unwrap(), "contact");
    }

    #[test]
    fn changed_ids_are_deduplicated() {
        let mut page = page();
        let mut fx = Effects::new();
        page.on_visibility(&SectionId::from("story"), true, HostTime(0), &mut fx, &mut Tracer::none());
        page.on_focus(&SectionId::from("story"), 1, HostTime(0), &mut Tracer::none());
        let changes = page.evaluate();
        assert_eq!(changed_ids(&page, &changes), [SectionId::from("story")]);
    }

    #[test]
    fn teardown_cancels_everything() {
        let mut page = page();
        let mut fx = Effects::new();
        page.on_visibility(&SectionId::from("hero"), true, HostTime(0), &mut fx, &mut Tracer::none());
        page.navigate(&SectionId::from("contact"), HostTime(0), &mut fx, &mut Tracer::none())
            .unwrap();
        page.on_orientation_change(HostTime(0), &mut fx, &mut Tracer::none());
        fx.clear();
        page.teardown(&mut fx);
        let cancels = fx
            .as_slice()
            .iter()
            .filter(|e| matches!(e, Effect::Cancel { .. }))
            .count();
        assert_eq!(cancels, 4, "entrance, lock, settle, and quiet timers");
        assert_eq!(page.active_watch().listener_count(), 0);
    }
}
