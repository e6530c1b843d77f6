// Copyright 2026 the Sectionflow Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Fake-clock host.
//!
//! [`SimHost`] executes every [`Effect`] a [`Page`] produces against a
//! simulated clock:
//!
//! - `Schedule`/`Cancel` go into an ordered timer queue.
//! - `RequestFrame` marks a frame due on the next 16 ms grid point.
//! - `ScrollTo` starts a linear smooth-scroll animation stepped once per
//!   frame; each step emits a scroll event, like a browser does.
//! - `SetFragment` records the address fragment.
//!
//! After each input or callback the host drains section changes into its
//! [`RecordingPresenter`], and re-derives section visibility from geometry
//! whenever the scroll offset or viewport moves.
//!
//! Timers due at the same instant as a frame fire first.

use alloc::collections::BTreeMap;
use alloc::vec::Vec;

use sectionflow_core::backend::Presenter;
use sectionflow_core::effect::{Effect, Effects, TimerId};
use sectionflow_core::id::SectionId;
use sectionflow_core::page::{NavigateError, Page};
use sectionflow_core::time::{Duration, HostTime};
use sectionflow_core::trace::{NoopSink, TraceSink, Tracer};
use sectionflow_core::viewport::ViewportSnapshot;

use crate::layout::SimLayout;
use crate::presenter::RecordingPresenter;

/// Spacing of the simulated display's frames.
pub const FRAME_INTERVAL: Duration = Duration(16);

/// Default length of a smooth scroll.
pub const SCROLL_DURATION: Duration = Duration(600);

#[derive(Clone, Copy, Debug)]
struct ScrollAnimation {
    from: f64,
    to: f64,
    start: HostTime,
    duration: Duration,
}

impl ScrollAnimation {
    fn position(&self, now: HostTime) -> (f64, bool) {
        let elapsed = now.saturating_duration_since(self.start).millis();
        let total = self.duration.millis();
        if elapsed >= total {
            return (self.to, true);
        }
        let t = elapsed as f64 / total as f64;
        (self.from + (self.to - self.from) * t, false)
    }
}

/// Deterministic host for one page.
#[derive(Debug)]
pub struct SimHost<S = NoopSink> {
    page: Page,
    layout: SimLayout,
    presenter: RecordingPresenter,
    sink: S,
    effects: Effects,
    now: HostTime,
    timers: BTreeMap<(HostTime, u64), TimerId>,
    seq: u64,
    frame_pending: bool,
    last_frame: Option<HostTime>,
    scroll: Option<ScrollAnimation>,
    scroll_duration: Duration,
    fragment: Option<SectionId>,
    scroll_requests: Vec<SectionId>,
    frames: u64,
}

impl SimHost<NoopSink> {
    /// Creates an untraced host at t = 0.
    #[must_use]
    pub fn new(page: Page, layout: SimLayout) -> Self {
        Self::with_sink(page, layout, NoopSink)
    }
}

impl<S: TraceSink> SimHost<S> {
    /// Creates a host at t = 0 that traces into `sink`.
    #[must_use]
    pub fn with_sink(page: Page, layout: SimLayout, sink: S) -> Self {
        Self {
            page,
            layout,
            presenter: RecordingPresenter::new(),
            sink,
            effects: Effects::new(),
            now: HostTime::ZERO,
            timers: BTreeMap::new(),
            seq: 0,
            frame_pending: false,
            last_frame: None,
            scroll: None,
            scroll_duration: SCROLL_DURATION,
            fragment: None,
            scroll_requests: Vec::new(),
            frames: 0,
        }
    }

    /// Sets how long navigation scrolls take.
    #[must_use]
    pub fn with_scroll_duration(mut self, duration: Duration) -> Self {
        self.scroll_duration = duration;
        self
    }

    // -- Accessors --

    /// Current simulated time.
    #[must_use]
    pub fn now(&self) -> HostTime {
        self.now
    }

    /// The page under test.
    #[must_use]
    pub fn page(&self) -> &Page {
        &self.page
    }

    /// The simulated geometry.
    #[must_use]
    pub fn layout(&self) -> &SimLayout {
        &self.layout
    }

    /// What the rendering layer has been told.
    #[must_use]
    pub fn presenter(&self) -> &RecordingPresenter {
        &self.presenter
    }

    /// The trace sink.
    #[must_use]
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Consumes the host and returns the trace sink.
    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Address fragment last set by navigation.
    #[must_use]
    pub fn fragment(&self) -> Option<&SectionId> {
        self.fragment.as_ref()
    }

    /// Every `ScrollTo` target received, in order.
    #[must_use]
    pub fn scroll_requests(&self) -> &[SectionId] {
        &self.scroll_requests
    }

    /// Number of outstanding timers.
    #[must_use]
    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    /// Number of frames run so far.
    #[must_use]
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Returns `true` while a navigation scroll is animating.
    #[must_use]
    pub fn is_scrolling(&self) -> bool {
        self.scroll.is_some()
    }

    // -- Input --

    /// Delivers the initial intersection callbacks.
    pub fn observe(&mut self) {
        self.sync_visibility();
        self.flush();
    }

    /// Jumps the scroll offset (user scroll) and delivers a scroll event.
    pub fn scroll_to(&mut self, y: f64) {
        self.layout.set_scroll_y(y);
        self.sync_visibility();
        self.page.on_scroll(&mut self.effects);
        self.flush();
    }

    /// Removes a section's element from the layout, as if it never rendered.
    pub fn remove_element(&mut self, id: &SectionId) {
        self.layout.remove_element(id);
        self.sync_visibility();
        self.flush();
    }

    /// Overrides one section's visibility signal directly.
    pub fn set_visible(&mut self, id: &SectionId, visible: bool) {
        let mut tracer = Tracer::new(&mut self.sink);
        self.page
            .on_visibility(id, visible, self.now, &mut self.effects, &mut tracer);
        self.flush();
    }

    /// Requests navigation to `id`.
    pub fn navigate(&mut self, id: &SectionId) -> Result<(), NavigateError> {
        let mut tracer = Tracer::new(&mut self.sink);
        let result = self
            .page
            .navigate(id, self.now, &mut self.effects, &mut tracer);
        self.flush();
        result
    }

    /// Delivers a resize event with a new viewport measurement.
    pub fn resize(&mut self, viewport: ViewportSnapshot) {
        self.layout.set_viewport(viewport);
        let mut tracer = Tracer::new(&mut self.sink);
        self.page.on_resize(self.now, &mut self.effects, &mut tracer);
        self.sync_visibility();
        self.flush();
    }

    /// Delivers an `orientationchange` event with a new viewport measurement.
    pub fn orientation_change(&mut self, viewport: ViewportSnapshot) {
        self.layout.set_viewport(viewport);
        let mut tracer = Tracer::new(&mut self.sink);
        self.page
            .on_orientation_change(self.now, &mut self.effects, &mut tracer);
        self.sync_visibility();
        self.flush();
    }

    /// Pointer hover over a carousel item.
    pub fn hover(&mut self, id: &SectionId, item: usize) -> bool {
        let mut tracer = Tracer::new(&mut self.sink);
        let changed = self.page.on_hover(id, item, self.now, &mut tracer);
        self.flush();
        changed
    }

    /// Keyboard focus on a carousel item.
    pub fn focus(&mut self, id: &SectionId, item: usize) -> bool {
        let mut tracer = Tracer::new(&mut self.sink);
        let changed = self.page.on_focus(id, item, self.now, &mut tracer);
        self.flush();
        changed
    }

    /// Unmounts the page.
    pub fn teardown(&mut self) {
        self.page.teardown(&mut self.effects);
        self.scroll = None;
        self.frame_pending = false;
        self.flush();
    }

    // -- Time --

    /// Advances the clock by `d`, running every timer and frame due.
    pub fn advance(&mut self, d: Duration) {
        self.advance_to(self.now + d);
    }

    /// Advances the clock to `target`, running every timer and frame due.
    pub fn advance_to(&mut self, target: HostTime) {
        while let Some((at, is_timer)) = self.next_event().filter(|(at, _)| *at <= target) {
            self.now = self.now.max(at);
            if is_timer {
                self.fire_next_timer();
            } else {
                self.run_frame();
            }
        }
        self.now = self.now.max(target);
    }

    fn next_event(&self) -> Option<(HostTime, bool)> {
        let timer = self.timers.keys().next().map(|(at, _)| *at);
        let frame = (self.frame_pending || self.scroll.is_some()).then(|| self.next_frame_at());
        match (timer, frame) {
            (Some(t), Some(f)) if f < t => Some((f, false)),
            (Some(t), _) => Some((t, true)),
            (None, Some(f)) => Some((f, false)),
            (None, None) => None,
        }
    }

    /// First grid point at or after `now` that has not run yet.
    fn next_frame_at(&self) -> HostTime {
        let grid = FRAME_INTERVAL.millis();
        let next = HostTime(self.now.millis().div_ceil(grid) * grid);
        match self.last_frame {
            Some(last) if last >= next => last + FRAME_INTERVAL,
            _ => next,
        }
    }

    fn fire_next_timer(&mut self) {
        let Some((_, id)) = self.timers.pop_first() else {
            return;
        };
        let mut tracer = Tracer::new(&mut self.sink);
        self.page
            .on_timer(id, &self.layout, self.now, &mut self.effects, &mut tracer);
        self.flush();
    }

    fn run_frame(&mut self) {
        self.frames += 1;
        self.last_frame = Some(self.now);

        if let Some(anim) = self.scroll {
            let (y, done) = anim.position(self.now);
            self.layout.set_scroll_y(y);
            if done {
                self.scroll = None;
            }
            self.sync_visibility();
            self.page.on_scroll(&mut self.effects);
            self.flush();
        }

        if self.frame_pending {
            self.frame_pending = false;
            let mut tracer = Tracer::new(&mut self.sink);
            self.page
                .on_frame(&self.layout, self.now, &mut self.effects, &mut tracer);
            self.flush();
        }
    }

    fn sync_visibility(&mut self) {
        let mut tracer = Tracer::new(&mut self.sink);
        for (id, visible) in self.layout.intersections() {
            self.page
                .on_visibility(id, visible, self.now, &mut self.effects, &mut tracer);
        }
    }

    fn flush(&mut self) {
        loop {
            let mut unreachable = Vec::new();
            for effect in self.effects.drain() {
                match effect {
                    Effect::Schedule { id, at } => {
                        self.timers.insert((at, self.seq), id);
                        self.seq += 1;
                    }
                    Effect::Cancel { id } => self.timers.retain(|_, t| *t != id),
                    Effect::RequestFrame => self.frame_pending = true,
                    Effect::ScrollTo { id } => {
                        match self.layout.document_top(&id) {
                            Some(top) => {
                                self.scroll = Some(ScrollAnimation {
                                    from: self.layout.scroll_y(),
                                    to: top.min(self.layout.max_scroll()),
                                    start: self.now,
                                    duration: self.scroll_duration,
                                });
                            }
                            None => unreachable.push(id.clone()),
                        }
                        self.scroll_requests.push(id);
                    }
                    Effect::SetFragment { id } => self.fragment = Some(id),
                }
            }
            if unreachable.is_empty() {
                break;
            }
            let mut tracer = Tracer::new(&mut self.sink);
            for id in &unreachable {
                self.page
                    .on_scroll_unavailable(id, self.now, &mut self.effects, &mut tracer);
            }
        }
        let changes = self.page.evaluate();
        if !changes.is_empty() {
            self.presenter.apply(self.page.sections(), &changes);
        }
    }
}
