// Copyright 2026 the Sectionflow Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Which stacked media layers should be decoding.
//!
//! A story section stacks one video layer per carousel item on top of an
//! always-present base layer, so switching items is an instant cross-fade
//! with no re-fetch. Only two layers ever decode: the base layer and the
//! layer for the selected item, and only while the section is live
//! (`Entering` or `Active`). Everything else is paused even though mounted.
//!
//! [`should_play`] is the gate; [`StoryCarousel`] holds the selected item,
//! driven by hover and focus.

use alloc::vec::Vec;

use crate::effect::Effects;
use crate::lifecycle::LifecycleState;
use crate::rate_limit::{Limiter, ThrottleLeading};
use crate::time::{Duration, HostTime};

/// Role of one media layer within a section.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LayerRole {
    /// The always-present base layer.
    Base,
    /// The layer for carousel item `index`.
    Stacked {
        /// Carousel item index.
        index: usize,
    },
}

/// Returns `true` if a layer should be decoding.
#[must_use]
pub fn should_play(state: LifecycleState, role: LayerRole, selected: usize) -> bool {
    if !state.is_live() {
        return false;
    }
    match role {
        LayerRole::Base => true,
        LayerRole::Stacked { index } => index == selected,
    }
}

/// Play/pause decision for every layer of a section.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PlaybackPlan {
    /// Whether the base layer plays.
    pub base: bool,
    /// Whether each stacked layer plays, by carousel index.
    pub stacked: Vec<bool>,
}

impl PlaybackPlan {
    /// Computes the plan for a section with `layers` stacked layers.
    #[must_use]
    pub fn compute(state: LifecycleState, selected: usize, layers: usize) -> Self {
        Self {
            base: should_play(state, LayerRole::Base, selected),
            stacked: (0..layers)
                .map(|index| should_play(state, LayerRole::Stacked { index }, selected))
                .collect(),
        }
    }

    /// Number of layers that would be decoding.
    #[must_use]
    pub fn playing_count(&self) -> usize {
        usize::from(self.base) + self.stacked.iter().filter(|p| **p).count()
    }
}

/// Selected-item state for a story carousel.
///
/// Pointer hover is throttled (leading edge) so sweeping the pointer across
/// items does not switch decoders on every item it crosses. Keyboard focus
/// and explicit selection apply immediately.
#[derive(Debug)]
pub struct StoryCarousel {
    len: usize,
    selected: usize,
    hover: ThrottleLeading<usize>,
}

impl StoryCarousel {
    /// Default hover throttle window.
    pub const HOVER_THROTTLE: Duration = Duration(150);

    /// Creates a carousel of `len` items with item 0 selected.
    #[must_use]
    pub fn new(len: usize) -> Self {
        Self::with_hover_throttle(len, Self::HOVER_THROTTLE)
    }

    /// Creates a carousel with a custom hover throttle window.
    #[must_use]
    pub fn with_hover_throttle(len: usize, throttle: Duration) -> Self {
        Self {
            len,
            selected: 0,
            hover: ThrottleLeading::new(throttle),
        }
    }

    /// Number of items.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the carousel has no items.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Currently selected item.
    #[must_use]
    pub const fn selected(&self) -> usize {
        self.selected
    }

    /// Selects `index`, clamped to the item range. Returns `true` if the
    /// selection changed.
    pub fn select(&mut self, index: usize) -> bool {
        let index = index.min(self.len.saturating_sub(1));
        if index == self.selected {
            return false;
        }
        self.selected = index;
        true
    }

    /// Handles pointer hover over item `index`.
    pub fn on_hover(&mut self, index: usize, now: HostTime) -> bool {
        // Leading throttle never schedules, so the effects sink stays empty.
        let mut unused = Effects::new();
        match self.hover.call(now, index, &mut unused) {
            Some(index) => self.select(index),
            None => false,
        }
    }

    /// Handles keyboard focus on item `index`.
    pub fn on_focus(&mut self, index: usize) -> bool {
        self.select(index)
    }
}
