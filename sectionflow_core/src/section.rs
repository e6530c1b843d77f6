// Copyright 2026 the Sectionflow Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Section registry with per-section lifecycles and change tracking.
//!
//! Sections are registered once at mount, in document order, and never
//! reordered. Each gets a dense `u32` index that also serves as the owner of
//! its lifecycle timers, so a fired [`TimerId`] routes straight back to its
//! section.
//!
//! Mutations mark the affected section on the [`dirty`](crate::dirty)
//! channels. [`SectionStore::evaluate`] drains them into [`SectionChanges`]:
//!
//! 1. **LIFECYCLE**: sections whose state changed since the last evaluate.
//! 2. **PLAYBACK**: sections whose [`PlaybackPlan`] may differ (liveness
//!    flipped, or the carousel selection moved).
//!
//! Like the rest of the crate, [`SectionChanges`] carries raw indices so
//! presenters can index straight into their own per-section tables.

use alloc::collections::BTreeMap;
use alloc::vec::Vec;
use core::fmt;

use understory_dirty::{CycleHandling, DirtyTracker};

use crate::dirty;
use crate::effect::{Effects, TimerId, TimerKind};
use crate::id::SectionId;
use crate::lifecycle::{LifecycleConfig, LifecycleOutput, SectionLifecycle, Transition};
use crate::playback::{PlaybackPlan, StoryCarousel};
use crate::time::HostTime;

/// Declaration of one section at mount.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SectionSpec {
    /// Stable id.
    pub id: SectionId,
    /// Number of stacked carousel layers; 0 for sections without a story
    /// carousel.
    pub story_layers: usize,
}

impl SectionSpec {
    /// A section without stacked media.
    #[must_use]
    pub fn plain(id: impl Into<SectionId>) -> Self {
        Self {
            id: id.into(),
            story_layers: 0,
        }
    }

    /// A story section with `layers` stacked carousel layers.
    #[must_use]
    pub fn story(id: impl Into<SectionId>, layers: usize) -> Self {
        Self {
            id: id.into(),
            story_layers: layers,
        }
    }
}

/// Error returned by [`SectionStore::register`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RegisterError {
    /// A section with this id is already registered.
    DuplicateSection(SectionId),
}

impl fmt::Display for RegisterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateSection(id) => write!(f, "section `{id}` is already registered"),
        }
    }
}

impl core::error::Error for RegisterError {}

/// Sections that changed since the previous [`SectionStore::evaluate`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SectionChanges {
    /// Sections whose lifecycle state changed.
    pub lifecycle: Vec<u32>,
    /// Sections whose playback plan may have changed.
    pub playback: Vec<u32>,
}

impl SectionChanges {
    /// Clears both lists.
    pub fn clear(&mut self) {
        self.lifecycle.clear();
        self.playback.clear();
    }

    /// Returns `true` if nothing changed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lifecycle.is_empty() && self.playback.is_empty()
    }
}

/// Registry of mounted sections.
#[derive(Debug)]
pub struct SectionStore {
    config: LifecycleConfig,
    ids: Vec<SectionId>,
    index: BTreeMap<SectionId, u32>,
    lifecycles: Vec<SectionLifecycle>,
    carousels: Vec<Option<StoryCarousel>>,
    dirty: DirtyTracker<u32>,
}

impl SectionStore {
    /// Creates an empty store whose sections use `config`.
    #[must_use]
    pub fn new(config: LifecycleConfig) -> Self {
        Self {
            config,
            ids: Vec::new(),
            index: BTreeMap::new(),
            lifecycles: Vec::new(),
            carousels: Vec::new(),
            dirty: DirtyTracker::with_cycle_handling(CycleHandling::Error),
        }
    }

    /// Registers a section and returns its index.
    pub fn register(&mut self, spec: SectionSpec) -> Result<u32, RegisterError> {
        if self.index.contains_key(&spec.id) {
            return Err(RegisterError::DuplicateSection(spec.id));
        }
        #[expect(
            clippy::cast_possible_truncation,
            reason = "a page never holds anywhere near u32::MAX sections"
        )]
        let idx = self.ids.len() as u32;
        self.index.insert(spec.id.clone(), idx);
        self.ids.push(spec.id);
        self.lifecycles.push(SectionLifecycle::new(self.config, idx));
        self.carousels
            .push((spec.story_layers > 0).then(|| StoryCarousel::new(spec.story_layers)));
        Ok(idx)
    }

    /// Number of registered sections.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Returns `true` if no section is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Section ids in document order.
    #[must_use]
    pub fn ids(&self) -> &[SectionId] {
        &self.ids
    }

    /// Looks up a section's index.
    #[must_use]
    pub fn index_of(&self, id: &SectionId) -> Option<u32> {
        self.index.get(id).copied()
    }

    /// Returns the id at `idx`.
    #[must_use]
    pub fn id_at(&self, idx: u32) -> Option<&SectionId> {
        self.ids.get(idx as usize)
    }

    /// Returns the lifecycle controller at `idx`.
    #[must_use]
    pub fn lifecycle(&self, idx: u32) -> Option<&SectionLifecycle> {
        self.lifecycles.get(idx as usize)
    }

    /// Returns the rendering-layer view of the section at `idx`.
    #[must_use]
    pub fn output(&self, idx: u32) -> Option<LifecycleOutput> {
        self.lifecycle(idx).map(SectionLifecycle::output)
    }

    /// Returns the story carousel at `idx`, if the section has one.
    #[must_use]
    pub fn carousel(&self, idx: u32) -> Option<&StoryCarousel> {
        self.carousels.get(idx as usize)?.as_ref()
    }

    /// Returns the current play/pause plan for the section at `idx`.
    #[must_use]
    pub fn playback_plan(&self, idx: u32) -> Option<PlaybackPlan> {
        let lifecycle = self.lifecycle(idx)?;
        let (selected, layers) = self
            .carousel(idx)
            .map_or((0, 0), |c| (c.selected(), c.len()));
        Some(PlaybackPlan::compute(lifecycle.state(), selected, layers))
    }

    /// Feeds the visibility signal for the section at `idx`.
    pub fn set_visible(
        &mut self,
        idx: u32,
        visible: bool,
        now: HostTime,
        effects: &mut Effects,
    ) -> Option<Transition> {
        let transition = self
            .lifecycles
            .get_mut(idx as usize)?
            .set_visible(visible, now, effects)?;
        self.mark_transition(idx, &transition);
        Some(transition)
    }

    /// Routes a fired lifecycle timer to its section.
    ///
    /// Returns the section index and the transition, or `None` for ids that
    /// are not lifecycle timers or are no longer current.
    pub fn on_timer(
        &mut self,
        id: TimerId,
        now: HostTime,
        effects: &mut Effects,
    ) -> Option<(u32, Transition)> {
        if !matches!(id.kind, TimerKind::Entrance | TimerKind::Preservation) {
            return None;
        }
        let idx = id.owner;
        let transition = self
            .lifecycles
            .get_mut(idx as usize)?
            .on_timer(id, now, effects)?;
        self.mark_transition(idx, &transition);
        Some((idx, transition))
    }

    /// Pointer hover over carousel item `item` of the section at `idx`.
    /// Returns `true` if the selection changed.
    pub fn on_hover(&mut self, idx: u32, item: usize, now: HostTime) -> bool {
        self.with_carousel(idx, |c| c.on_hover(item, now))
    }

    /// Keyboard focus on carousel item `item` of the section at `idx`.
    /// Returns `true` if the selection changed.
    pub fn on_focus(&mut self, idx: u32, item: usize) -> bool {
        self.with_carousel(idx, |c| c.on_focus(item))
    }

    /// Drains the change channels.
    pub fn evaluate(&mut self) -> SectionChanges {
        let mut changes = SectionChanges::default();
        self.evaluate_into(&mut changes);
        changes
    }

    /// Like [`evaluate`](Self::evaluate), but reuses a caller-provided buffer.
    pub fn evaluate_into(&mut self, changes: &mut SectionChanges) {
        changes.clear();
        changes.lifecycle = self
            .dirty
            .drain(dirty::LIFECYCLE)
            .deterministic()
            .run()
            .collect();
        changes.playback = self
            .dirty
            .drain(dirty::PLAYBACK)
            .deterministic()
            .run()
            .collect();
    }

    /// Cancels every section's pending timers.
    pub fn unmount_all(&mut self, effects: &mut Effects) {
        for lifecycle in &mut self.lifecycles {
            lifecycle.unmount(effects);
        }
    }

    fn mark_transition(&mut self, idx: u32, transition: &Transition) {
        self.dirty.mark(idx, dirty::LIFECYCLE);
        if transition.from.is_live() != transition.to.is_live() {
            self.dirty.mark(idx, dirty::PLAYBACK);
        }
    }

    fn with_carousel(&mut self, idx: u32, f: impl FnOnce(&mut StoryCarousel) -> bool) -> bool {
        let Some(Some(carousel)) = self.carousels.get_mut(idx as usize) else {
            return false;
        };
        let changed = f(carousel);
        if changed {
            self.dirty.mark(idx, dirty::PLAYBACK);
        }
        changed
    }
}
