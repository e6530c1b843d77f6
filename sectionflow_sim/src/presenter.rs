// Copyright 2026 the Sectionflow Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A presenter that remembers what it was told.

use alloc::vec::Vec;

use sectionflow_core::backend::Presenter;
use sectionflow_core::lifecycle::LifecycleOutput;
use sectionflow_core::playback::PlaybackPlan;
use sectionflow_core::section::{SectionChanges, SectionStore};

/// Mirrors the lifecycle outputs and playback plans a rendering layer would
/// hold, updated only through [`Presenter::apply`].
#[derive(Clone, Debug, Default)]
pub struct RecordingPresenter {
    outputs: Vec<Option<LifecycleOutput>>,
    plans: Vec<Option<PlaybackPlan>>,
    lifecycle_updates: usize,
    playback_updates: usize,
}

impl RecordingPresenter {
    /// Creates an empty presenter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Last lifecycle output applied for section `idx`.
    #[must_use]
    pub fn output(&self, idx: u32) -> Option<LifecycleOutput> {
        self.outputs.get(idx as usize).copied().flatten()
    }

    /// Last playback plan applied for section `idx`.
    #[must_use]
    pub fn plan(&self, idx: u32) -> Option<&PlaybackPlan> {
        self.plans.get(idx as usize)?.as_ref()
    }

    /// Total number of layers the presenter currently has playing.
    #[must_use]
    pub fn playing_layers(&self) -> usize {
        self.plans
            .iter()
            .flatten()
            .map(PlaybackPlan::playing_count)
            .sum()
    }

    /// Number of per-section lifecycle updates applied so far.
    #[must_use]
    pub fn lifecycle_updates(&self) -> usize {
        self.lifecycle_updates
    }

    /// Number of per-section playback updates applied so far.
    #[must_use]
    pub fn playback_updates(&self) -> usize {
        self.playback_updates
    }
}

fn slot<T: Default>(v: &mut Vec<T>, idx: u32) -> &mut T {
    let idx = idx as usize;
    if v.len() <= idx {
        v.resize_with(idx + 1, T::default);
    }
    &mut v[idx]
}

impl Presenter for RecordingPresenter {
    fn apply(&mut self, store: &SectionStore, changes: &SectionChanges) {
        for &idx in &changes.lifecycle {
            *slot(&mut self.outputs, idx) = store.output(idx);
            self.lifecycle_updates += 1;
        }
        for &idx in &changes.playback {
            *slot(&mut self.plans, idx) = store.playback_plan(idx);
            self.playback_updates += 1;
        }
    }
}
