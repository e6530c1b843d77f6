// Copyright 2026 the Sectionflow Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! DOM presenter for section state and media playback.
//!
//! Applies [`SectionChanges`] incrementally:
//!
//! - lifecycle changes set `data-lifecycle` on the section root (the element
//!   whose id is the section id), which stylesheets key entrance animations
//!   and preserved styling on;
//! - playback changes play or pause the section's `<video>` layers.
//!
//! Layers are found by attribute inside the section root:
//! `video[data-layer="base"]` for the background layer, and
//! `video[data-layer="stack"]` in document order for carousel layers.

use sectionflow_core::backend::Presenter;
use sectionflow_core::playback::PlaybackPlan;
use sectionflow_core::section::{SectionChanges, SectionStore};
use wasm_bindgen::JsCast as _;
use web_sys::{Document, Element, HtmlMediaElement};

/// Attribute carrying the lifecycle state.
pub const LIFECYCLE_ATTR: &str = "data-lifecycle";

const BASE_SELECTOR: &str = r#"video[data-layer="base"]"#;
const STACK_SELECTOR: &str = r#"video[data-layer="stack"]"#;

struct SectionMedia {
    root: Element,
    base: Option<HtmlMediaElement>,
    stacked: Vec<HtmlMediaElement>,
}

impl SectionMedia {
    fn find(document: &Document, id: &str) -> Option<Self> {
        let root = document.get_element_by_id(id)?;
        let base = root
            .query_selector(BASE_SELECTOR)
            .ok()
            .flatten()
            .and_then(|el| el.dyn_into().ok());
        let mut stacked = Vec::new();
        if let Ok(list) = root.query_selector_all(STACK_SELECTOR) {
            for i in 0..list.length() {
                if let Some(media) = list.item(i).and_then(|n| n.dyn_into().ok()) {
                    stacked.push(media);
                }
            }
        }
        Some(Self {
            root,
            base,
            stacked,
        })
    }

    fn apply_plan(&self, plan: &PlaybackPlan) {
        if let Some(base) = &self.base {
            set_playing(base, plan.base);
        }
        for (media, &play) in self.stacked.iter().zip(&plan.stacked) {
            set_playing(media, play);
        }
    }
}

fn set_playing(media: &HtmlMediaElement, play: bool) {
    if play {
        if media.paused() {
            // Autoplay refusals reject the returned promise asynchronously;
            // the page decides how to surface those.
            if let Err(err) = media.play() {
                crate::warn("sectionflow: media layer did not start", &err);
            }
        }
    } else if !media.paused()
        && let Err(err) = media.pause()
    {
        crate::warn("sectionflow: media layer did not pause", &err);
    }
}

/// Applies section state to the live DOM.
///
/// Section elements are resolved lazily on first change and cached; a
/// section whose element is missing is retried on its next change.
pub struct MediaPresenter {
    document: Document,
    sections: Vec<Option<SectionMedia>>,
}

impl core::fmt::Debug for MediaPresenter {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MediaPresenter")
            .field("document", &"Document")
            .field("resolved", &self.sections.iter().flatten().count())
            .finish()
    }
}

impl MediaPresenter {
    /// Creates a presenter over `document`.
    #[must_use]
    pub fn new(document: Document) -> Self {
        Self {
            document,
            sections: Vec::new(),
        }
    }

    /// Pauses every resolved layer.
    pub fn pause_all(&self) {
        for media in self.sections.iter().flatten() {
            for layer in media.base.iter().chain(&media.stacked) {
                set_playing(layer, false);
            }
        }
    }

    fn resolve(&mut self, store: &SectionStore, idx: u32) -> Option<&SectionMedia> {
        let slot = idx as usize;
        if self.sections.len() <= slot {
            self.sections.resize_with(slot + 1, || None);
        }
        if self.sections[slot].is_none() {
            let id = store.id_at(idx)?;
            self.sections[slot] = SectionMedia::find(&self.document, id.as_str());
        }
        self.sections[slot].as_ref()
    }
}

impl Presenter for MediaPresenter {
    fn apply(&mut self, store: &SectionStore, changes: &SectionChanges) {
        for &idx in &changes.lifecycle {
            let Some(output) = store.output(idx) else {
                continue;
            };
            if let Some(media) = self.resolve(store, idx)
                && let Err(err) = media
                    .root
                    .set_attribute(LIFECYCLE_ATTR, output.state.as_str())
            {
                crate::warn("sectionflow: lifecycle attribute not set", &err);
            }
        }
        for &idx in &changes.playback {
            let Some(plan) = store.playback_plan(idx) else {
                continue;
            };
            if let Some(media) = self.resolve(store, idx) {
                media.apply_plan(&plan);
            }
        }
    }
}
