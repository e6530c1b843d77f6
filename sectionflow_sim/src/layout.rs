// Copyright 2026 the Sectionflow Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Simulated page geometry.

use alloc::vec::Vec;

use kurbo::{Rect, Size};
use sectionflow_core::id::SectionId;
use sectionflow_core::page::LayoutProbe;
use sectionflow_core::scroll_spy::SectionProbe;
use sectionflow_core::viewport::ViewportSnapshot;

/// Sections stacked top to bottom in document coordinates, plus a viewport
/// scrolled to `scroll_y`.
#[derive(Clone, Debug)]
pub struct SimLayout {
    ids: Vec<SectionId>,
    boxes: Vec<Option<Rect>>,
    scroll_y: f64,
    viewport: ViewportSnapshot,
}

impl SimLayout {
    /// Stacks sections with the given heights, in order, at full viewport
    /// width.
    #[must_use]
    pub fn stacked(sections: &[(&str, f64)], viewport: ViewportSnapshot) -> Self {
        let mut y = 0.0;
        let mut ids = Vec::with_capacity(sections.len());
        let mut boxes = Vec::with_capacity(sections.len());
        for &(id, height) in sections {
            ids.push(SectionId::from(id));
            boxes.push(Some(Rect::new(0.0, y, viewport.size.width, y + height)));
            y += height;
        }
        Self {
            ids,
            boxes,
            scroll_y: 0.0,
            viewport,
        }
    }

    /// Stacks sections of equal `height`.
    #[must_use]
    pub fn uniform(ids: &[&str], height: f64, viewport: ViewportSnapshot) -> Self {
        let sections: Vec<(&str, f64)> = ids.iter().map(|id| (*id, height)).collect();
        Self::stacked(&sections, viewport)
    }

    /// Section ids in document order.
    #[must_use]
    pub fn ids(&self) -> &[SectionId] {
        &self.ids
    }

    /// Current scroll offset.
    #[must_use]
    pub fn scroll_y(&self) -> f64 {
        self.scroll_y
    }

    /// Largest reachable scroll offset.
    #[must_use]
    pub fn max_scroll(&self) -> f64 {
        let bottom = self
            .boxes
            .iter()
            .flatten()
            .map(|r| r.y1)
            .fold(0.0, f64::max);
        (bottom - self.viewport.size.height).max(0.0)
    }

    /// Scrolls to `y`, clamped to the reachable range.
    pub fn set_scroll_y(&mut self, y: f64) {
        self.scroll_y = y.clamp(0.0, self.max_scroll());
    }

    /// Replaces the viewport measurement (resize or rotation).
    ///
    /// Section heights are kept; the scroll offset is re-clamped.
    pub fn set_viewport(&mut self, viewport: ViewportSnapshot) {
        self.viewport = viewport;
        for r in self.boxes.iter_mut().flatten() {
            r.x1 = viewport.size.width;
        }
        self.set_scroll_y(self.scroll_y);
    }

    /// Removes a section's element, as if it had not rendered.
    pub fn remove_element(&mut self, id: &SectionId) {
        if let Some(i) = self.position(id) {
            self.boxes[i] = None;
        }
    }

    /// Document-space top of a section's element.
    #[must_use]
    pub fn document_top(&self, id: &SectionId) -> Option<f64> {
        self.boxes[self.position(id)?].map(|r| r.y0)
    }

    /// The visible document region.
    #[must_use]
    pub fn viewport_rect(&self) -> Rect {
        Rect::from_origin_size((0.0, self.scroll_y), self.viewport.size)
    }

    /// Whether each section's element currently overlaps the viewport.
    ///
    /// Edge contact does not count, matching a zero-threshold intersection
    /// observer.
    pub fn intersections(&self) -> impl Iterator<Item = (&SectionId, bool)> + '_ {
        let view = self.viewport_rect();
        self.ids.iter().zip(&self.boxes).map(move |(id, r)| {
            let hit = r.is_some_and(|r| r.y0 < view.y1 && view.y0 < r.y1);
            (id, hit)
        })
    }

    /// Viewport size.
    #[must_use]
    pub fn size(&self) -> Size {
        self.viewport.size
    }

    fn position(&self, id: &SectionId) -> Option<usize> {
        self.ids.iter().position(|s| s == id)
    }
}

impl SectionProbe for SimLayout {
    fn section_top(&self, id: &SectionId) -> Option<f64> {
        self.document_top(id).map(|top| top - self.scroll_y)
    }
}

impl LayoutProbe for SimLayout {
    fn viewport(&self) -> ViewportSnapshot {
        self.viewport
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> SimLayout {
        SimLayout::stacked(
            &[("hero", 800.0), ("story", 1600.0), ("contact", 600.0)],
            ViewportSnapshot::desktop(1280.0, 800.0),
        )
    }

    #[test]
    fn tops_are_relative_to_scroll() {
        let mut l = layout();
        l.set_scroll_y(1000.0);
        assert_eq!(l.section_top(&SectionId::from("story")), Some(-200.0));
        assert_eq!(l.section_top(&SectionId::from("contact")), Some(1400.0));
    }

    #[test]
    fn scroll_is_clamped() {
        let mut l = layout();
        l.set_scroll_y(1e9);
        assert_eq!(l.scroll_y(), 2200.0, "document is 3000 tall, viewport 800");
        l.set_scroll_y(-5.0);
        assert_eq!(l.scroll_y(), 0.0);
    }

    #[test]
    fn intersections_exclude_edge_contact() {
        let l = layout();
        let hits: Vec<bool> = l.intersections().map(|(_, hit)| hit).collect();
        assert_eq!(hits, [true, false, false], "story starts exactly at the fold");
    }

    #[test]
    fn removed_elements_are_not_measurable() {
        let mut l = layout();
        let story = SectionId::from("story");
        l.remove_element(&story);
        assert_eq!(l.section_top(&story), None);
        assert!(!l.intersections().any(|(id, hit)| *id == story && hit));
    }
}
