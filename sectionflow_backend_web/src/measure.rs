// Copyright 2026 the Sectionflow Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! DOM measurement.
//!
//! Everything the engine reads from layout goes through [`DomLayout`], which
//! implements [`LayoutProbe`]. Decisions stay in `sectionflow_core`.

use kurbo::Size;
use sectionflow_core::id::SectionId;
use sectionflow_core::page::LayoutProbe;
use sectionflow_core::scroll_spy::SectionProbe;
use sectionflow_core::viewport::{TouchSignals, ViewportSnapshot};
use wasm_bindgen::JsValue;
use web_sys::{Document, Window};

/// Layout reads against the live document.
#[derive(Clone, Debug)]
pub struct DomLayout {
    window: Window,
    document: Document,
}

impl DomLayout {
    /// Binds to the current window.
    pub fn new() -> Result<Self, JsValue> {
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
        let document = window
            .document()
            .ok_or_else(|| JsValue::from_str("no document"))?;
        Ok(Self { window, document })
    }

    /// The bound window.
    #[must_use]
    pub fn window(&self) -> &Window {
        &self.window
    }

    /// The bound document.
    #[must_use]
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Measures the viewport and touch capabilities.
    ///
    /// Unreadable values fall back to zero or `false` so a measurement is
    /// always produced.
    #[must_use]
    pub fn snapshot(&self) -> ViewportSnapshot {
        let width = number(self.window.inner_width());
        let height = number(self.window.inner_height());
        ViewportSnapshot {
            size: Size::new(width, height),
            portrait_query: self.media_matches("(orientation: portrait)"),
            touch: TouchSignals {
                max_touch_points: self.window.navigator().max_touch_points().max(0).unsigned_abs(),
                coarse_pointer: self.media_matches("(pointer: coarse)").unwrap_or(false),
                // Only touch-capable engines can construct a TouchEvent.
                touch_events: self.document.create_event("TouchEvent").is_ok(),
            },
        }
    }

    fn media_matches(&self, query: &str) -> Option<bool> {
        let list = self.window.match_media(query).ok()??;
        Some(list.matches())
    }
}

impl SectionProbe for DomLayout {
    fn section_top(&self, id: &SectionId) -> Option<f64> {
        let el = self.document.get_element_by_id(id.as_str())?;
        Some(el.get_bounding_client_rect().top())
    }
}

impl LayoutProbe for DomLayout {
    fn viewport(&self) -> ViewportSnapshot {
        self.snapshot()
    }
}

fn number(value: Result<JsValue, JsValue>) -> f64 {
    value.ok().and_then(|v| v.as_f64()).unwrap_or(0.0)
}
