// Copyright 2026 the Sectionflow Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Navigation side effects: smooth scrolling and the address fragment.

use sectionflow_core::id::SectionId;
use wasm_bindgen::JsValue;
use web_sys::{Document, ScrollBehavior, ScrollIntoViewOptions, ScrollLogicalPosition, Window};

/// Smoothly scrolls the section's element to the top of the viewport.
///
/// Returns `false` if the section has no element.
pub fn scroll_to_section(document: &Document, id: &SectionId) -> bool {
    let Some(el) = document.get_element_by_id(id.as_str()) else {
        return false;
    };
    let options = ScrollIntoViewOptions::new();
    options.set_behavior(ScrollBehavior::Smooth);
    options.set_block(ScrollLogicalPosition::Start);
    el.scroll_into_view_with_scroll_into_view_options(&options);
    true
}

/// Replaces the address fragment with `#id` without adding a history entry.
pub fn set_fragment(window: &Window, id: &SectionId) -> Result<(), JsValue> {
    let url = fragment_url(id);
    window
        .history()?
        .replace_state_with_url(&JsValue::NULL, "", Some(&url))
}

fn fragment_url(id: &SectionId) -> String {
    format!("#{id}")
}
