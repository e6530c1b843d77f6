// Copyright 2026 the Sectionflow Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! One-shot `requestAnimationFrame` gate.
//!
//! [`FrameGate`] executes [`Effect::RequestFrame`]: each
//! [`request`](FrameGate::request) schedules at most one pending callback, so
//! a burst of scroll events costs one layout read. The callback receives the
//! frame's [`DOMHighResTimeStamp`][mdn] converted to millisecond
//! [`HostTime`].
//!
//! [mdn]: https://developer.mozilla.org/en-US/docs/Web/API/DOMHighResTimeStamp
//! [`Effect::RequestFrame`]: sectionflow_core::effect::Effect::RequestFrame

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use sectionflow_core::time::HostTime;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;

use crate::millis_to_host_time;

// Direct global bindings instead of `web_sys::Window` methods; avoids
// fetching the Window object on every frame.
#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = performance, js_name = "now")]
    pub(crate) fn performance_now() -> f64;

    #[wasm_bindgen(js_name = "requestAnimationFrame")]
    fn request_animation_frame(callback: &JsValue) -> i32;

    #[wasm_bindgen(js_name = "cancelAnimationFrame")]
    fn cancel_animation_frame(id: i32);
}

type RafClosure = Closure<dyn FnMut(f64)>;

struct GateInner {
    /// Registered with every request; created once.
    closure: RefCell<Option<RafClosure>>,
    /// Id of the pending request, if any.
    pending: Cell<Option<i32>>,
}

/// Coalescing one-shot animation-frame requests.
pub struct FrameGate {
    inner: Rc<GateInner>,
}

impl FrameGate {
    /// Creates a gate that calls `callback` on each requested frame.
    ///
    /// The pending flag is cleared before `callback` runs, so the callback
    /// may request the next frame.
    pub fn new(mut callback: impl FnMut(HostTime) + 'static) -> Self {
        let inner = Rc::new(GateInner {
            closure: RefCell::new(None),
            pending: Cell::new(None),
        });
        let weak = Rc::downgrade(&inner);
        let closure = Closure::wrap(Box::new(move |timestamp_ms: f64| {
            if let Some(inner) = weak.upgrade() {
                inner.pending.set(None);
            }
            callback(millis_to_host_time(timestamp_ms));
        }) as Box<dyn FnMut(f64)>);
        *inner.closure.borrow_mut() = Some(closure);
        Self { inner }
    }

    /// Requests a frame unless one is already pending.
    pub fn request(&self) {
        if self.inner.pending.get().is_some() {
            return;
        }
        if let Some(ref closure) = *self.inner.closure.borrow() {
            let id = request_animation_frame(closure.as_ref().unchecked_ref());
            self.inner.pending.set(Some(id));
        }
    }

    /// Cancels the pending frame, if any.
    pub fn cancel(&self) {
        if let Some(id) = self.inner.pending.take() {
            cancel_animation_frame(id);
        }
    }

    /// Returns `true` while a frame is pending.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.inner.pending.get().is_some()
    }
}

impl Drop for FrameGate {
    fn drop(&mut self) {
        self.cancel();
        // Drop the JS closure so it doesn't leak.
        self.inner.closure.borrow_mut().take();
    }
}

impl core::fmt::Debug for FrameGate {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FrameGate")
            .field("pending", &self.inner.pending.get())
            .finish_non_exhaustive()
    }
}
