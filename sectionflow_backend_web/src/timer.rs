// Copyright 2026 the Sectionflow Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! `setTimeout` host for engine timers.
//!
//! [`TimeoutHost`] executes [`Effect::Schedule`] and [`Effect::Cancel`]. A
//! single JS closure serves every timer: each `setTimeout` call passes a
//! numeric token as the extra argument, and the token maps back to the
//! [`TimerId`] on fire. No closure is created or dropped per timer.
//!
//! [`Effect::Schedule`]: sectionflow_core::effect::Effect::Schedule
//! [`Effect::Cancel`]: sectionflow_core::effect::Effect::Cancel

use std::collections::BTreeMap;

use sectionflow_core::effect::TimerId;
use sectionflow_core::time::HostTime;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_name = "setTimeout")]
    fn set_timeout_with_token(callback: &JsValue, delay_ms: f64, token: f64) -> i32;

    #[wasm_bindgen(js_name = "clearTimeout")]
    fn clear_timeout(handle: i32);
}

/// Bookkeeping between engine timer ids, fire tokens, and JS handles.
#[derive(Debug, Default)]
pub(crate) struct TimerBook {
    by_id: BTreeMap<TimerId, (u64, i32)>,
    by_token: BTreeMap<u64, TimerId>,
    next_token: u64,
}

impl TimerBook {
    /// Reserves a token for `id`. Returns the JS handle of the timer this
    /// replaces, which the caller must clear.
    pub(crate) fn reserve(&mut self, id: TimerId) -> (u64, Option<i32>) {
        let replaced = self.remove(id);
        let token = self.next_token;
        self.next_token += 1;
        self.by_token.insert(token, id);
        self.by_id.insert(id, (token, -1));
        (token, replaced)
    }

    /// Records the JS handle returned for a reserved timer.
    pub(crate) fn bind(&mut self, id: TimerId, handle: i32) {
        if let Some(entry) = self.by_id.get_mut(&id) {
            entry.1 = handle;
        }
    }

    /// Forgets `id`, returning its JS handle if it was pending.
    pub(crate) fn remove(&mut self, id: TimerId) -> Option<i32> {
        let (token, handle) = self.by_id.remove(&id)?;
        self.by_token.remove(&token);
        Some(handle)
    }

    /// Resolves a fired token. Unknown tokens (cancelled or replaced) yield
    /// `None`.
    pub(crate) fn fire(&mut self, token: u64) -> Option<TimerId> {
        let id = self.by_token.remove(&token)?;
        self.by_id.remove(&id);
        Some(id)
    }

    /// Forgets everything, returning every pending JS handle.
    pub(crate) fn drain(&mut self) -> Vec<i32> {
        self.by_token.clear();
        core::mem::take(&mut self.by_id)
            .into_values()
            .map(|(_, handle)| handle)
            .collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.by_id.len()
    }
}

/// Runs engine timers on the browser's timer queue.
pub struct TimeoutHost {
    closure: Closure<dyn FnMut(f64)>,
    book: TimerBook,
}

impl TimeoutHost {
    /// Creates a host that calls `on_fire` with the token of each timer that
    /// fires. Resolve the token with [`fire`](Self::fire).
    pub fn new(mut on_fire: impl FnMut(u64) + 'static) -> Self {
        let closure = Closure::wrap(Box::new(move |token: f64| {
            #[expect(
                clippy::cast_possible_truncation,
                reason = "tokens are small non-negative integers"
            )]
            let token = token as u64;
            on_fire(token);
        }) as Box<dyn FnMut(f64)>);
        Self {
            closure,
            book: TimerBook::default(),
        }
    }

    /// Arms `id` to fire at `at`. A pending timer with the same id is
    /// replaced.
    pub fn schedule(&mut self, id: TimerId, at: HostTime, now: HostTime) {
        let (token, replaced) = self.book.reserve(id);
        if let Some(handle) = replaced {
            clear_timeout(handle);
        }
        let delay = at.saturating_duration_since(now).millis() as f64;
        // Tokens stay far below 2^53.
        let handle =
            set_timeout_with_token(self.closure.as_ref().unchecked_ref(), delay, token as f64);
        self.book.bind(id, handle);
    }

    /// Disarms `id`. Unknown ids are ignored.
    pub fn cancel(&mut self, id: TimerId) {
        if let Some(handle) = self.book.remove(id) {
            clear_timeout(handle);
        }
    }

    /// Resolves a fired token to its timer id.
    pub fn fire(&mut self, token: u64) -> Option<TimerId> {
        self.book.fire(token)
    }

    /// Disarms every pending timer.
    pub fn cancel_all(&mut self) {
        for handle in self.book.drain() {
            clear_timeout(handle);
        }
    }

    /// Number of pending timers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.book.len()
    }

    /// Returns `true` if no timer is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.book.len() == 0
    }
}

impl Drop for TimeoutHost {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

impl core::fmt::Debug for TimeoutHost {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TimeoutHost")
            .field("pending", &self.book.len())
            .finish_non_exhaustive()
    }
}
