// Copyright 2026 the Sectionflow Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Browser host for sectionflow.
//!
//! This crate executes engine effects against browser APIs:
//!
//! - [`TimeoutHost`]: `setTimeout`/`clearTimeout` for engine timers
//! - [`FrameGate`]: one-shot `requestAnimationFrame` for layout reads
//! - [`DomLayout`]: viewport and section measurement
//! - [`MediaPresenter`]: `data-lifecycle` attributes and `<video>` playback
//! - [`navigation`]: smooth scrolling and the address fragment
//! - [`PageHandle`]: the page-scoped engine singleton wiring it all together
//!
//! Time is read from `performance.now()` in whole milliseconds.

mod dispatch;
mod measure;
pub mod navigation;
mod page;
mod presenter;
mod raf;
mod timer;

pub use measure::DomLayout;
pub use page::PageHandle;
pub use presenter::{LIFECYCLE_ATTR, MediaPresenter};
pub use raf::FrameGate;
pub use sectionflow_core::backend::Presenter;
pub use timer::TimeoutHost;

use sectionflow_core::time::HostTime;
use wasm_bindgen::JsValue;

/// Returns the current host time from `performance.now()`.
#[must_use]
pub fn now() -> HostTime {
    millis_to_host_time(raf::performance_now())
}

/// Reports a failed browser call on the console. The engine keeps running.
pub(crate) fn warn(context: &str, err: &JsValue) {
    web_sys::console::warn_2(&JsValue::from_str(context), err);
}

/// Converts a `DOMHighResTimeStamp` to whole-millisecond [`HostTime`].
///
/// Negative and non-finite stamps clamp to zero.
pub(crate) fn millis_to_host_time(ms: f64) -> HostTime {
    if !ms.is_finite() || ms <= 0.0 {
        return HostTime::ZERO;
    }
    #[expect(
        clippy::cast_possible_truncation,
        reason = "checked positive and finite; page lifetimes fit in u64 milliseconds"
    )]
    let whole = ms as u64;
    HostTime(whole)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamps_truncate_to_milliseconds() {
        assert_eq!(millis_to_host_time(16.9), HostTime(16));
        assert_eq!(millis_to_host_time(4000.0), HostTime(4000));
    }

    #[test]
    fn bad_timestamps_clamp_to_zero() {
        assert_eq!(millis_to_host_time(-3.0), HostTime::ZERO);
        assert_eq!(millis_to_host_time(f64::NAN), HostTime::ZERO);
    }
}
