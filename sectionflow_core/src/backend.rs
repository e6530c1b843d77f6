// Copyright 2026 the Sectionflow Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Host contract for platform integrations.
//!
//! Sectionflow keeps every decision in this crate and every side effect in a
//! *host*. A host provides the following pieces:
//!
//! - **Time**: a `now() -> HostTime` free function reading a monotonic
//!   millisecond clock.
//!
//! - **Effect execution**: runs each [`Effect`] a [`Page`] call produced:
//!   real timers for `Schedule`/`Cancel`, a one-shot animation frame for
//!   `RequestFrame`, smooth scrolling and address updates for navigation.
//!   Fired timers and frames are fed back through [`Page::on_timer`] and
//!   [`Page::on_frame`].
//!
//! - **Measurement**: implements [`LayoutProbe`] by reading section
//!   positions and viewport signals.
//!
//! - **Presenter**: implements the [`Presenter`] trait to push section
//!   changes to the rendering layer.
//!
//! # Crate boundaries
//!
//! `sectionflow_core` owns the state machines, the effect model, and this
//! contract module. Host crates (the web backend, the simulator) depend on
//! `sectionflow_core` and provide platform glue.
//!
//! [`Effect`]: crate::effect::Effect
//! [`LayoutProbe`]: crate::page::LayoutProbe
//! [`Page`]: crate::page::Page
//! [`Page::on_timer`]: crate::page::Page::on_timer
//! [`Page::on_frame`]: crate::page::Page::on_frame

use crate::section::{SectionChanges, SectionStore};

/// Applies evaluated section changes to the rendering layer.
///
/// Both the DOM presenter and test doubles implement this trait.
///
/// # Event loop pseudocode
///
/// ```rust,ignore
/// fn on_intersection(id: &SectionId, visible: bool) {
///     page.on_visibility(id, visible, now(), &mut effects, &mut tracer);
///     host.run(effects.drain());
///
///     let changes = page.evaluate();
///     presenter.apply(page.sections(), &changes);
/// }
/// ```
pub trait Presenter {
    /// Applies `changes`, reading current section state from `store`.
    fn apply(&mut self, store: &SectionStore, changes: &SectionChanges);
}
