// Copyright 2026 the Sectionflow Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Section lifecycle and layout stabilization for scroll-driven pages.
//!
//! `sectionflow_core` decides, for a page made of stacked full-height
//! sections, when each section animates in, when its media decodes, when its
//! resources are torn down, which section navigation UI should highlight,
//! and which device mode layout code should use. It is `no_std` compatible
//! (with `alloc`) and performs no I/O: every machine is driven by explicit
//! timestamps and answers with [`Effect`](effect::Effect)s for a host to run.
//!
//! # Architecture
//!
//! ```text
//!   Host (DOM events, timers, frames)
//!       │
//!       ▼
//!   Page::on_* ──► RotationTracker ──► Watch<bool> ─┐
//!       │                                           ▼
//!       ├──────────► ViewportClassifier ◄───────────┤
//!       ├──────────► ScrollSpy ◄────────────────────┘
//!       └──────────► SectionStore (SectionLifecycle × N)
//!                         │
//!                         ▼
//!   Page::evaluate() ──► SectionChanges ──► Presenter::apply()
//! ```
//!
//! **[`lifecycle`]**: Per-section `Idle → Entering → Active → Preserving →
//! Cleaned` machine with a pure edge table.
//!
//! **[`playback`]**: Which media layers decode, and the story carousel's
//! selected item.
//!
//! **[`section`]**: Section registry with dirty-channel change tracking.
//!
//! **[`scroll_spy`]**: Active-section tracking with a navigation lock.
//!
//! **[`viewport`]**: Device-mode classification that freezes during
//! rotation.
//!
//! **[`rotation`]**: Owner of the "rotation in flight" signal.
//!
//! **[`rate_limit`]**: Debounce and leading/trailing throttle.
//!
//! **[`page`]**: The orchestrator hosts talk to.
//!
//! **[`effect`]** / **[`signal`]** / **[`time`]**: Plumbing shared by the
//! machines.
//!
//! **[`trace`]**: [`TraceSink`](trace::TraceSink) trait and event types,
//! with zero-overhead [`Tracer`](trace::Tracer) wrapper.
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in dependencies.
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one branch
//!   per call site).

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod backend;
pub mod config;
pub mod dirty;
pub mod effect;
pub mod id;
pub mod lifecycle;
pub mod page;
pub mod playback;
pub mod rate_limit;
pub mod rotation;
pub mod scroll_spy;
pub mod section;
pub mod signal;
pub mod time;
pub mod trace;
pub mod viewport;
