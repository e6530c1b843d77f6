// Copyright 2026 the Sectionflow Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Deterministic host for driving a [`Page`](sectionflow_core::page::Page)
//! without a browser.
//!
//! - [`layout::SimLayout`]: vertically stacked section boxes and a scrollable
//!   viewport, answering layout reads and intersection queries.
//! - [`host::SimHost`]: fake millisecond clock with a timer queue, a 16 ms
//!   frame grid, and smooth-scroll animation for navigation.
//! - [`presenter::RecordingPresenter`]: a presenter that mirrors what a
//!   real rendering layer would have been told.
//!
//! Everything advances only when the caller asks, so a scenario replays
//! identically every run.

#![no_std]

extern crate alloc;

pub mod host;
pub mod layout;
pub mod presenter;

#[cfg(test)]
mod scenarios;
