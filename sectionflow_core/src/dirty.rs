// Copyright 2026 the Sectionflow Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-section change channels.
//!
//! The section store records which sections changed using
//! [`understory_dirty`], one channel per category of change. Both channels are
//! local: marking a section never marks another, since sections are siblings
//! with no inherited state.
//!
//! Callers never query dirty state directly.
//! [`SectionStore::evaluate`](crate::section::SectionStore::evaluate) drains
//! both channels into [`SectionChanges`](crate::section::SectionChanges),
//! which presenters use to touch only the sections that moved.

use understory_dirty::Channel;

/// Lifecycle state changed; presenters re-read the section's output.
pub const LIFECYCLE: Channel = Channel::new(0);

/// Playback plan may have changed (lifecycle liveness or carousel
/// selection).
pub const PLAYBACK: Channel = Channel::new(1);
