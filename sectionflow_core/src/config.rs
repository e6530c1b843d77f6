// Copyright 2026 the Sectionflow Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Engine-wide configuration.

use crate::lifecycle::LifecycleConfig;
use crate::scroll_spy::ScrollSpyConfig;
use crate::viewport::ViewportConfig;

/// Configuration for a [`Page`](crate::page::Page).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EngineConfig {
    /// Entrance and preservation durations.
    pub lifecycle: LifecycleConfig,
    /// Scroll-spy offset and lock timeout.
    pub scroll_spy: ScrollSpyConfig,
    /// Tablet bounds and rotation settle timing.
    pub viewport: ViewportConfig,
}

impl EngineConfig {
    /// Reference tuning for every component.
    #[must_use]
    pub const fn reference() -> Self {
        Self {
            lifecycle: LifecycleConfig::reference(),
            scroll_spy: ScrollSpyConfig::reference(),
            viewport: ViewportConfig::reference(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::reference()
    }
}
