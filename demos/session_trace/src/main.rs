// Copyright 2026 the Sectionflow Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Simulated browsing session that exercises the tracing and diagnostics
//! pipeline.
//!
//! Drives a five-section landing page through a
//! [`SimHost`](sectionflow_sim::host::SimHost): initial load, organic scrolling,
//! carousel hovering, navigation from the menu, a tablet rotation with a
//! resize storm, and unmount. Every event goes to both a
//! [`PrettyPrintSink`](sectionflow_debug::pretty::PrettyPrintSink) on stdout
//! and a [`RecorderSink`](sectionflow_debug::recorder::RecorderSink); the
//! recording is exported as a Chrome trace file (path from the first
//! argument, default `session_trace.json`).

use std::error::Error;
use std::fs::File;
use std::io::BufWriter;

use sectionflow_core::config::EngineConfig;
use sectionflow_core::id::SectionId;
use sectionflow_core::page::Page;
use sectionflow_core::section::SectionSpec;
use sectionflow_core::time::Duration;
use sectionflow_core::trace::{
    ActiveSectionEvent, CarouselEvent, LifecycleTransitionEvent, RotationSignalEvent,
    ScrollLockEvent, TraceSink, ViewportEvent,
};
use sectionflow_core::viewport::ViewportSnapshot;
use sectionflow_debug::pretty::PrettyPrintSink;
use sectionflow_debug::recorder::RecorderSink;
use sectionflow_sim::host::SimHost;
use sectionflow_sim::layout::SimLayout;

const SECTIONS: [(&str, f64); 5] = [
    ("hero", 1024.0),
    ("features", 1400.0),
    ("story", 2000.0),
    ("pricing", 1200.0),
    ("contact", 900.0),
];

/// Forwards every event to both sinks.
struct Tee {
    pretty: PrettyPrintSink<std::io::Stdout>,
    recorder: RecorderSink,
}

impl TraceSink for Tee {
    fn on_lifecycle_transition(&mut self, e: &LifecycleTransitionEvent) {
        self.pretty.on_lifecycle_transition(e);
        self.recorder.on_lifecycle_transition(e);
    }

    fn on_active_section(&mut self, e: &ActiveSectionEvent) {
        self.pretty.on_active_section(e);
        self.recorder.on_active_section(e);
    }

    fn on_scroll_lock(&mut self, e: &ScrollLockEvent) {
        self.pretty.on_scroll_lock(e);
        self.recorder.on_scroll_lock(e);
    }

    fn on_viewport(&mut self, e: &ViewportEvent) {
        self.pretty.on_viewport(e);
        self.recorder.on_viewport(e);
    }

    fn on_rotation_signal(&mut self, e: &RotationSignalEvent) {
        self.pretty.on_rotation_signal(e);
        self.recorder.on_rotation_signal(e);
    }

    fn on_carousel(&mut self, e: &CarouselEvent) {
        self.pretty.on_carousel(e);
        self.recorder.on_carousel(e);
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "session_trace.json".to_owned());

    // -- page --------------------------------------------------------------
    let portrait = ViewportSnapshot::touch(768.0, 1024.0);
    let layout = SimLayout::stacked(&SECTIONS, portrait);
    let names: Vec<SectionId> = layout.ids().to_vec();
    let specs = names.iter().map(|id| {
        if *id == "story" {
            SectionSpec::story(id.clone(), 4)
        } else {
            SectionSpec::plain(id.clone())
        }
    });
    let page = Page::new(EngineConfig::reference(), specs, &portrait)?;

    let sink = Tee {
        pretty: PrettyPrintSink::with_writer(std::io::stdout()).with_section_names(&names),
        recorder: RecorderSink::new(),
    };
    let mut host = SimHost::with_sink(page, layout, sink);

    // -- load --------------------------------------------------------------
    host.observe();
    host.advance(Duration(4500));

    // -- organic scroll: 40px per frame down to the story ------------------
    for _ in 0..70 {
        let y = host.layout().scroll_y() + 40.0;
        host.scroll_to(y);
        host.advance(Duration(16));
    }
    host.advance(Duration(1000));

    // -- carousel ----------------------------------------------------------
    let story = SectionId::from("story");
    for item in [1, 2, 2, 3] {
        host.hover(&story, item);
        host.advance(Duration(60));
    }
    host.focus(&story, 0);
    host.advance(Duration(3000));

    // -- menu navigation ---------------------------------------------------
    host.navigate(&SectionId::from("contact"))?;
    host.advance(Duration(300));
    host.navigate(&SectionId::from("pricing"))?;
    host.advance(Duration(2500));

    // -- rotation with an unsettled resize burst ---------------------------
    host.orientation_change(ViewportSnapshot::touch(1024.0, 768.0));
    for (w, h) in [(1024.0, 700.0), (1010.0, 720.0), (1024.0, 768.0)] {
        host.advance(Duration(120));
        host.resize(ViewportSnapshot::touch(w, h));
    }
    host.advance(Duration(1500));

    // -- leave -------------------------------------------------------------
    host.scroll_to(0.0);
    host.advance(Duration(5000));
    host.teardown();
    let end = host.now();

    // -- export Chrome trace -----------------------------------------------
    let sink = host.into_sink();
    let file = File::create(&path)?;
    let mut writer = BufWriter::new(file);
    sectionflow_debug::chrome::export(sink.recorder.as_bytes(), &names, &mut writer)?;

    println!(
        "Wrote {path} ({} bytes recorded over {}ms)",
        sink.recorder.as_bytes().len(),
        end.millis()
    );
    Ok(())
}
