// Copyright 2026 the Sectionflow Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Page-scoped engine singleton.
//!
//! Several components on a page (navigation bar, sections, media carousels)
//! need the same [`Page`]: one scroll-spy, one viewport classifier, one
//! rotation signal. [`PageHandle::acquire`] mounts the engine on first use and
//! hands out further handles to the same instance; dropping the last handle
//! removes every listener, cancels every timer, and clears the singleton.
//!
//! Wiring:
//!
//! | Browser input           | Engine call                       |
//! |-------------------------|-----------------------------------|
//! | `IntersectionObserver`  | [`Page::on_visibility`]           |
//! | `scroll`                | [`Page::on_scroll`]               |
//! | `resize`                | [`Page::on_resize`]               |
//! | `orientationchange`     | [`Page::on_orientation_change`]   |
//! | `setTimeout` fire       | [`Page::on_timer`]                |
//! | animation frame         | [`Page::on_frame`]                |
//!
//! Every callback finishes by executing the produced effects and applying
//! section changes through the [`MediaPresenter`].
//!
//! Signal listeners registered through the watches run while the engine is
//! borrowed. Browser callbacks that arrive meanwhile are queued and run as
//! soon as the current call finishes; handle methods called from inside a
//! listener return an error (or `None`) instead of re-entering.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use sectionflow_core::backend::Presenter as _;
use sectionflow_core::config::EngineConfig;
use sectionflow_core::effect::{Effect, Effects};
use sectionflow_core::id::SectionId;
use sectionflow_core::lifecycle::LifecycleOutput;
use sectionflow_core::page::Page;
use sectionflow_core::section::SectionSpec;
use sectionflow_core::signal::Watch;
use sectionflow_core::time::HostTime;
use sectionflow_core::trace::Tracer;
use sectionflow_core::viewport::ViewportState;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use web_sys::{IntersectionObserver, IntersectionObserverEntry, Window};

use crate::dispatch::Dispatcher;
use crate::measure::DomLayout;
use crate::navigation;
use crate::presenter::MediaPresenter;
use crate::raf::FrameGate;
use crate::timer::TimeoutHost;

struct Shared {
    page: Page,
    effects: Effects,
    timers: TimeoutHost,
    frame: FrameGate,
    layout: DomLayout,
    presenter: MediaPresenter,
}

type Engine = Dispatcher<Shared>;

impl Shared {
    fn flush(&mut self, now: HostTime) {
        let Self {
            page,
            effects,
            timers,
            frame,
            layout,
            presenter,
        } = self;
        loop {
            let mut unreachable = Vec::new();
            for effect in effects.drain() {
                match effect {
                    Effect::Schedule { id, at } => timers.schedule(id, at, now),
                    Effect::Cancel { id } => timers.cancel(id),
                    Effect::RequestFrame => frame.request(),
                    Effect::ScrollTo { id } => {
                        if !navigation::scroll_to_section(layout.document(), &id) {
                            unreachable.push(id);
                        }
                    }
                    Effect::SetFragment { id } => {
                        // Sandboxed documents may refuse history updates.
                        if let Err(err) = navigation::set_fragment(layout.window(), &id) {
                            crate::warn("sectionflow: address fragment not updated", &err);
                        }
                    }
                }
            }
            if unreachable.is_empty() {
                break;
            }
            for id in &unreachable {
                page.on_scroll_unavailable(id, now, effects, &mut Tracer::none());
            }
        }
        let changes = page.evaluate();
        if !changes.is_empty() {
            presenter.apply(page.sections(), &changes);
        }
    }

    fn unmount(&mut self) {
        let now = crate::now();
        let Self { page, effects, .. } = &mut *self;
        page.teardown(effects);
        self.flush(now);
        self.timers.cancel_all();
        self.frame.cancel();
        self.presenter.pause_all();
    }
}

/// Runs `f` against the live engine, then executes its effects.
///
/// If the engine is busy the call is queued and runs as soon as the current
/// borrower finishes. Does nothing once the engine is gone.
fn dispatch(weak: &Weak<Engine>, f: impl FnOnce(&mut Shared, HostTime) + 'static) {
    let Some(engine) = weak.upgrade() else {
        return;
    };
    engine.dispatch(move |s| {
        let now = crate::now();
        f(s, now);
        s.flush(now);
    });
}

fn busy() -> JsValue {
    JsValue::from_str("page engine is busy")
}

struct Listeners {
    window: Window,
    scroll: Closure<dyn FnMut()>,
    resize: Closure<dyn FnMut()>,
    orientation: Closure<dyn FnMut()>,
    observer: IntersectionObserver,
    // Kept alive for as long as the observer is connected.
    _intersections: Closure<dyn FnMut(js_sys::Array)>,
}

impl Listeners {
    fn install(weak: &Weak<Engine>, layout: &DomLayout) -> Result<Self, JsValue> {
        let window = layout.window().clone();

        let w = weak.clone();
        let scroll = Closure::wrap(Box::new(move || {
            dispatch(&w, |s, _| s.page.on_scroll(&mut s.effects));
        }) as Box<dyn FnMut()>);

        let w = weak.clone();
        let resize = Closure::wrap(Box::new(move || {
            dispatch(&w, |s, now| {
                s.page
                    .on_resize(now, &mut s.effects, &mut Tracer::none());
            });
        }) as Box<dyn FnMut()>);

        let w = weak.clone();
        let orientation = Closure::wrap(Box::new(move || {
            dispatch(&w, |s, now| {
                s.page
                    .on_orientation_change(now, &mut s.effects, &mut Tracer::none());
            });
        }) as Box<dyn FnMut()>);

        let w = weak.clone();
        let intersections = Closure::wrap(Box::new(move |entries: js_sys::Array| {
            dispatch(&w, move |s, now| {
                for entry in entries.iter() {
                    let Ok(entry) = entry.dyn_into::<IntersectionObserverEntry>() else {
                        continue;
                    };
                    let id = SectionId::new(&entry.target().id());
                    s.page.on_visibility(
                        &id,
                        entry.is_intersecting(),
                        now,
                        &mut s.effects,
                        &mut Tracer::none(),
                    );
                }
            });
        }) as Box<dyn FnMut(js_sys::Array)>);

        window.add_event_listener_with_callback("scroll", scroll.as_ref().unchecked_ref())?;
        window.add_event_listener_with_callback("resize", resize.as_ref().unchecked_ref())?;
        window.add_event_listener_with_callback(
            "orientationchange",
            orientation.as_ref().unchecked_ref(),
        )?;
        let observer = IntersectionObserver::new(intersections.as_ref().unchecked_ref())?;

        Ok(Self {
            window,
            scroll,
            resize,
            orientation,
            observer,
            _intersections: intersections,
        })
    }

    fn observe(&self, layout: &DomLayout, ids: &[SectionId]) {
        for id in ids {
            if let Some(el) = layout.document().get_element_by_id(id.as_str()) {
                self.observer.observe(&el);
            }
        }
    }

    fn remove(&self) {
        self.observer.disconnect();
        let pairs = [
            ("scroll", &self.scroll),
            ("resize", &self.resize),
            ("orientationchange", &self.orientation),
        ];
        for (event, closure) in pairs {
            if let Err(err) = self
                .window
                .remove_event_listener_with_callback(event, closure.as_ref().unchecked_ref())
            {
                crate::warn("sectionflow: listener not removed", &err);
            }
        }
    }
}

struct Mounted {
    engine: Rc<Engine>,
    listeners: Listeners,
    consumers: usize,
}

impl Mounted {
    fn unmount(self) {
        self.listeners.remove();
        self.engine.discard_deferred();
        // Runs now, or right after the callback currently holding the engine.
        self.engine.dispatch(Shared::unmount);
    }
}

thread_local! {
    static REGISTRY: RefCell<Option<Mounted>> = const { RefCell::new(None) };
}

/// Shared handle to the page's engine.
pub struct PageHandle {
    engine: Rc<Engine>,
}

impl core::fmt::Debug for PageHandle {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PageHandle")
            .field("consumers", &Self::consumers())
            .field("engine", &self.engine)
            .finish()
    }
}

impl PageHandle {
    /// Returns a handle to the page engine, mounting it on first call.
    ///
    /// `config` and `sections` are only read by the mounting call; later
    /// calls share the mounted instance.
    pub fn acquire(config: EngineConfig, sections: &[SectionSpec]) -> Result<Self, JsValue> {
        REGISTRY.with_borrow_mut(|slot| {
            if let Some(mounted) = slot {
                mounted.consumers += 1;
                return Ok(Self {
                    engine: Rc::clone(&mounted.engine),
                });
            }
            let mounted = mount(config, sections)?;
            let handle = Self {
                engine: Rc::clone(&mounted.engine),
            };
            *slot = Some(mounted);
            Ok(handle)
        })
    }

    /// Number of live handles.
    #[must_use]
    pub fn consumers() -> usize {
        REGISTRY.with_borrow(|slot| slot.as_ref().map_or(0, |m| m.consumers))
    }

    /// Navigates to the section with `id`.
    ///
    /// If the section has no element the navigation lock is released at once
    /// instead of waiting for its safety timeout.
    pub fn navigate(&self, id: &str) -> Result<(), JsValue> {
        let target = SectionId::new(id);
        self.update(|page, now, effects| {
            page.navigate(&target, now, effects, &mut Tracer::none())
        })?
        .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Pointer hover over carousel item `item` of section `id`.
    pub fn hover(&self, id: &str, item: usize) -> Result<bool, JsValue> {
        self.update(|page, now, _| {
            page.on_hover(&SectionId::new(id), item, now, &mut Tracer::none())
        })
    }

    /// Keyboard focus on carousel item `item` of section `id`.
    pub fn focus(&self, id: &str, item: usize) -> Result<bool, JsValue> {
        self.update(|page, now, _| {
            page.on_focus(&SectionId::new(id), item, now, &mut Tracer::none())
        })
    }

    /// Current active section.
    #[must_use]
    pub fn active(&self) -> Option<SectionId> {
        self.engine.try_borrow()?.page.active()
    }

    /// Lifecycle output of section `id`.
    #[must_use]
    pub fn output(&self, id: &str) -> Option<LifecycleOutput> {
        self.engine.try_borrow()?.page.output(&SectionId::new(id))
    }

    /// Subscribable active section.
    pub fn active_watch(&self) -> Result<Watch<Option<SectionId>>, JsValue> {
        self.read(|page| page.active_watch())
    }

    /// Subscribable viewport state.
    pub fn viewport_watch(&self) -> Result<Watch<ViewportState>, JsValue> {
        self.read(|page| page.viewport_watch())
    }

    /// Subscribable rotation signal.
    pub fn rotation_watch(&self) -> Result<Watch<bool>, JsValue> {
        self.read(|page| page.rotation_watch())
    }

    fn read<R>(&self, f: impl FnOnce(&Page) -> R) -> Result<R, JsValue> {
        let s = self.engine.try_borrow().ok_or_else(busy)?;
        Ok(f(&s.page))
    }

    fn update<R>(
        &self,
        f: impl FnOnce(&mut Page, HostTime, &mut Effects) -> R,
    ) -> Result<R, JsValue> {
        self.engine
            .try_with(|s| {
                let now = crate::now();
                let result = f(&mut s.page, now, &mut s.effects);
                s.flush(now);
                result
            })
            .ok_or_else(busy)
    }
}

impl Drop for PageHandle {
    fn drop(&mut self) {
        let released = REGISTRY.with_borrow_mut(|slot| {
            let mounted = slot.as_mut()?;
            if !Rc::ptr_eq(&mounted.engine, &self.engine) {
                return None;
            }
            mounted.consumers -= 1;
            if mounted.consumers > 0 {
                return None;
            }
            slot.take()
        });
        if let Some(mounted) = released {
            mounted.unmount();
        }
    }
}

fn mount(config: EngineConfig, sections: &[SectionSpec]) -> Result<Mounted, JsValue> {
    let layout = DomLayout::new()?;
    let page = Page::new(config, sections.iter().cloned(), &layout.snapshot())
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    let ids = page.sections().ids().to_vec();
    let document = layout.document().clone();
    let observed = layout.clone();

    let engine = Rc::new_cyclic(|weak: &Weak<Engine>| {
        let w = weak.clone();
        let timers = TimeoutHost::new(move |token| {
            dispatch(&w, move |s, now| {
                if let Some(id) = s.timers.fire(token) {
                    let Shared {
                        page,
                        effects,
                        layout,
                        ..
                    } = &mut *s;
                    page.on_timer(id, &*layout, now, effects, &mut Tracer::none());
                }
            });
        });
        let w = weak.clone();
        let frame = FrameGate::new(move |_| {
            dispatch(&w, |s, now| {
                let Shared {
                    page,
                    effects,
                    layout,
                    ..
                } = &mut *s;
                page.on_frame(&*layout, now, effects, &mut Tracer::none());
            });
        });
        Dispatcher::new(Shared {
            page,
            effects: Effects::new(),
            timers,
            frame,
            layout,
            presenter: MediaPresenter::new(document),
        })
    });

    let listeners = Listeners::install(&Rc::downgrade(&engine), &observed)?;
    listeners.observe(&observed, &ids);

    Ok(Mounted {
        engine,
        listeners,
        consumers: 1,
    })
}
