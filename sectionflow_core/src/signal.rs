// Copyright 2026 the Sectionflow Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Single-writer observable values.
//!
//! [`signal`] returns a [`SignalWriter`] (held by the one component that owns
//! the value) and a [`Watch`] (cloned freely to readers). Readers can read
//! synchronously or subscribe to changes; only the writer can change the
//! value.
//!
//! Listeners run synchronously inside [`SignalWriter::set`], after the new
//! value is stored. A listener that is already running (because it caused a
//! nested `set`) is skipped for the nested notification.

use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};
use core::fmt;

/// Handle returned by [`Watch::subscribe`], used to unsubscribe.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener<T> = Rc<RefCell<Box<dyn FnMut(&T)>>>;

struct Shared<T> {
    value: RefCell<T>,
    version: Cell<u64>,
    listeners: RefCell<Vec<(ListenerId, Listener<T>)>>,
    next_listener: Cell<u64>,
}

/// Creates a signal holding `initial`.
#[must_use]
pub fn signal<T: Clone + PartialEq>(initial: T) -> (SignalWriter<T>, Watch<T>) {
    let shared = Rc::new(Shared {
        value: RefCell::new(initial),
        version: Cell::new(0),
        listeners: RefCell::new(Vec::new()),
        next_listener: Cell::new(0),
    });
    (
        SignalWriter {
            shared: Rc::clone(&shared),
        },
        Watch { shared },
    )
}

/// Write side of a signal. Not `Clone`: there is exactly one writer.
pub struct SignalWriter<T> {
    shared: Rc<Shared<T>>,
}

impl<T: Clone + PartialEq> SignalWriter<T> {
    /// Stores `value` and notifies listeners if it differs from the current
    /// value. Returns `true` if the value changed.
    pub fn set(&self, value: T) -> bool {
        {
            let mut current = self.shared.value.borrow_mut();
            if *current == value {
                return false;
            }
            *current = value;
        }
        self.shared.version.set(self.shared.version.get() + 1);

        let snapshot = self.shared.value.borrow().clone();
        let listeners: Vec<Listener<T>> = self
            .shared
            .listeners
            .borrow()
            .iter()
            .map(|(_, l)| Rc::clone(l))
            .collect();
        for listener in listeners {
            if let Ok(mut f) = listener.try_borrow_mut() {
                f(&snapshot);
            }
        }
        true
    }

    /// Returns a clone of the current value.
    #[must_use]
    pub fn get(&self) -> T {
        self.shared.value.borrow().clone()
    }

    /// Returns a new read handle.
    #[must_use]
    pub fn watch(&self) -> Watch<T> {
        Watch {
            shared: Rc::clone(&self.shared),
        }
    }

    /// Drops every listener.
    pub fn clear_listeners(&self) {
        self.shared.listeners.borrow_mut().clear();
    }
}

/// Read side of a signal.
pub struct Watch<T> {
    shared: Rc<Shared<T>>,
}

impl<T> Clone for Watch<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Rc::clone(&self.shared),
        }
    }
}

impl<T: Clone> Watch<T> {
    /// Returns a clone of the current value.
    #[must_use]
    pub fn get(&self) -> T {
        self.shared.value.borrow().clone()
    }

    /// Calls `f` with a reference to the current value.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.shared.value.borrow())
    }

    /// Returns a counter that increases on every change.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.shared.version.get()
    }

    /// Registers `f` to be called with the new value after every change.
    pub fn subscribe(&self, f: impl FnMut(&T) + 'static) -> ListenerId {
        let id = ListenerId(self.shared.next_listener.get());
        self.shared.next_listener.set(id.0 + 1);
        self.shared
            .listeners
            .borrow_mut()
            .push((id, Rc::new(RefCell::new(Box::new(f)))));
        id
    }

    /// Removes a listener. Returns `true` if it was registered.
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut listeners = self.shared.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|(l, _)| *l != id);
        listeners.len() != before
    }

    /// Returns the number of registered listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.shared.listeners.borrow().len()
    }
}

impl<T: fmt::Debug> fmt::Debug for SignalWriter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignalWriter")
            .field("value", &*self.shared.value.borrow())
            .field("version", &self.shared.version.get())
            .finish_non_exhaustive()
    }
}

impl<T: fmt::Debug> fmt::Debug for Watch<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Watch")
            .field("value", &*self.shared.value.borrow())
            .field("version", &self.shared.version.get())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_notifies_only_on_change() {
        let (writer, watch) = signal(0_u32);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        watch.subscribe(move |v| sink.borrow_mut().push(*v));

        assert!(writer.set(1));
        assert!(!writer.set(1), "same value is not a change");
        assert!(writer.set(2));

        assert_eq!(*seen.borrow(), [1, 2]);
        assert_eq!(watch.version(), 2);
        assert_eq!(watch.get(), 2);
    }

    #[test]
    fn unsubscribe_stops_notifications() {
        let (writer, watch) = signal(false);
        let count = Rc::new(Cell::new(0));
        let c = Rc::clone(&count);
        let id = watch.subscribe(move |_| c.set(c.get() + 1));

        writer.set(true);
        assert!(watch.unsubscribe(id));
        writer.set(false);

        assert_eq!(count.get(), 1);
        assert_eq!(watch.listener_count(), 0);
    }

    #[test]
    fn listener_may_read_the_signal() {
        let (writer, watch) = signal(5_i32);
        let reader = watch.clone();
        let observed = Rc::new(Cell::new(0));
        let o = Rc::clone(&observed);
        watch.subscribe(move |v| o.set(*v + reader.get()));

        writer.set(7);
        assert_eq!(observed.get(), 14, "value is stored before listeners run");
    }
}
