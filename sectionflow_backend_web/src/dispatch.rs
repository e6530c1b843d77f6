// Copyright 2026 the Sectionflow Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Re-entrancy-safe access to state shared by browser callbacks.
//!
//! Browser callbacks (timers, animation frames, DOM events) and signal
//! listeners can fire while the engine is already borrowed, for example when
//! a listener's DOM write synchronously dispatches an event. Dropping such a
//! callback loses its effect for good: a lost frame leaves the scroll-spy
//! waiting for a frame that never comes, and a lost timer strands a section
//! in a transitional state.
//!
//! [`Dispatcher::dispatch`] never drops work. If the state is free the job
//! runs at once; otherwise it is queued, and whoever holds the state drains
//! the queue before releasing it.

use std::cell::{Ref, RefCell};
use std::collections::VecDeque;

type Job<T> = Box<dyn FnOnce(&mut T)>;

/// State plus a queue of jobs deferred while it was borrowed.
pub(crate) struct Dispatcher<T> {
    state: RefCell<T>,
    deferred: RefCell<VecDeque<Job<T>>>,
}

impl<T> Dispatcher<T> {
    pub(crate) fn new(state: T) -> Self {
        Self {
            state: RefCell::new(state),
            deferred: RefCell::new(VecDeque::new()),
        }
    }

    /// Runs `job` now, or queues it for the current borrower.
    ///
    /// Returns `true` if the job ran before returning.
    pub(crate) fn dispatch(&self, job: impl FnOnce(&mut T) + 'static) -> bool {
        match self.state.try_borrow_mut() {
            Ok(mut state) => {
                job(&mut state);
                self.drain(&mut state);
                true
            }
            Err(_) => {
                self.deferred.borrow_mut().push_back(Box::new(job));
                false
            }
        }
    }

    /// Runs `f` against the state and returns its result, or `None` if the
    /// state is already borrowed. Jobs deferred meanwhile run before
    /// returning.
    pub(crate) fn try_with<R>(&self, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        let mut state = self.state.try_borrow_mut().ok()?;
        let result = f(&mut state);
        self.drain(&mut state);
        Some(result)
    }

    /// Shared view of the state, or `None` while it is mutably borrowed.
    pub(crate) fn try_borrow(&self) -> Option<Ref<'_, T>> {
        self.state.try_borrow().ok()
    }

    /// Drops every deferred job without running it.
    pub(crate) fn discard_deferred(&self) {
        self.deferred.borrow_mut().clear();
    }

    /// Number of jobs waiting for the current borrower.
    pub(crate) fn deferred_len(&self) -> usize {
        self.deferred.borrow().len()
    }

    fn drain(&self, state: &mut T) {
        // A job may defer more jobs; keep going until the queue stays empty.
        while let Some(job) = self.next_deferred() {
            job(state);
        }
    }

    fn next_deferred(&self) -> Option<Job<T>> {
        self.deferred.borrow_mut().pop_front()
    }
}

impl<T> core::fmt::Debug for Dispatcher<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("busy", &self.state.try_borrow().is_err())
            .field("deferred", &self.deferred_len())
            .finish_non_exhaustive()
    }
}
