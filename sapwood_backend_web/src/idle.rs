// Copyright 2026 the Sapwood Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! `requestIdleCallback` slice driver.
//!
//! [`IdleLoop`] asks the browser for idle periods and runs one scheduler
//! slice in each. The slice budget is the callback's
//! [`IdleDeadline`][mdn]; the loop re-registers itself only while the slice
//! reports [`SliceResult::Continue`], and parks otherwise. Call
//! [`wake`](IdleLoop::wake) after queuing new updates.
//!
//! [mdn]: https://developer.mozilla.org/en-US/docs/Web/API/IdleDeadline

use alloc::boxed::Box;
use alloc::rc::Rc;
use core::cell::{Cell, RefCell};

use sapwood_core::budget::SliceBudget;
use sapwood_core::scheduler::{Scheduler, SliceResult};
use sapwood_core::time::HostTime;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use web_sys::{IdleDeadline, Node};

use crate::DomHost;

// Direct global bindings instead of `web_sys::Window` methods, so no
// Window object has to be fetched on every slice.
#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = performance, js_name = "now")]
    pub(crate) fn performance_now() -> f64;

    #[wasm_bindgen(js_name = "requestIdleCallback")]
    fn request_idle_callback(callback: &JsValue) -> u32;

    #[wasm_bindgen(js_name = "cancelIdleCallback")]
    fn cancel_idle_callback(id: u32);
}

/// A [`SliceBudget`] that lasts until the browser's idle period ends.
pub struct IdleBudget {
    deadline: IdleDeadline,
}

impl IdleBudget {
    /// Wraps the deadline passed to an idle callback.
    #[must_use]
    pub fn new(deadline: IdleDeadline) -> Self {
        Self { deadline }
    }
}

impl core::fmt::Debug for IdleBudget {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("IdleBudget")
            .field("time_remaining_ms", &self.deadline.time_remaining())
            .finish()
    }
}

impl SliceBudget for IdleBudget {
    fn has_time_remaining(&mut self) -> bool {
        self.deadline.time_remaining() > 0.0
    }

    fn now(&mut self) -> Option<HostTime> {
        Some(HostTime::from_millis_f64(performance_now()))
    }
}

/// A `requestIdleCallback` loop that runs one slice per idle period.
///
/// Create with [`IdleLoop::new`], then call [`wake`](Self::wake) whenever
/// work is queued. Dropping the loop cancels the pending callback.
pub struct IdleLoop {
    inner: Rc<IdleInner>,
}

type IdleClosure = Closure<dyn FnMut(IdleDeadline)>;

struct IdleInner {
    /// The JS closure registered with `requestIdleCallback`.
    ///
    /// Set once on the first `wake()` and referenced from inside itself.
    closure: RefCell<Option<IdleClosure>>,

    /// Runs one slice with the given budget.
    slice: RefCell<Box<dyn FnMut(IdleBudget) -> SliceResult>>,

    /// Whether a callback is currently registered.
    pending: Cell<bool>,

    /// The ID returned by the most recent `requestIdleCallback` call.
    callback_id: Cell<u32>,

    /// Number of slices run so far.
    slices: Cell<u64>,
}

impl IdleInner {
    fn request(&self) {
        if let Some(ref closure) = *self.closure.borrow() {
            let id = request_idle_callback(closure.as_ref().unchecked_ref());
            self.callback_id.set(id);
            self.pending.set(true);
        }
    }
}

impl IdleLoop {
    /// Creates a loop that is **not yet scheduled**.
    ///
    /// `slice` runs once per idle period and reports whether more work is
    /// pending.
    pub fn new(slice: impl FnMut(IdleBudget) -> SliceResult + 'static) -> Self {
        let inner = Rc::new(IdleInner {
            closure: RefCell::new(None),
            slice: RefCell::new(Box::new(slice)),
            pending: Cell::new(false),
            callback_id: Cell::new(0),
            slices: Cell::new(0),
        });

        let weak = Rc::downgrade(&inner);
        let closure = Closure::wrap(Box::new(move |deadline: IdleDeadline| {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            inner.pending.set(false);
            inner.slices.set(inner.slices.get() + 1);

            // The borrow is scoped so it doesn't overlap with `closure`.
            let result = inner.slice.borrow_mut()(IdleBudget::new(deadline));
            if result == SliceResult::Continue {
                inner.request();
            }
        }) as Box<dyn FnMut(IdleDeadline)>);
        *inner.closure.borrow_mut() = Some(closure);

        Self { inner }
    }

    /// Creates a loop that drives `scheduler` against `host`.
    ///
    /// A failed update is dropped by the scheduler; the loop keeps going as
    /// long as other work is pending.
    pub fn driving(scheduler: Rc<RefCell<Scheduler<Node>>>, host: Rc<RefCell<DomHost>>) -> Self {
        Self::new(move |budget| {
            let mut scheduler = scheduler.borrow_mut();
            match scheduler.run_slice(&mut *host.borrow_mut(), budget) {
                Ok(result) => result,
                Err(_) if scheduler.has_pending_work() => SliceResult::Continue,
                Err(_) => SliceResult::Idle,
            }
        })
    }

    /// Requests an idle callback unless one is already pending.
    pub fn wake(&self) {
        if !self.inner.pending.get() {
            self.inner.request();
        }
    }

    /// Cancels the pending callback, if any.
    pub fn cancel(&self) {
        if self.inner.pending.replace(false) {
            cancel_idle_callback(self.inner.callback_id.get());
        }
    }

    /// Returns `true` if a callback is registered.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.inner.pending.get()
    }

    /// Returns the number of slices run so far.
    #[must_use]
    pub fn slices(&self) -> u64 {
        self.inner.slices.get()
    }
}

impl Drop for IdleLoop {
    fn drop(&mut self) {
        self.cancel();
        // Drop the JS closure so it doesn't leak.
        self.inner.closure.borrow_mut().take();
    }
}

impl core::fmt::Debug for IdleLoop {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("IdleLoop")
            .field("pending", &self.inner.pending.get())
            .field("slices", &self.inner.slices.get())
            .finish()
    }
}
