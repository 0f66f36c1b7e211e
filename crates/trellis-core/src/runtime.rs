//! # Turns and microtasks
//!
//! Trellis runs on one thread with cooperative scheduling. Work that must
//! wait until the current synchronous turn is over (renders, mostly) is
//! queued as a microtask; the host event loop drains the queue at the end of
//! each turn:
//!
//! ```rust
//! use std::cell::Cell;
//! use std::rc::Rc;
//! use trellis_core::*;
//!
//! let ran = Rc::new(Cell::new(false));
//! let r = ran.clone();
//! queue_microtask(move || r.set(true));
//! assert!(!ran.get());
//! run_microtasks();
//! assert!(ran.get());
//! ```
//!
//! [`turn`] wraps a closure and drains afterwards, which is what event
//! handlers in tests usually want.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;

thread_local! {
    static MICROTASKS: RefCell<VecDeque<Box<dyn FnOnce()>>> = RefCell::new(VecDeque::new());
    static DRAINING: Cell<bool> = const { Cell::new(false) };
    static TURN_DEPTH: Cell<usize> = const { Cell::new(0) };
}

/// Defers `task` until the end of the current turn.
pub fn queue_microtask(task: impl FnOnce() + 'static) {
    MICROTASKS.with(|q| q.borrow_mut().push_back(Box::new(task)));
}

pub fn pending_microtasks() -> usize {
    MICROTASKS.with(|q| q.borrow().len())
}

/// Runs queued microtasks, including ones queued while draining, until the
/// queue is empty. Returns how many ran. Nested calls return 0; the outer
/// drain picks up their work.
pub fn run_microtasks() -> usize {
    if DRAINING.with(|d| d.replace(true)) {
        return 0;
    }
    let _draining = DrainGuard;
    let mut ran = 0;
    loop {
        let next = MICROTASKS.with(|q| q.borrow_mut().pop_front());
        let Some(task) = next else { break };
        task();
        ran += 1;
    }
    log::trace!("drained {ran} microtasks");
    ran
}

/// Clears the draining flag even if a task panics.
struct DrainGuard;

impl Drop for DrainGuard {
    fn drop(&mut self) {
        DRAINING.with(|d| d.set(false));
    }
}

/// Runs `f` as one synchronous turn, then drains microtasks. A `turn`
/// nested inside another one joins the outer turn.
pub fn turn<R>(f: impl FnOnce() -> R) -> R {
    let guard = TurnGuard::begin();
    let out = f();
    drop(guard);
    out
}

/// Drains microtasks when the outermost guard is dropped, so an early return
/// still ends the turn.
#[derive(Debug)]
pub struct TurnGuard {
    _private: (),
}

impl TurnGuard {
    pub fn begin() -> Self {
        TURN_DEPTH.with(|d| d.set(d.get() + 1));
        TurnGuard { _private: () }
    }
}

/// Whether a [`turn`] is in progress on this thread.
pub fn in_turn() -> bool {
    TURN_DEPTH.with(|d| d.get() > 0)
}

impl Drop for TurnGuard {
    fn drop(&mut self) {
        let depth = TURN_DEPTH.with(|d| {
            let depth = d.get().saturating_sub(1);
            d.set(depth);
            depth
        });
        if depth == 0 && !std::thread::panicking() {
            run_microtasks();
        }
    }
}
