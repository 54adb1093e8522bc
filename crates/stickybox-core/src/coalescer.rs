#![forbid(unsafe_code)]

//! Per-instance tick coalescing.
//!
//! Scroll, wheel, resize and mutation signals can arrive many times inside a
//! single macrotask. [`TickCoalescer`] lets the first one through, marks the
//! tick as pending, and asks a [`TickScheduler`] to clear the mark on the next
//! macrotask. Everything that arrives in between is dropped: the evaluation
//! that did run read live geometry, so nothing is lost.
//!
//! This is not an animation-frame throttle. It bounds evaluations per
//! macrotask, not per paint.
//!
//! # Usage
//!
//! ```
//! use stickybox_core::coalescer::{ManualScheduler, TickCoalescer};
//!
//! let scheduler = ManualScheduler::new();
//! let mut coalescer = TickCoalescer::new();
//!
//! assert!(coalescer.try_begin(&scheduler));
//! assert!(!coalescer.try_begin(&scheduler));
//!
//! // Next macrotask: the pending mark is cleared.
//! assert_eq!(scheduler.run_pending(), 1);
//! assert!(coalescer.try_begin(&scheduler));
//! ```

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;
use std::rc::{Rc, Weak};

/// A callback deferred to a later macrotask.
pub struct DeferredTask(Box<dyn FnOnce()>);

impl DeferredTask {
    pub fn new(task: impl FnOnce() + 'static) -> Self {
        Self(Box::new(task))
    }

    /// Run the task, consuming it.
    pub fn run(self) {
        (self.0)();
    }
}

impl fmt::Debug for DeferredTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DeferredTask")
    }
}

/// Defers work to the next macrotask (`setTimeout(fn, 0)` in a browser).
///
/// Implementations must not run the task synchronously inside `defer`.
pub trait TickScheduler {
    fn defer(&self, task: DeferredTask);
}

/// Deterministic scheduler driven explicitly by the host or a test.
///
/// Clones share the same queue, so a host can keep one handle to drain while
/// the context holds another to schedule into.
#[derive(Debug, Clone, Default)]
pub struct ManualScheduler {
    queue: Rc<RefCell<VecDeque<DeferredTask>>>,
}

impl ManualScheduler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tasks waiting for the next macrotask.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue.borrow().len()
    }

    /// Run every task queued before this call. Tasks queued while running
    /// wait for the next call. Returns the number of tasks run.
    pub fn run_pending(&self) -> usize {
        let batch: Vec<DeferredTask> = self.queue.borrow_mut().drain(..).collect();
        let ran = batch.len();
        for task in batch {
            task.run();
        }
        ran
    }
}

impl TickScheduler for ManualScheduler {
    fn defer(&self, task: DeferredTask) {
        self.queue.borrow_mut().push_back(task);
    }
}

/// Guards one instance against more than one evaluation per macrotask.
///
/// The pending flag is shared with the deferred clear callback through a weak
/// reference, so the callback becomes a no-op once the coalescer is dropped.
#[derive(Debug, Default)]
pub struct TickCoalescer {
    pending: Rc<Cell<bool>>,
}

impl TickCoalescer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a tick is open and further signals will be dropped.
    #[inline]
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending.get()
    }

    /// Open a tick if none is pending.
    ///
    /// Returns `true` when the caller should evaluate now, `false` when the
    /// signal is coalesced into the evaluation that already ran.
    pub fn try_begin<S: TickScheduler + ?Sized>(&mut self, scheduler: &S) -> bool {
        if self.pending.get() {
            return false;
        }
        self.pending.set(true);
        let flag: Weak<Cell<bool>> = Rc::downgrade(&self.pending);
        scheduler.defer(DeferredTask::new(move || {
            if let Some(flag) = flag.upgrade() {
                flag.set(false);
            }
        }));
        true
    }
}
