//! The deferred-execution facility: microtasks and the scheduler capability.
//!
//! The settlement core never runs continuation handlers on the stack that
//! triggered them; it hands zero-argument tasks to a [`TaskScheduler`] and
//! relies on the host to drain them after the current synchronous execution
//! completes, in FIFO order. [`MicrotaskQueue`] is the shipped, manually
//! stepped implementation of that capability.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

/// A deferred zero-argument task.
pub struct MicroTask {
    callback: Box<dyn FnOnce()>,
}

impl MicroTask {
    /// Creates a new MicroTask from a closure.
    pub fn new<F>(f: F) -> Self
    where
        F: FnOnce() + 'static,
    {
        Self {
            callback: Box::new(f),
        }
    }

    /// Executes the task, consuming it.
    pub fn run(self) {
        (self.callback)()
    }
}

impl fmt::Debug for MicroTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MicroTask {{ ... }}")
    }
}

/// The deferred-execution capability required by the settlement core.
///
/// Implementations must run enqueued tasks strictly after the enqueuing
/// synchronous code path returns to the top of the call stack, preserving
/// FIFO order among same-queue enqueues.
pub trait TaskScheduler {
    /// Enqueues a task to run after the current synchronous execution
    /// completes.
    fn enqueue(&self, task: MicroTask);
}

/// A deterministic FIFO microtask queue.
///
/// Cheaply clonable; clones share the same queue. Tasks enqueued while the
/// queue is draining are run in the same drain, after the tasks already
/// queued.
///
/// # Examples
///
/// ```
/// use std::cell::RefCell;
/// use std::rc::Rc;
/// use settle_runtime::{MicroTask, MicrotaskQueue, TaskScheduler};
///
/// let queue = MicrotaskQueue::new();
/// let order = Rc::new(RefCell::new(Vec::new()));
///
/// let o = order.clone();
/// queue.enqueue(MicroTask::new(move || o.borrow_mut().push(1)));
/// let o = order.clone();
/// queue.enqueue(MicroTask::new(move || o.borrow_mut().push(2)));
///
/// queue.run_until_done();
/// assert_eq!(*order.borrow(), vec![1, 2]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MicrotaskQueue {
    queue: Rc<RefCell<VecDeque<MicroTask>>>,
}

impl MicrotaskQueue {
    /// Creates a new empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a scheduler handle backed by this queue.
    pub fn scheduler(&self) -> Rc<dyn TaskScheduler> {
        Rc::new(self.clone())
    }

    /// Runs the oldest task, if any. Returns whether a task ran.
    pub fn run_next(&self) -> bool {
        // The borrow is released before the task runs so the task may
        // enqueue further work.
        let task = self.queue.borrow_mut().pop_front();
        match task {
            Some(task) => {
                task.run();
                true
            }
            None => false,
        }
    }

    /// Drains the queue, including tasks enqueued during the drain.
    pub fn run_until_done(&self) {
        while self.run_next() {}
    }

    /// Returns the number of queued tasks.
    pub fn len(&self) -> usize {
        self.queue.borrow().len()
    }

    /// Returns true if no tasks are queued.
    pub fn is_empty(&self) -> bool {
        self.queue.borrow().is_empty()
    }
}

impl TaskScheduler for MicrotaskQueue {
    fn enqueue(&self, task: MicroTask) {
        self.queue.borrow_mut().push_back(task);
    }
}
