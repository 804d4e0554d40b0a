//! The Settlable deferred value and its resolution procedure.
//!
//! A [`Settlable`] is a single-assignment container that eventually holds
//! either a produced value or a failure. Continuations attached with
//! [`Settlable::then`] run asynchronously, exactly once, in attachment
//! order, regardless of whether the outcome was already known when they
//! were attached.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use core_types::SettleError;

use crate::task_queue::{MicroTask, TaskScheduler};
use crate::value::{Function, Value};

/// Externally observable settlement status.
///
/// A Settlable transitions Pending → Fulfilled or Pending → Rejected at most
/// once and never leaves a settled state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettleState {
    /// The initial state; no outcome yet.
    Pending,
    /// Settled with a value.
    Fulfilled,
    /// Settled with a failure reason.
    Rejected,
}

/// Whether a settlement request has been accepted yet.
///
/// Separate from [`SettleState`]: a Settlable is `Resolving` but still
/// `Pending` while the accepted value is itself an unsettled thenable.
/// Once `Resolving`, further calls to the settlement entry points are
/// silent no-ops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fate {
    /// No settlement request accepted yet.
    Unresolved,
    /// A settlement request has been accepted; the outcome may still be
    /// pending on a nested thenable.
    Resolving,
}

/// A bound settlement callback handed to a typed initializer.
pub type SettleFn = Box<dyn Fn(Value)>;

/// One registered continuation pair.
///
/// Exactly one side fires, exactly once, at settlement; the other side is
/// dropped unused.
struct Continuation {
    on_fulfilled: Box<dyn FnOnce(Value)>,
    on_rejected: Box<dyn FnOnce(Value)>,
}

/// Internal outcome slot. Keeping the payload inside the variant makes the
/// value/reason slots mutually exclusive and write-once by construction.
#[derive(Clone)]
enum Outcome {
    Pending,
    Fulfilled(Value),
    Rejected(Value),
}

struct Inner {
    outcome: Outcome,
    fate: Fate,
    continuations: Vec<Continuation>,
}

/// A single-assignment deferred value.
///
/// `Settlable` is a cheaply clonable handle; clones share the same state.
/// All mutation happens on one logical thread, and continuation handlers
/// only ever run from the injected [`TaskScheduler`], never on the stack
/// that triggered them.
///
/// # Examples
///
/// ```
/// use settle_runtime::{MicrotaskQueue, Settlable, SettleState, Value};
///
/// let queue = MicrotaskQueue::new();
/// let settlable = Settlable::pending(queue.scheduler());
/// assert_eq!(settlable.state(), SettleState::Pending);
///
/// settlable.settle_fulfilled(Value::Smi(42));
/// assert_eq!(settlable.state(), SettleState::Fulfilled);
/// assert_eq!(settlable.value(), Some(Value::Smi(42)));
/// ```
pub struct Settlable {
    inner: Rc<RefCell<Inner>>,
    scheduler: Rc<dyn TaskScheduler>,
}

impl Clone for Settlable {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
            scheduler: Rc::clone(&self.scheduler),
        }
    }
}

impl fmt::Debug for Settlable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settlable")
            .field("state", &self.state())
            .field("fate", &self.fate())
            .finish()
    }
}

impl Settlable {
    /// Creates a bare Pending Settlable settled externally through the
    /// entry points.
    pub fn pending(scheduler: Rc<dyn TaskScheduler>) -> Self {
        Self {
            inner: Rc::new(RefCell::new(Inner {
                outcome: Outcome::Pending,
                fate: Fate::Unresolved,
                continuations: Vec::new(),
            })),
            scheduler,
        }
    }

    /// Creates a Settlable driven by a typed initializer.
    ///
    /// The initializer runs synchronously, before `new` returns, and
    /// receives the bound settle-fulfilled and settle-rejected callbacks.
    /// It may call either of them synchronously, store them for later, or
    /// never call them. An `Err` return becomes the rejection reason unless
    /// the Settlable was already settled inside the initializer; the first
    /// settlement wins and the later error is discarded.
    ///
    /// # Examples
    ///
    /// ```
    /// use settle_runtime::{MicrotaskQueue, Settlable, SettleState, Value};
    ///
    /// let queue = MicrotaskQueue::new();
    /// let settlable = Settlable::new(queue.scheduler(), |settle_fulfilled, _| {
    ///     settle_fulfilled(Value::String("ready".to_string()));
    ///     Ok(())
    /// });
    /// assert_eq!(settlable.state(), SettleState::Fulfilled);
    /// ```
    pub fn new<F>(scheduler: Rc<dyn TaskScheduler>, initializer: F) -> Self
    where
        F: FnOnce(SettleFn, SettleFn) -> Result<(), SettleError>,
    {
        let settlable = Self::pending(scheduler);
        let fulfil = {
            let s = settlable.clone();
            Box::new(move |value| s.settle_fulfilled(value)) as SettleFn
        };
        let reject = {
            let s = settlable.clone();
            Box::new(move |reason| s.settle_rejected(reason)) as SettleFn
        };
        if let Err(error) = initializer(fulfil, reject) {
            settlable.settle_rejected(Value::Error(error));
        }
        settlable
    }

    /// Creates a Settlable from a dynamic initializer value.
    ///
    /// Fails synchronously with a `TypeError` if the initializer is not
    /// callable. Otherwise the initializer is invoked with two
    /// [`Value::Function`] callbacks bound to the new Settlable, under the
    /// same first-settlement-wins error rule as [`Settlable::new`].
    pub fn construct(
        scheduler: Rc<dyn TaskScheduler>,
        initializer: &Value,
    ) -> Result<Self, SettleError> {
        let Some(init) = initializer.as_function() else {
            return Err(SettleError::type_error(format!(
                "Settlable initializer of type {} is not callable",
                initializer.type_of()
            )));
        };
        let settlable = Self::pending(scheduler);
        let fulfil = {
            let s = settlable.clone();
            Function::new(move |args| {
                s.settle_fulfilled(first_arg(args));
                Ok(Value::Undefined)
            })
        };
        let reject = {
            let s = settlable.clone();
            Function::new(move |args| {
                s.settle_rejected(first_arg(args));
                Ok(Value::Undefined)
            })
        };
        if let Err(error) = init.call(vec![Value::Function(fulfil), Value::Function(reject)]) {
            settlable.settle_rejected(Value::Error(error));
        }
        Ok(settlable)
    }

    /// Creates a Settlable resolved with `value`.
    ///
    /// A same-type input is returned unchanged; anything else funnels
    /// through the resolution procedure, so thenables still unwrap.
    pub fn fulfilled(scheduler: Rc<dyn TaskScheduler>, value: Value) -> Self {
        if let Value::Settlable(existing) = value {
            return existing;
        }
        let settlable = Self::pending(scheduler);
        settlable.settle_fulfilled(value);
        settlable
    }

    /// Creates a Settlable rejected with `reason`.
    pub fn rejected(scheduler: Rc<dyn TaskScheduler>, reason: Value) -> Self {
        let settlable = Self::pending(scheduler);
        settlable.settle_rejected(reason);
        settlable
    }

    /// Returns the observable settlement status.
    pub fn state(&self) -> SettleState {
        match self.inner.borrow().outcome {
            Outcome::Pending => SettleState::Pending,
            Outcome::Fulfilled(_) => SettleState::Fulfilled,
            Outcome::Rejected(_) => SettleState::Rejected,
        }
    }

    /// Returns whether a settlement request has been accepted yet.
    pub fn fate(&self) -> Fate {
        self.inner.borrow().fate
    }

    /// Returns the fulfillment value, if settled as Fulfilled.
    pub fn value(&self) -> Option<Value> {
        match &self.inner.borrow().outcome {
            Outcome::Fulfilled(value) => Some(value.clone()),
            _ => None,
        }
    }

    /// Returns the rejection reason, if settled as Rejected.
    pub fn reason(&self) -> Option<Value> {
        match &self.inner.borrow().outcome {
            Outcome::Rejected(reason) => Some(reason.clone()),
            _ => None,
        }
    }

    /// Returns whether two handles refer to the same Settlable.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Requests settlement with `value`, running the resolution procedure.
    ///
    /// A no-op after the first accepted settlement request.
    pub fn settle_fulfilled(&self, value: Value) {
        if !self.latch() {
            return;
        }
        self.resolve_with(value);
    }

    /// Requests settlement with failure `reason`.
    ///
    /// A no-op after the first accepted settlement request.
    pub fn settle_rejected(&self, reason: Value) {
        if !self.latch() {
            return;
        }
        self.transition_rejected(reason);
    }

    /// Accepts the first settlement request and locks out the rest.
    ///
    /// The latch flips before any resolution work begins, so re-entrant
    /// calls from an initializer or a thenable are already gated.
    fn latch(&self) -> bool {
        let mut inner = self.inner.borrow_mut();
        if inner.fate != Fate::Unresolved || !matches!(inner.outcome, Outcome::Pending) {
            return false;
        }
        inner.fate = Fate::Resolving;
        true
    }

    /// Registers continuation handlers and returns the dependent Settlable.
    ///
    /// `None` handlers get the defaults: identity pass-through for
    /// fulfillment, re-raise for rejection. Handler bodies never run
    /// synchronously inside this call or inside the settlement call that
    /// triggers them; they always run from the scheduler after the current
    /// synchronous stack unwinds.
    ///
    /// # Examples
    ///
    /// ```
    /// use settle_runtime::{Function, MicrotaskQueue, Settlable, Value};
    ///
    /// let queue = MicrotaskQueue::new();
    /// let settlable = Settlable::fulfilled(queue.scheduler(), Value::Smi(5));
    /// let doubled = settlable.then(
    ///     Some(Function::new(|args| match args.first() {
    ///         Some(Value::Smi(n)) => Ok(Value::Smi(n * 2)),
    ///         _ => Ok(Value::Undefined),
    ///     })),
    ///     None,
    /// );
    ///
    /// assert_eq!(doubled.value(), None); // nothing runs synchronously
    /// queue.run_until_done();
    /// assert_eq!(doubled.value(), Some(Value::Smi(10)));
    /// ```
    pub fn then(&self, on_fulfilled: Option<Function>, on_rejected: Option<Function>) -> Settlable {
        let chained = Settlable::pending(Rc::clone(&self.scheduler));
        let snapshot = self.inner.borrow().outcome.clone();
        match snapshot {
            Outcome::Pending => {
                let fulfil = {
                    let scheduler = Rc::clone(&self.scheduler);
                    let target = chained.clone();
                    Box::new(move |value: Value| {
                        scheduler.enqueue(reaction_task(target, on_fulfilled, true, value));
                    }) as Box<dyn FnOnce(Value)>
                };
                let reject = {
                    let scheduler = Rc::clone(&self.scheduler);
                    let target = chained.clone();
                    Box::new(move |reason: Value| {
                        scheduler.enqueue(reaction_task(target, on_rejected, false, reason));
                    }) as Box<dyn FnOnce(Value)>
                };
                self.inner.borrow_mut().continuations.push(Continuation {
                    on_fulfilled: fulfil,
                    on_rejected: reject,
                });
            }
            Outcome::Fulfilled(value) => {
                self.scheduler
                    .enqueue(reaction_task(chained.clone(), on_fulfilled, true, value));
            }
            Outcome::Rejected(reason) => {
                self.scheduler
                    .enqueue(reaction_task(chained.clone(), on_rejected, false, reason));
            }
        }
        chained
    }

    /// Registers a rejection handler only. Sugar over [`Settlable::then`].
    pub fn catch_rejection(&self, on_rejected: Option<Function>) -> Settlable {
        self.then(None, on_rejected)
    }

    /// The resolution procedure: unwraps a candidate settlement value,
    /// possibly recursively, into a terminal outcome.
    ///
    /// Callers must have latched `fate` first.
    fn resolve_with(&self, value: Value) {
        match value {
            Value::Settlable(source) => {
                if self.ptr_eq(&source) {
                    self.transition_rejected(Value::Error(SettleError::type_error(
                        "chaining cycle detected: a Settlable cannot be resolved with itself",
                    )));
                } else {
                    self.adopt(source);
                }
            }
            Value::Object(object) => match object.try_then() {
                Err(error) => self.transition_rejected(Value::Error(error)),
                Ok(Some(member)) => match member.as_function() {
                    Some(then) => self.unwrap_thenable(then),
                    // Looked thenable but the member is not callable:
                    // treat the object as a plain value.
                    None => self.transition_fulfilled(Value::Object(object)),
                },
                Ok(None) => self.transition_fulfilled(Value::Object(object)),
            },
            terminal => self.transition_fulfilled(terminal),
        }
    }

    /// Mirrors another Settlable's eventual outcome onto this one.
    ///
    /// Depth is bounded by the chain length; each link resolves in its own
    /// turn as the link before it settles.
    fn adopt(&self, source: Settlable) {
        let snapshot = source.inner.borrow().outcome.clone();
        match snapshot {
            Outcome::Pending => {
                let fulfil = {
                    let target = self.clone();
                    Box::new(move |value: Value| target.transition_fulfilled(value))
                        as Box<dyn FnOnce(Value)>
                };
                let reject = {
                    let target = self.clone();
                    Box::new(move |reason: Value| target.transition_rejected(reason))
                        as Box<dyn FnOnce(Value)>
                };
                source.inner.borrow_mut().continuations.push(Continuation {
                    on_fulfilled: fulfil,
                    on_rejected: reject,
                });
            }
            // Already settled: take one deferred hop so observable ordering
            // stays consistent with the chaining operation.
            Outcome::Fulfilled(value) => {
                let target = self.clone();
                self.scheduler
                    .enqueue(MicroTask::new(move || target.transition_fulfilled(value)));
            }
            Outcome::Rejected(reason) => {
                let target = self.clone();
                self.scheduler
                    .enqueue(MicroTask::new(move || target.transition_rejected(reason)));
            }
        }
    }

    /// Invokes a foreign `then`, guarding against double and late callbacks.
    ///
    /// Both callbacks share one latch cell; the first to fire wins and every
    /// later call, from either callback, is silently ignored. A synchronous
    /// error from the `then` itself only counts if neither callback fired.
    fn unwrap_thenable(&self, then: Function) {
        let called = Rc::new(Cell::new(false));
        let fulfil = {
            let target = self.clone();
            let called = Rc::clone(&called);
            Function::new(move |args| {
                if !called.replace(true) {
                    target.resolve_with(first_arg(args));
                }
                Ok(Value::Undefined)
            })
        };
        let reject = {
            let target = self.clone();
            let called = Rc::clone(&called);
            Function::new(move |args| {
                if !called.replace(true) {
                    target.transition_rejected(first_arg(args));
                }
                Ok(Value::Undefined)
            })
        };
        if let Err(error) = then.call(vec![Value::Function(fulfil), Value::Function(reject)]) {
            if !called.replace(true) {
                self.transition_rejected(Value::Error(error));
            }
        }
    }

    /// Final Pending → Fulfilled transition; drains continuations in
    /// registration order.
    fn transition_fulfilled(&self, value: Value) {
        let continuations = {
            let mut inner = self.inner.borrow_mut();
            if !matches!(inner.outcome, Outcome::Pending) {
                return;
            }
            inner.outcome = Outcome::Fulfilled(value.clone());
            // Taken out of the cell before any thunk runs, so no borrow is
            // held across a callback.
            std::mem::take(&mut inner.continuations)
        };
        for continuation in continuations {
            (continuation.on_fulfilled)(value.clone());
        }
    }

    /// Final Pending → Rejected transition; drains continuations in
    /// registration order, firing the rejection side of each pair.
    fn transition_rejected(&self, reason: Value) {
        let continuations = {
            let mut inner = self.inner.borrow_mut();
            if !matches!(inner.outcome, Outcome::Pending) {
                return;
            }
            inner.outcome = Outcome::Rejected(reason.clone());
            std::mem::take(&mut inner.continuations)
        };
        for continuation in continuations {
            (continuation.on_rejected)(reason.clone());
        }
    }
}

/// Builds the deferred task that runs one side of a continuation pair and
/// settles the dependent Settlable with the handler's outcome.
fn reaction_task(
    target: Settlable,
    handler: Option<Function>,
    is_fulfillment: bool,
    payload: Value,
) -> MicroTask {
    MicroTask::new(move || match handler {
        Some(handler) => match handler.call(vec![payload]) {
            Ok(value) => target.settle_fulfilled(value),
            Err(error) => target.settle_rejected(Value::Error(error)),
        },
        // Default handlers: identity pass-through / re-raise.
        None if is_fulfillment => target.settle_fulfilled(payload),
        None => target.settle_rejected(payload),
    })
}

fn first_arg(args: Vec<Value>) -> Value {
    args.into_iter().next().unwrap_or(Value::Undefined)
}
