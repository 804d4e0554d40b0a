//! End-to-end tests for the Settlable runtime
//!
//! Drives full scenarios through the public surface: initializers,
//! chaining, foreign thenables, and the manually stepped microtask queue.
//! Covers:
//! - Initializers settling synchronously, asynchronously, and never
//! - Chains that hop through pending Settlables and foreign thenables
//! - Observable ordering across independent chains
//! - Failure recovery through rejection handlers

use std::cell::RefCell;
use std::rc::Rc;

use core_types::SettleError;
use settle_runtime::{
    Function, MicroTask, MicrotaskQueue, SettleState, Settlable, TaskScheduler, Thenable, Value,
};

/// Helper producing a handler that appends a marker before passing the
/// incoming value through a mapping closure.
fn marked_handler<F>(
    order: &Rc<RefCell<Vec<&'static str>>>,
    marker: &'static str,
    map: F,
) -> Function
where
    F: Fn(Value) -> Value + 'static,
{
    let order = order.clone();
    Function::new(move |args| {
        order.borrow_mut().push(marker);
        Ok(map(args.first().cloned().unwrap_or(Value::Undefined)))
    })
}

#[test]
fn greeting_length_scenario() {
    let queue = MicrotaskQueue::new();

    let greeting = Settlable::new(queue.scheduler(), |settle_fulfilled, _| {
        settle_fulfilled(Value::String("How are u?".to_string()));
        Ok(())
    });

    let length = greeting.then(
        Some(Function::new(|args| match args.first() {
            Some(Value::String(text)) => Ok(Value::Smi(text.len() as i32)),
            _ => Ok(Value::Smi(0)),
        })),
        None,
    );

    assert_eq!(length.state(), SettleState::Pending);
    queue.run_until_done();
    assert_eq!(length.value(), Some(Value::Smi(11)));
}

#[test]
fn failing_initializer_scenario() {
    let queue = MicrotaskQueue::new();
    let doomed = Settlable::new(queue.scheduler(), |_, _| Err(SettleError::failure("boom")));

    let observed = Rc::new(RefCell::new(None));
    let o = observed.clone();
    let _handled = doomed.catch_rejection(Some(Function::new(move |args| {
        *o.borrow_mut() = args.first().cloned();
        Ok(Value::Undefined)
    })));

    queue.run_until_done();
    assert_eq!(
        *observed.borrow(),
        Some(Value::Error(SettleError::failure("boom")))
    );
}

#[test]
fn three_deep_chain_through_a_deferred_settlable() {
    let queue = MicrotaskQueue::new();
    let order = Rc::new(RefCell::new(Vec::new()));

    let source = Settlable::pending(queue.scheduler());
    let deferred = Settlable::pending(queue.scheduler());

    let f1 = {
        let order = order.clone();
        let deferred = deferred.clone();
        Function::new(move |_| {
            order.borrow_mut().push("f1");
            Ok(Value::Settlable(deferred.clone()))
        })
    };
    let f2 = marked_handler(&order, "f2", |value| match value {
        Value::Smi(n) => Value::Smi(n + 1),
        other => other,
    });
    let f3 = marked_handler(&order, "f3", |value| match value {
        Value::Smi(n) => Value::Smi(n * 2),
        other => other,
    });

    let last = source
        .then(Some(f1), None)
        .then(Some(f2), None)
        .then(Some(f3), None);

    source.settle_fulfilled(Value::Null);
    queue.run_until_done();
    assert_eq!(last.state(), SettleState::Pending);

    deferred.settle_fulfilled(Value::Smi(5));
    queue.run_until_done();

    assert_eq!(*order.borrow(), vec!["f1", "f2", "f3"]);
    assert_eq!(last.value(), Some(Value::Smi(12)));
}

#[test]
fn independent_chains_observe_queue_order() {
    let queue = MicrotaskQueue::new();
    let order = Rc::new(RefCell::new(Vec::new()));

    let source = Settlable::pending(queue.scheduler());
    let _a = source.then(Some(marked_handler(&order, "a", |v| v)), None);
    let _b = source.then(Some(marked_handler(&order, "b", |v| v)), None);

    source.settle_fulfilled(Value::Smi(1));
    let _c = source.then(Some(marked_handler(&order, "c", |v| v)), None);

    queue.run_until_done();
    assert_eq!(*order.borrow(), vec!["a", "b", "c"]);
}

/// A foreign thenable that produces its value through the queue rather than
/// synchronously, the way an external source of completion would.
struct QueuedSource {
    queue: MicrotaskQueue,
    value: i32,
}

impl Thenable for QueuedSource {
    fn try_then(&self) -> Result<Option<Value>, SettleError> {
        let queue = self.queue.clone();
        let value = self.value;
        Ok(Some(Value::Function(Function::new(move |args| {
            let resolve = args[0].as_function().expect("resolve callback");
            queue.enqueue(MicroTask::new(move || {
                let _ = resolve.call(vec![Value::Smi(value)]);
            }));
            Ok(Value::Undefined)
        }))))
    }
}

#[test]
fn foreign_thenable_interop_end_to_end() {
    let queue = MicrotaskQueue::new();
    let source = QueuedSource {
        queue: queue.clone(),
        value: 8,
    };

    let settlable = Settlable::pending(queue.scheduler());
    settlable.settle_fulfilled(Value::Object(Rc::new(source)));
    assert_eq!(settlable.state(), SettleState::Pending);

    let squared = settlable.then(
        Some(Function::new(|args| match args.first() {
            Some(Value::Smi(n)) => Ok(Value::Smi(n * n)),
            _ => Ok(Value::Undefined),
        })),
        None,
    );

    queue.run_until_done();
    assert_eq!(settlable.value(), Some(Value::Smi(8)));
    assert_eq!(squared.value(), Some(Value::Smi(64)));
}

#[test]
fn rejection_recovers_into_a_fulfilled_chain() {
    let queue = MicrotaskQueue::new();

    let source = Settlable::rejected(queue.scheduler(), Value::String("offline".to_string()));
    let recovered = source
        .catch_rejection(Some(Function::new(|_| {
            Ok(Value::String("cached".to_string()))
        })))
        .then(
            Some(Function::new(|args| match args.first() {
                Some(Value::String(s)) => Ok(Value::String(format!("{}!", s))),
                _ => Ok(Value::Undefined),
            })),
            None,
        );

    queue.run_until_done();
    assert_eq!(recovered.value(), Some(Value::String("cached!".to_string())));
}

#[test]
fn stepping_the_queue_one_task_at_a_time() {
    let queue = MicrotaskQueue::new();
    let source = Settlable::fulfilled(queue.scheduler(), Value::Smi(1));

    let first = source.then(None, None);
    let second = first.then(None, None);

    // One reaction per hop: each step settles exactly one link.
    assert!(queue.run_next());
    assert_eq!(first.value(), Some(Value::Smi(1)));
    assert_eq!(second.state(), SettleState::Pending);

    assert!(queue.run_next());
    assert_eq!(second.value(), Some(Value::Smi(1)));
    assert!(queue.is_empty());
}
