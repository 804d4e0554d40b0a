//! Dynamic value representation for the settlement runtime.
//!
//! Settlables carry opaque payloads; this module provides the tagged
//! [`Value`] enum used for both fulfillment values and rejection reasons,
//! plus the [`Function`] callable wrapper used for initializers, handlers,
//! and thenable members.

use std::fmt;
use std::rc::Rc;

use core_types::SettleError;

use crate::settlable::Settlable;
use crate::thenable::Thenable;

/// A callable value.
///
/// `Function` is a cheaply clonable handle; clones share the same underlying
/// closure. Calls may re-enter: a function stashed by foreign code can be
/// invoked again while an earlier invocation is still on the stack, and the
/// resolution procedure relies on its callbacks tolerating exactly that.
/// Closures that need mutable state capture a [`Cell`](std::cell::Cell) or
/// [`RefCell`](std::cell::RefCell).
#[derive(Clone)]
pub struct Function {
    callback: Rc<dyn Fn(Vec<Value>) -> Result<Value, SettleError>>,
}

impl Function {
    /// Creates a new Function from a closure.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(Vec<Value>) -> Result<Value, SettleError> + 'static,
    {
        Self {
            callback: Rc::new(f),
        }
    }

    /// Calls the function with the given arguments.
    pub fn call(&self, args: Vec<Value>) -> Result<Value, SettleError> {
        (self.callback)(args)
    }

    fn ptr_eq(&self, other: &Self) -> bool {
        std::ptr::eq(
            Rc::as_ptr(&self.callback).cast::<()>(),
            Rc::as_ptr(&other.callback).cast::<()>(),
        )
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Function {{ ... }}")
    }
}

/// Represents any value a Settlable can hold.
///
/// Scalars are stored inline; functions, Settlables, and foreign objects are
/// reference-counted handles, so cloning a `Value` never copies a payload.
///
/// # Examples
///
/// ```
/// use settle_runtime::Value;
///
/// let number = Value::Smi(42);
/// assert_eq!(number.type_of(), "number");
/// assert!(number.as_function().is_none());
/// ```
#[derive(Clone)]
pub enum Value {
    /// The absent value (missing callback argument).
    Undefined,
    /// The null value.
    Null,
    /// A boolean.
    Boolean(bool),
    /// Small integer (fits in 32 bits).
    Smi(i32),
    /// IEEE 754 double-precision floating point.
    Double(f64),
    /// A string value.
    String(String),
    /// A callable value.
    Function(Function),
    /// A same-type deferred value; cloning shares the handle.
    Settlable(Settlable),
    /// A foreign object that may expose a `then` capability.
    Object(Rc<dyn Thenable>),
    /// A failure carried as a value. Rejection reasons produced by the
    /// settlement machinery itself use this variant.
    Error(SettleError),
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "Undefined"),
            Value::Null => write!(f, "Null"),
            Value::Boolean(b) => f.debug_tuple("Boolean").field(b).finish(),
            Value::Smi(n) => f.debug_tuple("Smi").field(n).finish(),
            Value::Double(n) => f.debug_tuple("Double").field(n).finish(),
            Value::String(s) => f.debug_tuple("String").field(s).finish(),
            Value::Function(_) => write!(f, "Function(...)"),
            Value::Settlable(s) => f.debug_tuple("Settlable").field(&s.state()).finish(),
            Value::Object(_) => write!(f, "Object(...)"),
            Value::Error(e) => f.debug_tuple("Error").field(e).finish(),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) => true,
            (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Smi(a), Value::Smi(b)) => a == b,
            (Value::Double(a), Value::Double(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            // Handles compare by identity, not structure.
            (Value::Function(a), Value::Function(b)) => a.ptr_eq(b),
            (Value::Settlable(a), Value::Settlable(b)) => a.ptr_eq(b),
            (Value::Object(a), Value::Object(b)) => std::ptr::eq(
                Rc::as_ptr(a).cast::<()>(),
                Rc::as_ptr(b).cast::<()>(),
            ),
            (Value::Error(a), Value::Error(b)) => a == b,
            _ => false,
        }
    }
}

impl Value {
    /// Returns the type name of this value, used in diagnostics.
    pub fn type_of(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "null",
            Value::Boolean(_) => "boolean",
            Value::Smi(_) => "number",
            Value::Double(_) => "number",
            Value::String(_) => "string",
            Value::Function(_) => "function",
            Value::Settlable(_) => "settlable",
            Value::Object(_) => "object",
            Value::Error(_) => "error",
        }
    }

    /// Extracts the callable capability, if this value has one.
    ///
    /// This is the tagged check used everywhere a "callable or not" decision
    /// is needed: non-callable values yield `None` and callers substitute
    /// their default behavior.
    pub fn as_function(&self) -> Option<Function> {
        match self {
            Value::Function(f) => Some(f.clone()),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "undefined"),
            Value::Null => write!(f, "null"),
            Value::Boolean(b) => write!(f, "{}", if *b { "true" } else { "false" }),
            Value::Smi(n) => write!(f, "{}", n),
            Value::Double(n) => write!(f, "{}", n),
            Value::String(s) => write!(f, "{}", s),
            Value::Function(_) => write!(f, "[function]"),
            Value::Settlable(s) => write!(f, "[settlable {:?}]", s.state()),
            Value::Object(_) => write!(f, "[object]"),
            Value::Error(e) => write!(f, "{}", e),
        }
    }
}
