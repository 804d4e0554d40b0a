//! The thenable capability for foreign objects.

use core_types::SettleError;

use crate::value::Value;

/// A foreign object that may expose a `then`-like member.
///
/// The resolution procedure interoperates with arbitrary thenable-shaped
/// objects, not only [`Settlable`](crate::Settlable) instances. Instead of
/// open-ended runtime type inspection, the capability is extracted through
/// one fallible call whose three outcomes are all meaningful:
///
/// - `Err(e)`: the lookup itself failed; the Settlable being resolved is
///   rejected with `e`.
/// - `Ok(None)`: no such member; the object is treated as a plain value.
/// - `Ok(Some(member))`: the member was read. If it is not callable the
///   object is still treated as a plain value; if it is, it is invoked with
///   two callback [`Value::Function`]s `(resolve, reject)`.
///
/// # Examples
///
/// ```
/// use settle_runtime::{Function, Thenable, Value};
/// use core_types::SettleError;
///
/// struct Eager;
///
/// impl Thenable for Eager {
///     fn try_then(&self) -> Result<Option<Value>, SettleError> {
///         Ok(Some(Value::Function(Function::new(|args| {
///             let resolve = args[0].as_function().expect("resolve callback");
///             resolve.call(vec![Value::Smi(7)])
///         }))))
///     }
/// }
/// ```
pub trait Thenable {
    /// Fallible lookup of the `then`-like member.
    fn try_then(&self) -> Result<Option<Value>, SettleError>;
}
