//! Error types shared across the Settlable runtime.
//!
//! Every failure the settlement machinery produces itself is a
//! [`SettleError`]; arbitrary application-supplied rejection reasons are
//! carried opaquely by the runtime and never pass through this type.

use std::fmt;

use thiserror::Error;

/// The kind of settlement error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// A value had the wrong shape (non-callable initializer, self-resolution
    /// cycle).
    TypeError,
    /// Looking up a thenable candidate's `then` member failed.
    AccessError,
    /// An application-supplied failure (initializer or handler error).
    Failure,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::TypeError => write!(f, "TypeError"),
            ErrorKind::AccessError => write!(f, "AccessError"),
            ErrorKind::Failure => write!(f, "Failure"),
        }
    }
}

/// An error raised by or carried through the settlement machinery.
///
/// # Examples
///
/// ```
/// use core_types::{ErrorKind, SettleError};
///
/// let error = SettleError::type_error("initializer is not callable");
/// assert_eq!(error.kind, ErrorKind::TypeError);
/// assert_eq!(error.to_string(), "TypeError: initializer is not callable");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct SettleError {
    /// The type of error
    pub kind: ErrorKind,
    /// Human-readable error message
    pub message: String,
}

impl SettleError {
    /// Creates a `TypeError`.
    pub fn type_error(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::TypeError,
            message: message.into(),
        }
    }

    /// Creates an `AccessError`.
    pub fn access_error(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::AccessError,
            message: message.into(),
        }
    }

    /// Creates an application-supplied `Failure`.
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Failure,
            message: message.into(),
        }
    }
}
