//! Core error types for the Settlable deferred-value runtime.
//!
//! This crate provides the foundational error types shared by the runtime
//! components.
//!
//! # Overview
//!
//! - [`SettleError`] - Errors raised by the settlement machinery
//! - [`ErrorKind`] - Types of settlement errors
//!
//! # Examples
//!
//! ```
//! use core_types::{ErrorKind, SettleError};
//!
//! let error = SettleError::type_error("chained to itself");
//! assert_eq!(error.kind, ErrorKind::TypeError);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

mod error;

pub use error::{ErrorKind, SettleError};
