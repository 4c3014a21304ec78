#![cfg_attr(docsrs, feature(doc_cfg))]
//! Safe, move-only owners for the statement and prepared-query handles of a native CQL driver.
//!
//! A [`Statement`] exclusively owns one statement handle, tracks the cursor used to bind
//! parameters in order, and releases the handle exactly once when dropped. A [`PreparedQuery`]
//! owns a precompiled template and derives independent statements from it.
//!
//! The native runtime is reached through the [`Driver`] trait. Enable the `mock` feature for
//! an in-memory implementation.

// Modules
pub use cqlx_core::{arguments, consistency, driver, encode, error, handle, options, value};

// Types
pub use cqlx_core::{
    Arguments, Consistency, Driver, DriverError, Encode, Error, ErrorKind, LogSettings,
    PreparedHandle, PreparedQuery, Result, Statement, StatementHandle, StatementOptions, Value,
};

#[cfg(feature = "mock")]
#[cfg_attr(docsrs, doc(cfg(feature = "mock")))]
pub use cqlx_core::mock;
