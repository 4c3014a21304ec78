//! The boundary to the native driver runtime.
//!
//! cqlx does not talk to a cluster itself. Every handle it owns is allocated and released by
//! an implementation of [`Driver`], the same way a C driver exposes `*_new` / `*_free` entry
//! points for its opaque statement and prepared-query objects. The two handle flavors are the
//! associated types [`Driver::Statement`] and [`Driver::Prepared`]; nothing in this crate looks
//! inside them.
//!
//! All entry points are synchronous round-trips. A failure is reported as
//! [`Driver::Error`], which the owning types translate into
//! [`Error::Allocation`](crate::Error::Allocation) or [`Error::Protocol`](crate::Error::Protocol).
//!
//! An in-memory implementation is available as [`MockDriver`](crate::mock::MockDriver) with the
//! `mock` feature.

use std::fmt::Debug;

use crate::consistency::Consistency;
use crate::error::DriverError;
use crate::value::Value;

/// A native driver runtime that allocates and releases statement and prepared-query handles.
///
/// # Handle ownership
///
/// A raw handle returned from an `allocate_*` method is owned by the caller until it is passed
/// to the matching `free_*` method, which consumes it. Implementations may assume each handle is
/// freed at most once; the owning wrappers in [`handle`](crate::handle) guarantee it.
pub trait Driver: 'static + Send + Sync + Debug {
    /// An allocated statement: one bindable, executable query instance.
    type Statement: Send + Debug;

    /// A precompiled query template. Derivation only reads it, so it must be `Sync`.
    type Prepared: Send + Sync + Debug;

    /// The status a failed entry point reports.
    type Error: DriverError;

    /// Parses `query` and allocates a statement with `arg_count` parameter slots.
    fn allocate_statement(&self, query: &str, arg_count: usize)
        -> Result<Self::Statement, Self::Error>;

    /// Materializes a new statement bound to the parameter shape of `template`.
    fn allocate_statement_from_template(
        &self,
        template: &Self::Prepared,
    ) -> Result<Self::Statement, Self::Error>;

    /// Discards the statement's bound values and reallocates `arg_count` parameter slots.
    fn resize_statement_parameters(
        &self,
        statement: &mut Self::Statement,
        arg_count: usize,
    ) -> Result<(), Self::Error>;

    /// Number of parameter slots the statement currently has.
    fn statement_parameter_count(&self, statement: &Self::Statement) -> usize;

    fn set_statement_consistency(
        &self,
        statement: &mut Self::Statement,
        consistency: Consistency,
    ) -> Result<(), Self::Error>;

    /// Attaches `value` to the zero-based parameter slot `index`.
    fn bind_statement_parameter(
        &self,
        statement: &mut Self::Statement,
        index: usize,
        value: &Value,
    ) -> Result<(), Self::Error>;

    fn free_statement(&self, statement: Self::Statement);

    fn free_prepared(&self, prepared: Self::Prepared);
}
