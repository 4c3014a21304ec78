//! Owning wrappers around raw driver handles.
//!
//! Each wrapper holds exactly one raw handle and a reference to the [`Driver`] that allocated
//! it, and gives the handle back to that driver exactly once, in `Drop`. Neither wrapper is
//! `Clone`: a driver-owned handle cannot be duplicated without reference counting inside the
//! runtime itself. Ownership moves with the value; a moved-from binding is inaccessible, so
//! there is no "empty" handle to guard against.

// Releasing a handle moves it out of a `ManuallyDrop` field exactly once.
// All unsafe blocks state why the field is not read again.
#![allow(unsafe_code)]

use std::fmt::{self, Debug, Formatter};
use std::mem::ManuallyDrop;
use std::ptr;
use std::sync::Arc;

use crate::driver::Driver;

/// Exclusive owner of a raw [`Driver::Statement`].
pub struct StatementHandle<D: Driver> {
    driver: Arc<D>,
    raw: ManuallyDrop<D::Statement>,
}

/// Exclusive owner of a raw [`Driver::Prepared`] template.
pub struct PreparedHandle<D: Driver> {
    driver: Arc<D>,
    raw: ManuallyDrop<D::Prepared>,
}

impl<D: Driver> StatementHandle<D> {
    /// Takes ownership of a raw statement allocated by `driver`.
    ///
    /// The handle will be released through `driver` when the returned value is dropped.
    pub fn new(driver: Arc<D>, raw: D::Statement) -> Self {
        Self {
            driver,
            raw: ManuallyDrop::new(raw),
        }
    }

    #[inline]
    pub fn as_raw(&self) -> &D::Statement {
        &self.raw
    }

    /// The driver and the raw statement, borrowed together for a mutating entry point.
    #[inline]
    pub(crate) fn split_mut(&mut self) -> (&D, &mut D::Statement) {
        (&*self.driver, &mut *self.raw)
    }

    #[inline]
    pub fn driver(&self) -> &Arc<D> {
        &self.driver
    }

    /// Gives up ownership of the raw statement without releasing it.
    ///
    /// The caller becomes responsible for passing it to [`Driver::free_statement`].
    pub fn into_raw(self) -> D::Statement {
        let mut this = ManuallyDrop::new(self);

        // SAFETY: `this` is never dropped, so each field is moved out exactly once here
        unsafe {
            drop(ptr::read(&this.driver));
            ManuallyDrop::take(&mut this.raw)
        }
    }
}

impl<D: Driver> PreparedHandle<D> {
    /// Takes ownership of a raw template produced by a prepare round-trip against `driver`.
    pub fn new(driver: Arc<D>, raw: D::Prepared) -> Self {
        Self {
            driver,
            raw: ManuallyDrop::new(raw),
        }
    }

    #[inline]
    pub fn as_raw(&self) -> &D::Prepared {
        &self.raw
    }

    #[inline]
    pub fn driver(&self) -> &Arc<D> {
        &self.driver
    }

    /// Gives up ownership of the raw template without releasing it.
    pub fn into_raw(self) -> D::Prepared {
        let mut this = ManuallyDrop::new(self);

        // SAFETY: `this` is never dropped, so each field is moved out exactly once here
        unsafe {
            drop(ptr::read(&this.driver));
            ManuallyDrop::take(&mut this.raw)
        }
    }
}

impl<D: Driver> Drop for StatementHandle<D> {
    fn drop(&mut self) {
        // SAFETY: `raw` is not accessed again once the handle is being dropped
        let raw = unsafe { ManuallyDrop::take(&mut self.raw) };

        tracing::trace!(target: "cqlx::handle", handle = ?raw, "releasing statement handle");

        self.driver.free_statement(raw);
    }
}

impl<D: Driver> Drop for PreparedHandle<D> {
    fn drop(&mut self) {
        // SAFETY: `raw` is not accessed again once the handle is being dropped
        let raw = unsafe { ManuallyDrop::take(&mut self.raw) };

        tracing::trace!(target: "cqlx::handle", handle = ?raw, "releasing prepared handle");

        self.driver.free_prepared(raw);
    }
}

impl<D: Driver> Debug for StatementHandle<D> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_tuple("StatementHandle").field(&*self.raw).finish()
    }
}

impl<D: Driver> Debug for PreparedHandle<D> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PreparedHandle").field(&*self.raw).finish()
    }
}
