use std::sync::Arc;

use crate::arguments::Arguments;
use crate::consistency::Consistency;
use crate::driver::Driver;
use crate::encode::Encode;
use crate::error::{Error, Result};
use crate::handle::StatementHandle;
use crate::logger::AllocationLogger;
use crate::options::StatementOptions;
use crate::value::Value;

/// A single bindable, executable query instance.
///
/// A `Statement` exclusively owns one native statement handle and releases it exactly once,
/// when the `Statement` is dropped. It cannot be cloned. Moving it moves the handle and the
/// bind cursor together; assigning a new `Statement` over an existing one releases the old
/// handle right away.
///
/// # Binding
///
/// Values are attached to parameter slots in order, starting from slot `0`. Each successful
/// [`bind`](Self::bind) advances the cursor by one; binding past the statement's arity fails with
/// [`Error::BindIndexOutOfBounds`] and leaves the cursor where it was. To reuse a statement,
/// [`reset`](Self::reset) it, which sets the arity and rewinds the cursor in one step.
///
/// ```rust
/// # fn main() -> cqlx_core::Result<()> {
/// use cqlx_core::mock::MockDriver;
/// use cqlx_core::Statement;
///
/// let driver = MockDriver::new();
///
/// let mut statement = Statement::new(&driver, "SELECT * FROM t WHERE k = ?", 1)?;
/// statement.bind("key")?;
///
/// assert_eq!(statement.bind_cursor(), 1);
/// assert!(statement.bind(2_i32).is_err());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Statement<D: Driver> {
    handle: StatementHandle<D>,
    arity: usize,
    bind_cursor: usize,
    consistency: Option<Consistency>,
}

impl<D: Driver> Statement<D> {
    /// Allocates a statement for `query` with `arg_count` parameter slots.
    ///
    /// The statement's consistency is set to the default, [`Consistency::Quorum`].
    pub fn new(driver: &Arc<D>, query: &str, arg_count: usize) -> Result<Self> {
        Self::with_options(driver, query, arg_count, &StatementOptions::default())
    }

    /// Allocates a statement for `query` that takes no parameters.
    pub fn unbound(driver: &Arc<D>, query: &str) -> Result<Self> {
        Self::new(driver, query, 0)
    }

    /// Allocates a statement for `query` with `arg_count` parameter slots, applying the
    /// consistency level and log settings from `options`.
    pub fn with_options(
        driver: &Arc<D>,
        query: &str,
        arg_count: usize,
        options: &StatementOptions,
    ) -> Result<Self> {
        let mut logger =
            AllocationLogger::new(query, "statement", options.log_settings.clone());

        let raw = driver.allocate_statement(query, arg_count).map_err(|e| {
            logger.set_error(&e);
            Error::allocation(e)
        })?;

        logger.set_arity(arg_count);

        // owned from here on: an error below releases the handle
        let mut statement = Self {
            handle: StatementHandle::new(Arc::clone(driver), raw),
            arity: arg_count,
            bind_cursor: 0,
            consistency: None,
        };

        statement.set_consistency(options.consistency)?;

        Ok(statement)
    }

    /// Wraps a handle produced by a collaborator, e.g. a prepared query.
    ///
    /// The arity is read from the driver. No consistency level is applied; whatever policy the
    /// collaborator baked into the handle is kept.
    pub fn from_handle(handle: StatementHandle<D>) -> Self {
        let arity = handle.driver().statement_parameter_count(handle.as_raw());

        Self {
            handle,
            arity,
            bind_cursor: 0,
            consistency: None,
        }
    }

    /// Takes ownership of a raw statement allocated by `driver`.
    pub fn from_raw(driver: &Arc<D>, raw: D::Statement) -> Self {
        Self::from_handle(StatementHandle::new(Arc::clone(driver), raw))
    }

    /// Reallocates the parameter slots for `arg_count` values and rewinds the bind cursor.
    ///
    /// If the driver rejects the resize, the error is returned as [`Error::Protocol`] and the
    /// arity and cursor keep their previous values. Whether the native handle is still usable
    /// at that point is up to the driver; if it gives no guarantee, drop the statement.
    pub fn reset(&mut self, arg_count: usize) -> Result<()> {
        let (driver, raw) = self.handle.split_mut();

        if let Err(e) = driver.resize_statement_parameters(raw, arg_count) {
            tracing::debug!(
                target: "cqlx::statement",
                arity = self.arity,
                requested = arg_count,
                error = %e,
                "driver rejected parameter resize"
            );

            return Err(Error::protocol(e));
        }

        self.arity = arg_count;
        self.bind_cursor = 0;

        Ok(())
    }

    /// Binds `value` to the next parameter slot and advances the cursor.
    pub fn bind<T>(&mut self, value: T) -> Result<()>
    where
        T: Encode,
    {
        self.check_bounds()?;

        let value = value.encode().map_err(Error::Encode)?;

        self.bind_value(&value)
    }

    /// Binds `NULL` to the next parameter slot and advances the cursor.
    pub fn bind_null(&mut self) -> Result<()> {
        self.bind_value(&Value::Null)
    }

    /// Binds every value in `arguments`, in order.
    ///
    /// Nothing is bound if `arguments` holds more values than there are slots left.
    /// Otherwise binding stops at the first value the driver rejects; the cursor then points
    /// at that value's slot.
    pub fn bind_all(&mut self, arguments: Arguments) -> Result<()> {
        if arguments.len() > self.remaining() {
            return Err(Error::BindIndexOutOfBounds {
                index: self.bind_cursor + arguments.len() - 1,
                arity: self.arity,
            });
        }

        for value in arguments {
            self.bind_value(&value)?;
        }

        Ok(())
    }

    fn check_bounds(&self) -> Result<()> {
        if self.bind_cursor >= self.arity {
            return Err(Error::BindIndexOutOfBounds {
                index: self.bind_cursor,
                arity: self.arity,
            });
        }

        Ok(())
    }

    fn bind_value(&mut self, value: &Value) -> Result<()> {
        self.check_bounds()?;

        let index = self.bind_cursor;
        let (driver, raw) = self.handle.split_mut();

        if let Err(e) = driver.bind_statement_parameter(raw, index, value) {
            tracing::debug!(
                target: "cqlx::statement",
                index,
                value_type = value.type_name(),
                error = %e,
                "driver rejected bound value"
            );

            return Err(Error::protocol(e));
        }

        self.bind_cursor += 1;

        Ok(())
    }

    /// Applies `consistency` to the native handle.
    pub fn set_consistency(&mut self, consistency: Consistency) -> Result<()> {
        let (driver, raw) = self.handle.split_mut();

        if let Err(e) = driver.set_statement_consistency(raw, consistency) {
            tracing::debug!(
                target: "cqlx::statement",
                %consistency,
                error = %e,
                "driver rejected consistency level"
            );

            return Err(Error::protocol(e));
        }

        self.consistency = Some(consistency);

        Ok(())
    }

    /// The consistency level last applied through this statement.
    ///
    /// `None` for statements wrapped from a collaborator's handle until
    /// [`set_consistency`](Self::set_consistency) is called.
    #[inline]
    pub fn consistency(&self) -> Option<Consistency> {
        self.consistency
    }

    /// Index of the next parameter slot to be filled.
    #[inline]
    pub fn bind_cursor(&self) -> usize {
        self.bind_cursor
    }

    /// Number of parameter slots the handle was constructed or last reset with.
    #[inline]
    pub fn arity(&self) -> usize {
        self.arity
    }

    #[inline]
    pub fn remaining(&self) -> usize {
        self.arity - self.bind_cursor
    }

    #[inline]
    pub fn is_fully_bound(&self) -> bool {
        self.bind_cursor == self.arity
    }

    /// A view of the native handle, for the execution layer to dispatch against.
    #[inline]
    pub fn handle(&self) -> &D::Statement {
        self.handle.as_raw()
    }

    #[inline]
    pub fn driver(&self) -> &Arc<D> {
        self.handle.driver()
    }

    /// Unwraps the owning handle, discarding the bind cursor.
    pub fn into_handle(self) -> StatementHandle<D> {
        self.handle
    }
}

#[cfg(test)]
mod tests {
    use std::mem;

    use super::*;
    use crate::error::ErrorKind;
    use crate::mock::{MockDriver, MockError};

    #[test]
    fn it_binds_exactly_arity_values() -> Result<()> {
        let driver = MockDriver::new();

        for n in 0..6 {
            let mut statement = Statement::new(&driver, "INSERT INTO t JSON ?", n)?;

            for i in 0..n {
                statement.bind(i32::try_from(i).unwrap())?;
            }

            assert_eq!(statement.bind_cursor(), n);
            assert!(statement.is_fully_bound());
            assert!(matches!(
                statement.bind(0_i32),
                Err(Error::BindIndexOutOfBounds { index, arity }) if index == n && arity == n
            ));
            assert_eq!(statement.bind_cursor(), n);
        }

        assert_eq!(driver.live_handles(), 0);

        Ok(())
    }

    #[test]
    fn it_applies_quorum_by_default() -> Result<()> {
        let driver = MockDriver::new();
        let statement = Statement::unbound(&driver, "SELECT now() FROM system.local")?;

        assert_eq!(statement.arity(), 0);
        assert_eq!(statement.consistency(), Some(Consistency::Quorum));
        assert_eq!(statement.handle().consistency(), Some(Consistency::Quorum));

        Ok(())
    }

    #[test]
    fn it_applies_configured_consistency() -> Result<()> {
        let driver = MockDriver::new();
        let options = StatementOptions::new().consistency(Consistency::LocalOne);

        let mut statement = Statement::with_options(&driver, "SELECT * FROM t", 0, &options)?;
        assert_eq!(statement.handle().consistency(), Some(Consistency::LocalOne));

        statement.set_consistency(Consistency::All)?;
        assert_eq!(statement.consistency(), Some(Consistency::All));
        assert_eq!(statement.handle().consistency(), Some(Consistency::All));

        Ok(())
    }

    #[test]
    fn it_keeps_the_previous_level_when_consistency_is_rejected() -> Result<()> {
        let driver = MockDriver::new();

        driver.fail_next_consistency(MockError::new(ErrorKind::InvalidState, "unsupported"));
        let err = Statement::new(&driver, "SELECT * FROM t", 0).unwrap_err();
        assert!(err.is_protocol());
        assert_eq!(driver.allocations(), 1);
        assert_eq!(driver.live_handles(), 0);

        let mut statement = Statement::new(&driver, "SELECT * FROM t", 0)?;
        driver.fail_next_consistency(MockError::new(ErrorKind::InvalidState, "unsupported"));
        assert!(statement.set_consistency(Consistency::Two).is_err());
        assert_eq!(statement.consistency(), Some(Consistency::Quorum));

        Ok(())
    }

    #[test]
    fn it_reports_allocation_failures() {
        let driver = MockDriver::new();

        let err = Statement::new(&driver, "   ", 1).unwrap_err();
        assert!(err.is_allocation());
        assert!(err.as_driver_error().unwrap().is_invalid_query());

        driver.fail_next_allocation(MockError::new(ErrorKind::ResourceExhausted, "no memory"));
        let err = Statement::new(&driver, "SELECT * FROM t", 0).unwrap_err();
        assert!(err.as_driver_error().unwrap().is_resource_exhausted());

        assert_eq!(driver.allocations(), 0);
    }

    #[test]
    fn it_rewinds_the_cursor_on_reset() -> Result<()> {
        let driver = MockDriver::new();
        let mut statement = Statement::new(&driver, "UPDATE t SET v = ? WHERE k = ?", 2)?;

        statement.bind("v")?;
        assert_eq!(statement.bind_cursor(), 1);

        statement.reset(3)?;
        assert_eq!(statement.bind_cursor(), 0);
        assert_eq!(statement.arity(), 3);
        assert_eq!(statement.handle().values(), &[None, None, None]);

        statement.bind(1_i64)?;
        statement.bind(2_i64)?;
        statement.bind(3_i64)?;
        assert!(statement.is_fully_bound());

        statement.reset(0)?;
        assert!(statement.is_fully_bound());
        assert!(statement.bind_null().is_err());

        Ok(())
    }

    #[test]
    fn it_keeps_state_when_reset_is_rejected() -> Result<()> {
        let driver = MockDriver::new();
        let mut statement = Statement::new(&driver, "UPDATE t SET v = ? WHERE k = ?", 2)?;
        statement.bind("v")?;

        driver.fail_next_resize(MockError::new(ErrorKind::InvalidState, "statement in flight"));

        let err = statement.reset(4).unwrap_err();
        assert!(err.is_protocol());
        assert_eq!(statement.arity(), 2);
        assert_eq!(statement.bind_cursor(), 1);

        Ok(())
    }

    #[test]
    fn it_does_not_advance_on_rejected_bind() -> Result<()> {
        let driver = MockDriver::new();
        let mut statement = Statement::new(&driver, "SELECT * FROM t WHERE k = ?", 1)?;

        driver.fail_next_bind(MockError::new(ErrorKind::InvalidState, "type mismatch"));
        assert!(statement.bind("k").unwrap_err().is_protocol());
        assert_eq!(statement.bind_cursor(), 0);

        statement.bind("k")?;
        assert_eq!(
            statement.handle().values(),
            &[Some(Value::Text("k".into()))]
        );

        Ok(())
    }

    #[test]
    fn it_rejects_oversized_argument_lists_up_front() -> Result<()> {
        let driver = MockDriver::new();
        let mut statement = Statement::new(&driver, "INSERT INTO t (a, b) VALUES (?, ?)", 2)?;

        let mut args = Arguments::new();
        args.add(1_i32)?;
        args.add(2_i32)?;
        args.add(3_i32)?;

        assert!(matches!(
            statement.bind_all(args),
            Err(Error::BindIndexOutOfBounds { index: 2, arity: 2 })
        ));
        assert_eq!(statement.bind_cursor(), 0);
        assert_eq!(statement.handle().values(), &[None, None]);

        Ok(())
    }

    #[test]
    fn it_moves_handle_and_cursor_together() -> Result<()> {
        let driver = MockDriver::new();
        let mut a = Statement::new(&driver, "SELECT * FROM t WHERE k = ?", 1)?;
        a.bind(7_i32)?;
        let id = a.handle().id();

        let b = a;
        assert_eq!(b.bind_cursor(), 1);
        assert_eq!(b.handle().id(), id);
        assert_eq!(driver.release_count(id), 0);

        drop(b);
        assert_eq!(driver.release_count(id), 1);

        Ok(())
    }

    #[test]
    fn it_releases_the_overwritten_handle_once() -> Result<()> {
        let driver = MockDriver::new();
        let a = Statement::new(&driver, "SELECT a FROM t", 0)?;
        let mut b = Statement::new(&driver, "SELECT b FROM t", 0)?;
        let (a_id, b_id) = (a.handle().id(), b.handle().id());

        b = a;
        assert_eq!(driver.release_count(b_id), 1);
        assert_eq!(driver.release_count(a_id), 0);
        assert_eq!(b.handle().id(), a_id);

        drop(b);
        assert_eq!(driver.release_count(a_id), 1);
        assert_eq!(driver.releases(), 2);

        Ok(())
    }

    #[test]
    fn it_swaps_without_releasing() -> Result<()> {
        let driver = MockDriver::new();
        let mut a = Statement::new(&driver, "SELECT a FROM t WHERE k = ?", 1)?;
        let mut b = Statement::new(&driver, "SELECT b FROM t", 0)?;
        a.bind(1_i32)?;
        let (a_id, b_id) = (a.handle().id(), b.handle().id());

        mem::swap(&mut a, &mut b);
        assert_eq!(a.handle().id(), b_id);
        assert_eq!(b.handle().id(), a_id);
        assert_eq!(b.bind_cursor(), 1);
        assert_eq!(a.bind_cursor(), 0);

        let old = mem::replace(&mut a, Statement::unbound(&driver, "SELECT c FROM t")?);
        assert_eq!(driver.releases(), 0);

        drop(old);
        assert_eq!(driver.release_count(b_id), 1);

        Ok(())
    }

    #[test]
    fn it_wraps_foreign_handles_without_consistency() -> Result<()> {
        let driver = MockDriver::new();
        let raw = driver
            .allocate_statement("SELECT * FROM t WHERE a = ? AND b = ?", 2)
            .map_err(Error::allocation)?;

        let statement = Statement::from_raw(&driver, raw);
        assert_eq!(statement.arity(), 2);
        assert_eq!(statement.consistency(), None);
        assert_eq!(statement.handle().consistency(), None);

        let handle = statement.into_handle();
        assert!(driver.is_live(handle.as_raw().id()));

        Ok(())
    }
}
