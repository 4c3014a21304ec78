use std::sync::Arc;

use crate::driver::Driver;
use crate::error::{Error, Result};
use crate::handle::{PreparedHandle, StatementHandle};
use crate::logger::AllocationLogger;
use crate::options::{LogSettings, StatementOptions};
use crate::statement::Statement;

/// A precompiled query template from which statements are derived.
///
/// A `PreparedQuery` exclusively owns its native template handle and releases it exactly once
/// when dropped. Templates come from a prepare round-trip performed by the execution layer;
/// wrapping one never allocates and cannot fail.
///
/// Deriving only reads the template, so [`statement`](Self::statement) takes `&self` and may be
/// called from several threads at once. Each derived [`Statement`] owns an independent handle
/// and stays valid after the `PreparedQuery` is gone.
///
/// ```rust
/// # fn main() -> cqlx_core::Result<()> {
/// use cqlx_core::mock::MockDriver;
/// use cqlx_core::PreparedQuery;
///
/// let driver = MockDriver::new();
/// let template = driver.prepare("INSERT INTO t (k, v) VALUES (?, ?)", 2);
///
/// let prepared = PreparedQuery::new(&driver, template);
/// let mut statement = prepared.statement()?;
///
/// statement.bind("k")?;
/// statement.bind(1_i32)?;
/// assert!(statement.is_fully_bound());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct PreparedQuery<D: Driver> {
    handle: PreparedHandle<D>,
    sql: Option<Arc<str>>,
    log_settings: LogSettings,
}

impl<D: Driver> PreparedQuery<D> {
    /// Takes ownership of a raw template prepared through `driver`.
    pub fn new(driver: &Arc<D>, raw: D::Prepared) -> Self {
        Self::from_handle(PreparedHandle::new(Arc::clone(driver), raw))
    }

    pub fn from_handle(handle: PreparedHandle<D>) -> Self {
        Self {
            handle,
            sql: None,
            log_settings: LogSettings::default(),
        }
    }

    /// Records the text the template was prepared from, for logging.
    pub fn with_sql(mut self, sql: impl Into<Arc<str>>) -> Self {
        self.sql = Some(sql.into());
        self
    }

    /// Uses the log settings from `options` when deriving statements.
    ///
    /// The consistency level in `options` is ignored; derived statements keep the policy baked
    /// into the template.
    pub fn with_options(mut self, options: &StatementOptions) -> Self {
        self.log_settings = options.log_settings.clone();
        self
    }

    /// Derives a new statement bound to this template's parameter shape.
    ///
    /// The statement's bind cursor starts at `0` and its arity is the template's parameter
    /// count.
    pub fn statement(&self) -> Result<Statement<D>> {
        let sql = self.sql.as_deref().unwrap_or("<prepared query>");
        let mut logger = AllocationLogger::new(sql, "derived statement", self.log_settings.clone());

        let driver = self.handle.driver();
        let raw = driver
            .allocate_statement_from_template(self.handle.as_raw())
            .map_err(|e| {
                logger.set_error(&e);
                Error::allocation(e)
            })?;

        let statement = Statement::from_handle(StatementHandle::new(Arc::clone(driver), raw));
        logger.set_arity(statement.arity());

        Ok(statement)
    }

    /// A view of the native template handle.
    #[inline]
    pub fn handle(&self) -> &D::Prepared {
        self.handle.as_raw()
    }

    #[inline]
    pub fn sql(&self) -> Option<&str> {
        self.sql.as_deref()
    }

    #[inline]
    pub fn driver(&self) -> &Arc<D> {
        self.handle.driver()
    }

    pub fn into_handle(self) -> PreparedHandle<D> {
        self.handle
    }
}
