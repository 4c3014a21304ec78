//! An in-memory [`Driver`] for tests.
//!
//! [`MockDriver`] keeps the state a real runtime keeps behind its opaque pointers in the raw
//! handle values themselves ([`MockStatement`], [`MockPrepared`]), and keeps bookkeeping about
//! every handle it ever allocated: whether it is still live and how many times it was released.
//! Failures can be injected one call at a time.

use std::borrow::Cow;
use std::collections::HashMap;
use std::error::Error as StdError;
use std::fmt::{self, Display, Formatter};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::consistency::Consistency;
use crate::driver::Driver;
use crate::error::{DriverError, ErrorKind};
use crate::value::Value;

/// Identity of a mock allocation. Statements and templates share one id space.
pub type HandleId = u64;

#[derive(Debug, Default)]
pub struct MockDriver {
    state: Mutex<MockState>,
}

#[derive(Debug, Default)]
struct MockState {
    next_id: HandleId,
    live: HashMap<HandleId, HandleKind>,
    releases: HashMap<HandleId, usize>,
    allocations: usize,
    allocation_limit: Option<usize>,
    fail_next_allocation: Option<MockError>,
    fail_next_resize: Option<MockError>,
    fail_next_bind: Option<MockError>,
    fail_next_consistency: Option<MockError>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HandleKind {
    Statement,
    Prepared,
}

/// A raw mock statement: its query text, parameter slots and applied consistency.
#[derive(Debug)]
pub struct MockStatement {
    id: HandleId,
    query: Arc<str>,
    template: Option<HandleId>,
    consistency: Option<Consistency>,
    slots: Vec<Option<Value>>,
}

/// A raw mock template.
#[derive(Debug)]
pub struct MockPrepared {
    id: HandleId,
    query: Arc<str>,
    arity: usize,
    consistency: Option<Consistency>,
}

#[derive(Debug, Clone)]
pub struct MockError {
    kind: ErrorKind,
    message: String,
}

impl MockDriver {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Stands in for the execution layer's prepare round-trip.
    ///
    /// The returned template is not owned by anything yet; wrap it in a
    /// [`PreparedQuery`](crate::prepared::PreparedQuery) to have it released.
    pub fn prepare(&self, query: &str, arity: usize) -> MockPrepared {
        self.prepare_inner(query, arity, None)
    }

    /// Like [`prepare`](Self::prepare), with a consistency level baked into the template.
    pub fn prepare_with_consistency(
        &self,
        query: &str,
        arity: usize,
        consistency: Consistency,
    ) -> MockPrepared {
        self.prepare_inner(query, arity, Some(consistency))
    }

    fn prepare_inner(
        &self,
        query: &str,
        arity: usize,
        consistency: Option<Consistency>,
    ) -> MockPrepared {
        let id = self.state.lock().register(HandleKind::Prepared);

        MockPrepared {
            id,
            query: query.into(),
            arity,
            consistency,
        }
    }

    /// The next `allocate_*` call fails with `error`.
    pub fn fail_next_allocation(&self, error: MockError) {
        self.state.lock().fail_next_allocation = Some(error);
    }

    /// The next `resize_statement_parameters` call fails with `error`.
    pub fn fail_next_resize(&self, error: MockError) {
        self.state.lock().fail_next_resize = Some(error);
    }

    /// The next `bind_statement_parameter` call fails with `error`.
    pub fn fail_next_bind(&self, error: MockError) {
        self.state.lock().fail_next_bind = Some(error);
    }

    /// The next `set_statement_consistency` call fails with `error`.
    pub fn fail_next_consistency(&self, error: MockError) {
        self.state.lock().fail_next_consistency = Some(error);
    }

    /// Refuse statement allocations while `limit` handles of any kind are live.
    pub fn set_allocation_limit(&self, limit: usize) {
        self.state.lock().allocation_limit = Some(limit);
    }

    /// Total number of handles allocated so far, templates included.
    pub fn allocations(&self) -> usize {
        self.state.lock().allocations
    }

    pub fn live_handles(&self) -> usize {
        self.state.lock().live.len()
    }

    pub fn is_live(&self, id: HandleId) -> bool {
        self.state.lock().live.contains_key(&id)
    }

    /// How many times the handle `id` was released.
    pub fn release_count(&self, id: HandleId) -> usize {
        self.state
            .lock()
            .releases
            .get(&id)
            .copied()
            .unwrap_or_default()
    }

    /// Total number of releases across all handles.
    pub fn releases(&self) -> usize {
        self.state.lock().releases.values().sum()
    }

    fn release(&self, id: HandleId, kind: HandleKind) {
        let mut state = self.state.lock();

        let count = {
            let count = state.releases.entry(id).or_default();
            *count += 1;
            *count
        };

        if count > 1 || state.live.remove(&id) != Some(kind) {
            // A real runtime would free the same memory twice here.
            panic!("mock handle {id} released twice or as the wrong kind ({kind:?})");
        }
    }

    fn check_allocation(&self) -> Result<HandleId, MockError> {
        let mut state = self.state.lock();

        if let Some(error) = state.fail_next_allocation.take() {
            return Err(error);
        }

        if let Some(limit) = state.allocation_limit {
            if state.live.len() >= limit {
                return Err(MockError::new(
                    ErrorKind::ResourceExhausted,
                    format!("handle limit of {limit} reached"),
                ));
            }
        }

        Ok(state.register(HandleKind::Statement))
    }
}

impl MockState {
    fn register(&mut self, kind: HandleKind) -> HandleId {
        self.next_id += 1;
        self.allocations += 1;
        self.live.insert(self.next_id, kind);
        self.next_id
    }
}

impl Driver for MockDriver {
    type Statement = MockStatement;
    type Prepared = MockPrepared;
    type Error = MockError;

    fn allocate_statement(&self, query: &str, arg_count: usize) -> Result<MockStatement, MockError> {
        if query.trim().is_empty() {
            return Err(MockError::new(ErrorKind::InvalidQuery, "empty query text"));
        }

        let id = self.check_allocation()?;

        Ok(MockStatement {
            id,
            query: query.into(),
            template: None,
            consistency: None,
            slots: vec![None; arg_count],
        })
    }

    fn allocate_statement_from_template(
        &self,
        template: &MockPrepared,
    ) -> Result<MockStatement, MockError> {
        let id = self.check_allocation()?;

        Ok(MockStatement {
            id,
            query: template.query.clone(),
            template: Some(template.id),
            consistency: template.consistency,
            slots: vec![None; template.arity],
        })
    }

    fn resize_statement_parameters(
        &self,
        statement: &mut MockStatement,
        arg_count: usize,
    ) -> Result<(), MockError> {
        if let Some(error) = self.state.lock().fail_next_resize.take() {
            return Err(error);
        }

        statement.slots.clear();
        statement.slots.resize(arg_count, None);

        Ok(())
    }

    fn statement_parameter_count(&self, statement: &MockStatement) -> usize {
        statement.slots.len()
    }

    fn set_statement_consistency(
        &self,
        statement: &mut MockStatement,
        consistency: Consistency,
    ) -> Result<(), MockError> {
        if let Some(error) = self.state.lock().fail_next_consistency.take() {
            return Err(error);
        }

        statement.consistency = Some(consistency);

        Ok(())
    }

    fn bind_statement_parameter(
        &self,
        statement: &mut MockStatement,
        index: usize,
        value: &Value,
    ) -> Result<(), MockError> {
        if let Some(error) = self.state.lock().fail_next_bind.take() {
            return Err(error);
        }

        let len = statement.slots.len();
        let slot = statement.slots.get_mut(index).ok_or_else(|| {
            MockError::new(
                ErrorKind::InvalidState,
                format!("index {index} out of range for {len} parameters"),
            )
        })?;

        *slot = Some(value.clone());

        Ok(())
    }

    fn free_statement(&self, statement: MockStatement) {
        self.release(statement.id, HandleKind::Statement);
    }

    fn free_prepared(&self, prepared: MockPrepared) {
        self.release(prepared.id, HandleKind::Prepared);
    }
}

impl MockStatement {
    pub fn id(&self) -> HandleId {
        self.id
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// The template this statement was derived from, if any.
    pub fn template(&self) -> Option<HandleId> {
        self.template
    }

    pub fn consistency(&self) -> Option<Consistency> {
        self.consistency
    }

    /// The value bound to each slot, `None` for slots not bound yet.
    pub fn values(&self) -> &[Option<Value>] {
        &self.slots
    }
}

impl MockPrepared {
    pub fn id(&self) -> HandleId {
        self.id
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn arity(&self) -> usize {
        self.arity
    }
}

impl MockError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl Display for MockError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "(kind: {:?}) {}", self.kind, self.message)
    }
}

impl StdError for MockError {}

impl DriverError for MockError {
    #[inline]
    fn message(&self) -> &str {
        &self.message
    }

    fn code(&self) -> Option<Cow<'_, str>> {
        let code = match self.kind {
            ErrorKind::InvalidQuery => "SYNTAX_ERROR",
            ErrorKind::ResourceExhausted => "OVERLOADED",
            ErrorKind::TemplateMismatch => "UNPREPARED",
            ErrorKind::InvalidState => "INVALID",
            _ => "SERVER_ERROR",
        };

        Some(code.into())
    }

    #[doc(hidden)]
    fn as_error(&self) -> &(dyn StdError + Send + Sync + 'static) {
        self
    }

    #[doc(hidden)]
    fn as_error_mut(&mut self) -> &mut (dyn StdError + Send + Sync + 'static) {
        self
    }

    #[doc(hidden)]
    fn into_error(self: Box<Self>) -> Box<dyn StdError + Send + Sync + 'static> {
        self
    }

    fn kind(&self) -> ErrorKind {
        self.kind
    }
}
