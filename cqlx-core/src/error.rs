//! Types for working with errors produced by cqlx.

use std::any::type_name;
use std::borrow::Cow;
use std::error::Error as StdError;
use std::fmt::Display;
use std::result::Result as StdResult;

/// A specialized `Result` type for cqlx.
pub type Result<T, E = Error> = StdResult<T, E>;

// Convenience type alias for usage within cqlx.
pub type BoxDynError = Box<dyn StdError + 'static + Send + Sync>;

/// Represents all the ways a method can fail within cqlx.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The driver runtime refused to create a native handle.
    ///
    /// Typical causes are malformed query text, resource exhaustion or a template that no
    /// longer matches the cluster schema. Never retried by this crate.
    #[error("failed to allocate native handle: {0}")]
    Allocation(Box<dyn DriverError>),

    /// The driver runtime rejected an operation on a handle that already existed
    /// (resizing parameter slots, changing consistency, binding a value).
    #[error("native handle operation rejected by driver: {0}")]
    Protocol(Box<dyn DriverError>),

    /// A value was bound past the last parameter slot of a statement.
    #[error("bind index out of bounds: the arity is {arity}, but the index is {index}")]
    BindIndexOutOfBounds { index: usize, arity: usize },

    /// Error occurred while encoding a value for binding.
    #[error("error occurred while encoding a value: {0}")]
    Encode(#[source] BoxDynError),

    /// Invalid option text, e.g. an unknown consistency level.
    #[error("error occurred while parsing configuration: {0}")]
    Configuration(#[source] BoxDynError),
}

impl Error {
    #[inline]
    pub fn allocation(err: impl DriverError) -> Self {
        Error::Allocation(Box::new(err))
    }

    #[inline]
    pub fn protocol(err: impl DriverError) -> Self {
        Error::Protocol(Box::new(err))
    }

    #[inline]
    pub(crate) fn config(err: impl Into<BoxDynError>) -> Self {
        Error::Configuration(err.into())
    }

    /// Returns the error reported by the driver runtime, if this error came from it.
    pub fn as_driver_error(&self) -> Option<&(dyn DriverError + 'static)> {
        match self {
            Error::Allocation(e) | Error::Protocol(e) => Some(&**e),
            _ => None,
        }
    }

    pub fn into_driver_error(self) -> Option<Box<dyn DriverError + 'static>> {
        match self {
            Error::Allocation(e) | Error::Protocol(e) => Some(e),
            _ => None,
        }
    }

    pub fn is_allocation(&self) -> bool {
        matches!(self, Error::Allocation(_))
    }

    pub fn is_protocol(&self) -> bool {
        matches!(self, Error::Protocol(_))
    }
}

pub(crate) fn unrepresentable<T>(value: impl Display, target: &str) -> BoxDynError {
    format!(
        "Rust value `{}` of type `{}` cannot be represented as CQL type `{}`",
        value,
        type_name::<T>(),
        target
    )
    .into()
}

/// The general categories of failure a driver runtime can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// The query text could not be parsed.
    InvalidQuery,
    /// The runtime ran out of handles, memory or another finite resource.
    ResourceExhausted,
    /// A template no longer matches the statement being derived or bound.
    TemplateMismatch,
    /// The handle was in a state that does not permit the operation,
    /// e.g. binding an index the runtime did not allocate.
    InvalidState,
    /// Unknown or other failure.
    Other,
}

/// An error that was reported by the native driver runtime.
pub trait DriverError: 'static + Send + Sync + StdError {
    /// The primary, human-readable error message.
    fn message(&self) -> &str;

    /// The runtime's own status code for the error, if any.
    fn code(&self) -> Option<Cow<'_, str>> {
        None
    }

    #[doc(hidden)]
    fn as_error(&self) -> &(dyn StdError + Send + Sync + 'static);

    #[doc(hidden)]
    fn as_error_mut(&mut self) -> &mut (dyn StdError + Send + Sync + 'static);

    #[doc(hidden)]
    fn into_error(self: Box<Self>) -> Box<dyn StdError + Send + Sync + 'static>;

    /// Returns the kind of the error, if supported.
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }

    fn is_resource_exhausted(&self) -> bool {
        matches!(self.kind(), ErrorKind::ResourceExhausted)
    }

    fn is_invalid_query(&self) -> bool {
        matches!(self.kind(), ErrorKind::InvalidQuery)
    }
}

impl dyn DriverError {
    /// Borrows the concrete error type of the driver that reported this error.
    ///
    /// # Panics
    ///
    /// Panics if the error did not come from a driver whose error type is `E`. Code that is
    /// generic over the driver should use [`try_downcast_ref`](Self::try_downcast_ref).
    pub fn downcast_ref<E: DriverError>(&self) -> &E {
        self.try_downcast_ref().unwrap_or_else(|| {
            panic!("driver error is not a {}: {self}", type_name::<E>())
        })
    }

    /// Recovers the concrete error type of the driver that reported this error.
    ///
    /// # Panics
    ///
    /// Panics if the error did not come from a driver whose error type is `E`.
    pub fn downcast<E: DriverError>(self: Box<Self>) -> Box<E> {
        self.try_downcast()
            .unwrap_or_else(|e| panic!("driver error is not a {}: {e}", type_name::<E>()))
    }

    #[inline]
    pub fn try_downcast_ref<E: DriverError>(&self) -> Option<&E> {
        self.as_error().downcast_ref()
    }

    /// Returns the error unchanged if it is not an `E`.
    #[inline]
    pub fn try_downcast<E: DriverError>(self: Box<Self>) -> StdResult<Box<E>, Box<Self>> {
        if !self.as_error().is::<E>() {
            return Err(self);
        }

        match self.into_error().downcast() {
            Ok(e) => Ok(e),
            Err(_) => unreachable!("type checked by `is` above"),
        }
    }
}
