//! Core of cqlx, the statement ownership and binding layer for CQL drivers.
//!
//! Not intended to be used directly; see the `cqlx` crate.
//!
//! The crate wraps the opaque handles of a native driver runtime ([`Driver`]) in move-only
//! owners that release them exactly once:
//!
//! * [`Statement`] owns one statement handle and tracks the bind cursor used to attach
//!   parameters in order.
//! * [`PreparedQuery`] owns one precompiled template and derives independent statements from
//!   it.
//!
//! Connecting, executing and decoding results belong to the layers built on top.
#![deny(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod arguments;
pub mod consistency;
pub mod driver;
pub mod encode;
pub mod error;
pub mod handle;
pub mod logger;
pub mod options;
pub mod prepared;
pub mod statement;
pub mod value;

#[cfg(any(test, feature = "mock"))]
#[cfg_attr(docsrs, doc(cfg(feature = "mock")))]
pub mod mock;

pub use arguments::Arguments;
pub use consistency::Consistency;
pub use driver::Driver;
pub use encode::Encode;
pub use error::{BoxDynError, DriverError, Error, ErrorKind, Result};
pub use handle::{PreparedHandle, StatementHandle};
pub use options::{LogSettings, StatementOptions};
pub use prepared::PreparedQuery;
pub use statement::Statement;
pub use value::Value;
