//! Types for collecting parameter values ahead of binding them.

use smallvec::SmallVec;

use crate::encode::Encode;
use crate::error::{Error, Result};
use crate::value::Value;

/// An ordered list of values to be bound into a statement, first slot first.
///
/// Values are encoded as they are added, so an unrepresentable value is reported at
/// [`add`](Arguments::add) rather than halfway through [`Statement::bind_all`].
///
/// [`Statement::bind_all`]: crate::statement::Statement::bind_all
#[derive(Debug, Default, Clone)]
pub struct Arguments {
    values: SmallVec<[Value; 8]>,
}

impl Arguments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserves the capacity for at least `additional` more values.
    pub fn reserve(&mut self, additional: usize) {
        self.values.reserve(additional);
    }

    /// Add the value to the end of the arguments.
    pub fn add<T>(&mut self, value: T) -> Result<()>
    where
        T: Encode,
    {
        let value = value.encode().map_err(Error::Encode)?;
        self.values.push(value);

        Ok(())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }
}

impl IntoIterator for Arguments {
    type Item = Value;
    type IntoIter = smallvec::IntoIter<[Value; 8]>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.into_iter()
    }
}

impl FromIterator<Value> for Arguments {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}
