//! Provides [`Encode`] for converting Rust values into bindable [`Value`]s.

use crate::error::{unrepresentable, BoxDynError};
use crate::value::Value;

/// Encode a single value to be bound into a statement's next parameter slot.
pub trait Encode {
    fn encode(self) -> Result<Value, BoxDynError>;
}

impl Encode for Value {
    #[inline]
    fn encode(self) -> Result<Value, BoxDynError> {
        Ok(self)
    }
}

impl<T> Encode for Option<T>
where
    T: Encode,
{
    #[inline]
    fn encode(self) -> Result<Value, BoxDynError> {
        match self {
            Some(value) => value.encode(),
            None => Ok(Value::Null),
        }
    }
}

macro_rules! impl_encode_as {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl Encode for $ty {
                #[inline]
                fn encode(self) -> Result<Value, BoxDynError> {
                    Ok(Value::$variant(self.into()))
                }
            }
        )*
    };
}

impl_encode_as!(
    bool => Boolean,
    i8 => TinyInt,
    i16 => SmallInt,
    i32 => Int,
    i64 => BigInt,
    u8 => SmallInt,
    u16 => Int,
    u32 => BigInt,
    f32 => Float,
    f64 => Double,
    String => Text,
    Vec<u8> => Blob,
);

// CQL has no unsigned 64-bit type
impl Encode for u64 {
    fn encode(self) -> Result<Value, BoxDynError> {
        i64::try_from(self)
            .map(Value::BigInt)
            .map_err(|_| unrepresentable::<u64>(self, "bigint"))
    }
}

impl Encode for &'_ str {
    #[inline]
    fn encode(self) -> Result<Value, BoxDynError> {
        Ok(Value::Text(self.to_owned()))
    }
}

impl Encode for &'_ String {
    #[inline]
    fn encode(self) -> Result<Value, BoxDynError> {
        Ok(Value::Text(self.clone()))
    }
}

impl Encode for &'_ [u8] {
    #[inline]
    fn encode(self) -> Result<Value, BoxDynError> {
        Ok(Value::Blob(self.to_owned()))
    }
}

impl<const N: usize> Encode for [u8; N] {
    #[inline]
    fn encode(self) -> Result<Value, BoxDynError> {
        Ok(Value::Blob(self.to_vec()))
    }
}

#[cfg(feature = "uuid")]
impl Encode for uuid::Uuid {
    #[inline]
    fn encode(self) -> Result<Value, BoxDynError> {
        Ok(Value::Uuid(self))
    }
}
