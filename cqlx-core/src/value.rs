/// A single parameter value, ready to be handed to the driver runtime.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum Value {
    Null,

    Boolean(bool),

    TinyInt(i8),

    SmallInt(i16),

    Int(i32),

    BigInt(i64),

    Float(f32),

    Double(f64),

    // TODO: borrow for the lifetime of the bind call once the driver trait takes `Value<'_>`
    Text(String),

    Blob(Vec<u8>),

    #[cfg(feature = "uuid")]
    Uuid(uuid::Uuid),
}

impl Value {
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// The CQL name of the value's type, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "NULL",
            Value::Boolean(_) => "boolean",
            Value::TinyInt(_) => "tinyint",
            Value::SmallInt(_) => "smallint",
            Value::Int(_) => "int",
            Value::BigInt(_) => "bigint",
            Value::Float(_) => "float",
            Value::Double(_) => "double",
            Value::Text(_) => "text",
            Value::Blob(_) => "blob",
            #[cfg(feature = "uuid")]
            Value::Uuid(_) => "uuid",
        }
    }
}
