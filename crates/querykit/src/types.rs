//! Column type conversion contracts.
//!
//! A [`ColumnType<T>`] converts between a host value `T` and its store
//! [`Value`]. Every typed expression carries one, so literals compared against
//! a column are serialized the way that column stores them.
//!
//! # Example
//! ```ignore
//! use querykit::types::{self, ColumnType};
//!
//! let age = users.column("age", types::Int);
//! let nickname = users.column("nickname", types::Text.nullable());
//! ```

use crate::ddl::SqlType;
use crate::error::{QueryError, QueryResult};
use crate::value::Value;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Bidirectional conversion between a host value and its store representation.
pub trait ColumnType<T>: Send + Sync + fmt::Debug {
    /// Canonical SQL type, used for DDL.
    fn sql_type(&self) -> SqlType;

    /// Convert a host value into the value bound to a placeholder.
    fn to_store(&self, value: &T) -> Value;

    /// Convert a fetched store value back into the host type.
    fn from_store(&self, value: Value) -> QueryResult<T>;

    /// Wrap this type so `None` maps to SQL NULL.
    fn nullable(self) -> Nullable<Self>
    where
        Self: Sized,
    {
        Nullable(self)
    }
}

impl<T, C: ColumnType<T> + ?Sized> ColumnType<T> for Arc<C> {
    fn sql_type(&self) -> SqlType {
        (**self).sql_type()
    }

    fn to_store(&self, value: &T) -> Value {
        (**self).to_store(value)
    }

    fn from_store(&self, value: Value) -> QueryResult<T> {
        (**self).from_store(value)
    }
}

fn mismatch<T>(expected: SqlType, value: &Value) -> QueryResult<T> {
    Err(QueryError::decode(
        format!("{expected:?}"),
        format!("unexpected {} value {value}", value.type_name()),
    ))
}

macro_rules! scalar_type {
    ($(#[$doc:meta])* $name:ident, $host:ty, $sql:expr, $variant:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
        pub struct $name;

        impl ColumnType<$host> for $name {
            fn sql_type(&self) -> SqlType {
                $sql
            }

            fn to_store(&self, value: &$host) -> Value {
                Value::$variant(value.clone())
            }

            fn from_store(&self, value: Value) -> QueryResult<$host> {
                match value {
                    Value::$variant(v) => Ok(v),
                    other => mismatch(self.sql_type(), &other),
                }
            }
        }
    };
}

scalar_type!(
    /// `BOOLEAN` ↔ `bool`
    Bool, bool, SqlType::Boolean, Bool
);
scalar_type!(
    /// `SMALLINT` ↔ `i16`
    SmallInt, i16, SqlType::SmallInt, SmallInt
);
scalar_type!(
    /// `REAL` ↔ `f32`
    Real, f32, SqlType::Real, Real
);
scalar_type!(
    /// `TEXT` ↔ `String`
    Text, String, SqlType::Text, Text
);
scalar_type!(
    /// Binary ↔ `Vec<u8>`
    Bytes, Vec<u8>, SqlType::Bytes, Bytes
);
scalar_type!(
    /// `DATE` ↔ `NaiveDate`
    Date, NaiveDate, SqlType::Date, Date
);
scalar_type!(
    /// `TIMESTAMP` ↔ `NaiveDateTime`
    Timestamp, NaiveDateTime, SqlType::Timestamp, Timestamp
);
scalar_type!(
    /// `TIMESTAMP WITH TIME ZONE` ↔ `DateTime<Utc>`
    TimestampTz, DateTime<Utc>, SqlType::TimestampTz, TimestampTz
);
scalar_type!(
    /// `UUID` ↔ `Uuid`
    UuidType, Uuid, SqlType::Uuid, Uuid
);
scalar_type!(
    /// `JSON` ↔ `serde_json::Value`
    Json, serde_json::Value, SqlType::Json, Json
);

/// `INTEGER` ↔ `i32`. Accepts narrower integers on read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Int;

impl ColumnType<i32> for Int {
    fn sql_type(&self) -> SqlType {
        SqlType::Integer
    }

    fn to_store(&self, value: &i32) -> Value {
        Value::Int(*value)
    }

    fn from_store(&self, value: Value) -> QueryResult<i32> {
        match value {
            Value::Int(v) => Ok(v),
            Value::SmallInt(v) => Ok(i32::from(v)),
            other => mismatch(self.sql_type(), &other),
        }
    }
}

/// `BIGINT` ↔ `i64`. Accepts narrower integers on read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BigInt;

impl ColumnType<i64> for BigInt {
    fn sql_type(&self) -> SqlType {
        SqlType::BigInt
    }

    fn to_store(&self, value: &i64) -> Value {
        Value::BigInt(*value)
    }

    fn from_store(&self, value: Value) -> QueryResult<i64> {
        match value {
            Value::BigInt(v) => Ok(v),
            Value::Int(v) => Ok(i64::from(v)),
            Value::SmallInt(v) => Ok(i64::from(v)),
            other => mismatch(self.sql_type(), &other),
        }
    }
}

/// `DOUBLE PRECISION` ↔ `f64`. Accepts `REAL` on read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Double;

impl ColumnType<f64> for Double {
    fn sql_type(&self) -> SqlType {
        SqlType::Double
    }

    fn to_store(&self, value: &f64) -> Value {
        Value::Double(*value)
    }

    fn from_store(&self, value: Value) -> QueryResult<f64> {
        match value {
            Value::Double(v) => Ok(v),
            Value::Real(v) => Ok(f64::from(v)),
            other => mismatch(self.sql_type(), &other),
        }
    }
}

/// `VARCHAR(n)` ↔ `String`. Length is a DDL concern only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Varchar(pub u32);

impl ColumnType<String> for Varchar {
    fn sql_type(&self) -> SqlType {
        SqlType::Varchar(self.0)
    }

    fn to_store(&self, value: &String) -> Value {
        Value::Text(value.clone())
    }

    fn from_store(&self, value: Value) -> QueryResult<String> {
        match value {
            Value::Text(v) => Ok(v),
            other => mismatch(self.sql_type(), &other),
        }
    }
}

/// Nullable wrapper: forwards to the inner type and maps `None` ↔ NULL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Nullable<C>(pub C);

impl<T, C: ColumnType<T>> ColumnType<Option<T>> for Nullable<C> {
    fn sql_type(&self) -> SqlType {
        self.0.sql_type()
    }

    fn to_store(&self, value: &Option<T>) -> Value {
        match value {
            Some(v) => self.0.to_store(v),
            None => Value::Null,
        }
    }

    fn from_store(&self, value: Value) -> QueryResult<Option<T>> {
        match value {
            Value::Null => Ok(None),
            other => self.0.from_store(other).map(Some),
        }
    }
}

type ToStoreFn<T> = Arc<dyn Fn(&T) -> Value + Send + Sync>;
type FromStoreFn<T> = Arc<dyn Fn(Value) -> QueryResult<T> + Send + Sync>;

/// A column type built from a pair of conversion functions.
///
/// # Example
/// ```ignore
/// #[derive(Clone, Copy, PartialEq)]
/// enum Status { Active, Banned }
///
/// let status = CustomType::new(
///     SqlType::Varchar(16),
///     |s: &Status| Value::from(match s { Status::Active => "active", Status::Banned => "banned" }),
///     |v| match v {
///         Value::Text(s) if s == "active" => Ok(Status::Active),
///         Value::Text(s) if s == "banned" => Ok(Status::Banned),
///         other => Err(QueryError::decode("status", other.to_string())),
///     },
/// );
/// ```
pub struct CustomType<T> {
    sql_type: SqlType,
    to: ToStoreFn<T>,
    from: FromStoreFn<T>,
}

impl<T> CustomType<T> {
    pub fn new<F, G>(sql_type: SqlType, to: F, from: G) -> Self
    where
        F: Fn(&T) -> Value + Send + Sync + 'static,
        G: Fn(Value) -> QueryResult<T> + Send + Sync + 'static,
    {
        Self {
            sql_type,
            to: Arc::new(to),
            from: Arc::new(from),
        }
    }
}

impl<T> Clone for CustomType<T> {
    fn clone(&self) -> Self {
        Self {
            sql_type: self.sql_type,
            to: Arc::clone(&self.to),
            from: Arc::clone(&self.from),
        }
    }
}

impl<T> fmt::Debug for CustomType<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomType")
            .field("sql_type", &self.sql_type)
            .finish_non_exhaustive()
    }
}

impl<T> ColumnType<T> for CustomType<T> {
    fn sql_type(&self) -> SqlType {
        self.sql_type
    }

    fn to_store(&self, value: &T) -> Value {
        (self.to)(value)
    }

    fn from_store(&self, value: Value) -> QueryResult<T> {
        (self.from)(value)
    }
}

/// Host types with a default column type, used for free-standing literals
/// and function results.
pub trait SqlValue: Sized + Send + Sync + 'static {
    fn column_type() -> Arc<dyn ColumnType<Self>>;
}

macro_rules! default_type {
    ($($host:ty => $ty:expr),* $(,)?) => {
        $(
            impl SqlValue for $host {
                fn column_type() -> Arc<dyn ColumnType<Self>> {
                    Arc::new($ty)
                }
            }
        )*
    };
}

default_type! {
    bool => Bool,
    i16 => SmallInt,
    i32 => Int,
    i64 => BigInt,
    f32 => Real,
    f64 => Double,
    String => Text,
    Vec<u8> => Bytes,
    NaiveDate => Date,
    NaiveDateTime => Timestamp,
    DateTime<Utc> => TimestampTz,
    Uuid => UuidType,
    serde_json::Value => Json,
}

impl<T: SqlValue> SqlValue for Option<T> {
    fn column_type() -> Arc<dyn ColumnType<Self>> {
        Arc::new(Nullable(T::column_type()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nullable_forwards_and_maps_null() {
        let ty = Int.nullable();
        assert_eq!(ty.to_store(&Some(3)), Value::Int(3));
        assert_eq!(ty.to_store(&None), Value::Null);
        assert_eq!(ty.from_store(Value::Null).unwrap(), None);
        assert_eq!(ty.from_store(Value::Int(4)).unwrap(), Some(4));
        assert_eq!(ty.sql_type(), SqlType::Integer);
    }

    #[test]
    fn test_widening_reads() {
        assert_eq!(BigInt.from_store(Value::Int(7)).unwrap(), 7i64);
        assert_eq!(Int.from_store(Value::SmallInt(2)).unwrap(), 2i32);
        assert_eq!(Double.from_store(Value::Real(0.5)).unwrap(), 0.5f64);
    }

    #[test]
    fn test_mismatch_is_decode_error() {
        let err = Bool.from_store(Value::Text("yes".into())).unwrap_err();
        assert!(matches!(err, QueryError::Decode { .. }));
    }

    #[test]
    fn test_custom_type() {
        let upper = CustomType::new(
            SqlType::Text,
            |s: &String| Value::Text(s.to_uppercase()),
            |v| match v {
                Value::Text(s) => Ok(s.to_lowercase()),
                other => Err(QueryError::decode("text", other.to_string())),
            },
        );
        assert_eq!(upper.to_store(&"abc".to_string()), Value::Text("ABC".into()));
        assert_eq!(upper.from_store(Value::Text("ABC".into())).unwrap(), "abc");
    }

    #[test]
    fn test_default_types() {
        assert_eq!(i64::column_type().to_store(&9), Value::BigInt(9));
        assert_eq!(Option::<String>::column_type().to_store(&None), Value::Null);
    }
}
