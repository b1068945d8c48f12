use chrono::NaiveDateTime;
use serde_json::Value as JsonValue;

use crate::error::SqlConduitError;
use crate::types::SqlValue;

/// Best-effort coercion from a dynamic value into a concrete field type.
///
/// Implementations follow the accessor conventions on [`SqlValue`]: numeric
/// widening, text parsing, and bool-from-int are accepted; anything else is
/// a `TypeConversion` error.
pub trait FromSqlValue: Sized {
    /// # Errors
    /// Returns `SqlConduitError::TypeConversion` when the value cannot
    /// represent `Self`.
    fn from_sql_value(value: &SqlValue) -> Result<Self, SqlConduitError>;

    /// Substitute assigned when the column value is NULL and no explicit
    /// default is configured. `None` means "leave the field untouched"; the
    /// `Option<T>` impl overrides this to assign an explicit `None`.
    fn on_null() -> Option<Self> {
        None
    }
}

fn mismatch(expected: &str, value: &SqlValue) -> SqlConduitError {
    SqlConduitError::TypeConversion(format!("cannot convert {value:?} into {expected}"))
}

impl FromSqlValue for i64 {
    fn from_sql_value(value: &SqlValue) -> Result<Self, SqlConduitError> {
        match value {
            SqlValue::Int(i) => Ok(*i),
            SqlValue::Float(f) if f.fract() == 0.0 => Ok(*f as i64),
            SqlValue::Bool(b) => Ok(i64::from(*b)),
            SqlValue::Text(s) => s.trim().parse().map_err(|_| mismatch("i64", value)),
            _ => Err(mismatch("i64", value)),
        }
    }
}

impl FromSqlValue for i32 {
    fn from_sql_value(value: &SqlValue) -> Result<Self, SqlConduitError> {
        let wide = i64::from_sql_value(value)?;
        i32::try_from(wide).map_err(|_| mismatch("i32", value))
    }
}

impl FromSqlValue for i16 {
    fn from_sql_value(value: &SqlValue) -> Result<Self, SqlConduitError> {
        let wide = i64::from_sql_value(value)?;
        i16::try_from(wide).map_err(|_| mismatch("i16", value))
    }
}

impl FromSqlValue for u32 {
    fn from_sql_value(value: &SqlValue) -> Result<Self, SqlConduitError> {
        let wide = i64::from_sql_value(value)?;
        u32::try_from(wide).map_err(|_| mismatch("u32", value))
    }
}

impl FromSqlValue for f64 {
    fn from_sql_value(value: &SqlValue) -> Result<Self, SqlConduitError> {
        match value {
            SqlValue::Float(f) => Ok(*f),
            SqlValue::Int(i) => Ok(*i as f64),
            SqlValue::Text(s) => s.trim().parse().map_err(|_| mismatch("f64", value)),
            _ => Err(mismatch("f64", value)),
        }
    }
}

impl FromSqlValue for f32 {
    fn from_sql_value(value: &SqlValue) -> Result<Self, SqlConduitError> {
        f64::from_sql_value(value).map(|f| f as f32)
    }
}

impl FromSqlValue for String {
    fn from_sql_value(value: &SqlValue) -> Result<Self, SqlConduitError> {
        match value {
            SqlValue::Null => Err(mismatch("String", value)),
            SqlValue::Blob(_) => Err(mismatch("String", value)),
            other => Ok(other.to_display_string()),
        }
    }
}

impl FromSqlValue for bool {
    fn from_sql_value(value: &SqlValue) -> Result<Self, SqlConduitError> {
        match value {
            SqlValue::Bool(b) => Ok(*b),
            SqlValue::Int(0) => Ok(false),
            SqlValue::Int(1) => Ok(true),
            SqlValue::Text(s) => match s.trim().to_lowercase().as_str() {
                "true" | "1" => Ok(true),
                "false" | "0" => Ok(false),
                _ => Err(mismatch("bool", value)),
            },
            _ => Err(mismatch("bool", value)),
        }
    }
}

impl FromSqlValue for NaiveDateTime {
    fn from_sql_value(value: &SqlValue) -> Result<Self, SqlConduitError> {
        value
            .as_timestamp()
            .ok_or_else(|| mismatch("NaiveDateTime", value))
    }
}

impl FromSqlValue for Vec<u8> {
    fn from_sql_value(value: &SqlValue) -> Result<Self, SqlConduitError> {
        match value {
            SqlValue::Blob(bytes) => Ok(bytes.clone()),
            SqlValue::Text(s) => Ok(s.clone().into_bytes()),
            _ => Err(mismatch("Vec<u8>", value)),
        }
    }
}

impl FromSqlValue for JsonValue {
    fn from_sql_value(value: &SqlValue) -> Result<Self, SqlConduitError> {
        match value {
            SqlValue::Json(j) => Ok(j.clone()),
            SqlValue::Text(s) => serde_json::from_str(s).map_err(|_| mismatch("Json", value)),
            _ => Err(mismatch("Json", value)),
        }
    }
}

impl FromSqlValue for SqlValue {
    fn from_sql_value(value: &SqlValue) -> Result<Self, SqlConduitError> {
        Ok(value.clone())
    }
}

/// Nullable targets: NULL becomes an explicit `None`.
impl<V: FromSqlValue> FromSqlValue for Option<V> {
    fn from_sql_value(value: &SqlValue) -> Result<Self, SqlConduitError> {
        if value.is_null() {
            Ok(None)
        } else {
            V::from_sql_value(value).map(Some)
        }
    }

    fn on_null() -> Option<Self> {
        Some(None)
    }
}
