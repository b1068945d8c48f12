use crate::error::SqlConduitError;
use crate::results::{DynamicRow, ResultSet};

use super::mapping::{FromRow, RowMapping};

/// Project one row onto `T` using its registered mapping.
///
/// Rebuilds the mapping per call; prefer [`project_with`] in loops.
///
/// # Errors
/// `TypeConversion` when a present, non-NULL value cannot coerce into the
/// bound field.
pub fn project<T: FromRow>(row: &DynamicRow) -> Result<T, SqlConduitError> {
    project_with(row, &T::row_mapping())
}

/// Project one row onto `T` with a prebuilt mapping.
///
/// Walks bindings in registration order: ignored bindings never assign,
/// absent columns leave the zero-value, NULL with a configured default
/// substitutes the default before coercion.
///
/// # Errors
/// `TypeConversion` naming the offending column.
pub fn project_with<T: Default + 'static>(
    row: &DynamicRow,
    mapping: &RowMapping<T>,
) -> Result<T, SqlConduitError> {
    let mut target = T::default();
    for binding in &mapping.bindings {
        if binding.ignored {
            continue;
        }
        let Some(value) = row.get(&binding.column) else {
            continue;
        };
        let effective = if value.is_null() {
            match &binding.default_if_null {
                Some(default) => default,
                None => value,
            }
        } else {
            value
        };
        (binding.assign)(&mut target, effective).map_err(|e| match e {
            SqlConduitError::TypeConversion(msg) => {
                SqlConduitError::TypeConversion(format!("column {}: {msg}", binding.column))
            }
            other => other,
        })?;
    }
    Ok(target)
}

/// Project every row in encounter order. Zero rows yield an empty vec.
///
/// # Errors
/// Propagates the first coercion failure.
pub fn project_list<T: FromRow>(rows: &ResultSet) -> Result<Vec<T>, SqlConduitError> {
    let mapping = T::row_mapping();
    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        out.push(project_with(row, &mapping)?);
    }
    Ok(out)
}

/// Project the first row only; zero rows yield `T::default()`.
///
/// No record found is not an error.
///
/// # Errors
/// Propagates a coercion failure from the first row.
pub fn project_single<T: FromRow>(rows: &ResultSet) -> Result<T, SqlConduitError> {
    match rows.results.first() {
        Some(row) => project_with(row, &T::row_mapping()),
        None => Ok(T::default()),
    }
}
