use std::str::FromStr;

use crate::error::SqlConduitError;
use crate::types::SqlValue;

use super::convert::FromSqlValue;

type Assign<T> = Box<dyn Fn(&mut T, &SqlValue) -> Result<(), SqlConduitError> + Send + Sync>;

pub(crate) struct FieldBinding<T: 'static> {
    pub(crate) column: String,
    pub(crate) ignored: bool,
    pub(crate) default_if_null: Option<SqlValue>,
    pub(crate) assign: Assign<T>,
}

/// Registration-time projection contract for a target type.
///
/// Each binding names the source column, an optional default substituted
/// for NULL, and the assignment into the target:
/// ```rust
/// use sql_conduit::prelude::*;
///
/// #[derive(Default)]
/// struct User {
///     id: i64,
///     name: String,
///     email: Option<String>,
/// }
///
/// impl FromRow for User {
///     fn row_mapping() -> RowMapping<Self> {
///         RowMapping::new()
///             .bind("user_id", |u: &mut User, v: i64| u.id = v)
///             .bind("name", |u: &mut User, v: String| u.name = v)
///             .bind("email", |u: &mut User, v: Option<String>| u.email = v)
///     }
/// }
/// ```
pub struct RowMapping<T: 'static> {
    pub(crate) bindings: Vec<FieldBinding<T>>,
}

impl<T: 'static> Default for RowMapping<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: 'static> RowMapping<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            bindings: Vec::new(),
        }
    }

    fn push<V: FromSqlValue + 'static>(
        mut self,
        column: &str,
        default_if_null: Option<SqlValue>,
        set: impl Fn(&mut T, V) + Send + Sync + 'static,
    ) -> Self {
        let assign: Assign<T> = Box::new(move |target, value| {
            if value.is_null() {
                if let Some(substitute) = V::on_null() {
                    set(target, substitute);
                }
                return Ok(());
            }
            let converted = V::from_sql_value(value)?;
            set(target, converted);
            Ok(())
        });
        self.bindings.push(FieldBinding {
            column: column.to_owned(),
            ignored: false,
            default_if_null,
            assign,
        });
        self
    }

    /// Bind a column to a field setter. The column name is the override
    /// point: projection reads from exactly this name, never a guessed one.
    #[must_use]
    pub fn bind<V: FromSqlValue + 'static>(
        self,
        column: &str,
        set: impl Fn(&mut T, V) + Send + Sync + 'static,
    ) -> Self {
        self.push(column, None, set)
    }

    /// Bind a column with a default substituted when the value is NULL.
    #[must_use]
    pub fn bind_or<V: FromSqlValue + 'static>(
        self,
        column: &str,
        default_if_null: impl Into<SqlValue>,
        set: impl Fn(&mut T, V) + Send + Sync + 'static,
    ) -> Self {
        self.push(column, Some(default_if_null.into()), set)
    }

    /// Bind an enum-like field parsed from the value's textual form.
    #[must_use]
    pub fn bind_enum<V: FromStr + 'static>(
        mut self,
        column: &str,
        set: impl Fn(&mut T, V) + Send + Sync + 'static,
    ) -> Self {
        let column_owned = column.to_owned();
        let assign: Assign<T> = Box::new(move |target, value| {
            if value.is_null() {
                return Ok(());
            }
            let text = value.to_display_string();
            let parsed = V::from_str(&text).map_err(|_| {
                SqlConduitError::TypeConversion(format!(
                    "cannot parse {text:?} from column {column_owned} as enum"
                ))
            })?;
            set(target, parsed);
            Ok(())
        });
        self.bindings.push(FieldBinding {
            column: column.to_owned(),
            ignored: false,
            default_if_null: None,
            assign,
        });
        self
    }

    /// Mark a column as ignored: its binding never assigns, even when the
    /// column is present in the row.
    #[must_use]
    pub fn ignore(mut self, column: &str) -> Self {
        if let Some(binding) = self
            .bindings
            .iter_mut()
            .find(|b| b.column.eq_ignore_ascii_case(column))
        {
            binding.ignored = true;
        } else {
            self.bindings.push(FieldBinding {
                column: column.to_owned(),
                ignored: true,
                default_if_null: None,
                assign: Box::new(|_, _| Ok(())),
            });
        }
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

/// Types that can be materialized from a [`crate::results::DynamicRow`].
///
/// `Default` supplies the zero-value used for unmapped fields and for the
/// "no record found" case in single-row projection.
pub trait FromRow: Default + Sized + 'static {
    fn row_mapping() -> RowMapping<Self>;
}
