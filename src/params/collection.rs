use lazy_static::lazy_static;
use regex::Regex;

use crate::error::SqlConduitError;
use crate::types::SqlValue;

use super::parameter::SqlParameter;

lazy_static! {
    static ref BASE_NAME_RE: Regex = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap();
}

/// Ordered collection of named parameters.
///
/// Insertion order is preserved for positional backends. Names are unique
/// per collection, compared case-insensitively after binder qualification:
/// ```rust
/// use sql_conduit::prelude::*;
///
/// let mut params = ParamCollection::new("@");
/// params.add("id", 5)?;
/// assert_eq!(params.get("id")?.unwrap().name(), "@id");
/// # Ok::<(), SqlConduitError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct ParamCollection {
    binder: String,
    entries: Vec<SqlParameter>,
}

impl ParamCollection {
    /// Create an empty collection with the given binder prefix (`@`, `:`, `?`).
    pub fn new(binder: impl Into<String>) -> Self {
        Self {
            binder: binder.into(),
            entries: Vec::new(),
        }
    }

    /// The binder prefix applied to parameter names.
    #[must_use]
    pub fn binder(&self) -> &str {
        &self.binder
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SqlParameter> {
        self.entries.iter()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[SqlParameter] {
        &self.entries
    }

    /// Qualify a name with the binder prefix unless it already carries one.
    ///
    /// # Errors
    /// Returns `SqlConduitError::InvalidArgument` for an empty or malformed
    /// base name.
    pub fn qualify(&self, name: &str) -> Result<String, SqlConduitError> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(SqlConduitError::InvalidArgument(
                "parameter name must not be empty".into(),
            ));
        }
        let base = trimmed.strip_prefix(self.binder.as_str()).unwrap_or(trimmed);
        if !BASE_NAME_RE.is_match(base) {
            return Err(SqlConduitError::InvalidArgument(format!(
                "malformed parameter name: {trimmed}"
            )));
        }
        Ok(format!("{}{}", self.binder, base))
    }

    fn position_of(&self, qualified: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|p| p.name().eq_ignore_ascii_case(qualified))
    }

    /// Add a parameter from a name/value pair.
    ///
    /// `None` values arrive as `SqlValue::Null` through the `Option` `From`
    /// impl. The name is binder-qualified if the prefix is missing.
    ///
    /// # Errors
    /// `DuplicateParameter` if the normalized name already exists;
    /// `InvalidArgument` for an empty or malformed name.
    pub fn add(
        &mut self,
        name: &str,
        value: impl Into<SqlValue>,
    ) -> Result<&SqlParameter, SqlConduitError> {
        let param = SqlParameter::new(name, value);
        self.add_parameter(param)
    }

    /// Add a fully-built parameter, qualifying its name first.
    ///
    /// # Errors
    /// `DuplicateParameter` if the normalized name already exists;
    /// `InvalidArgument` for an empty or malformed name.
    pub fn add_parameter(
        &mut self,
        mut param: SqlParameter,
    ) -> Result<&SqlParameter, SqlConduitError> {
        let qualified = self.qualify(param.name())?;
        if self.position_of(&qualified).is_some() {
            return Err(SqlConduitError::DuplicateParameter(qualified));
        }
        param.rename(qualified);
        let index = self.entries.len();
        self.entries.push(param);
        Ok(&self.entries[index])
    }

    /// Add a batch of parameters, all-or-nothing.
    ///
    /// The whole incoming batch is validated against the existing entries
    /// and against its own siblings before anything is inserted.
    ///
    /// # Errors
    /// `DuplicateParameter` naming the offending parameter; the collection
    /// is left unchanged on failure.
    pub fn add_range(
        &mut self,
        params: impl IntoIterator<Item = SqlParameter>,
    ) -> Result<(), SqlConduitError> {
        let mut incoming: Vec<SqlParameter> = Vec::new();
        for mut param in params {
            let qualified = self.qualify(param.name())?;
            if self.position_of(&qualified).is_some()
                || incoming
                    .iter()
                    .any(|p: &SqlParameter| p.name().eq_ignore_ascii_case(&qualified))
            {
                return Err(SqlConduitError::DuplicateParameter(qualified));
            }
            param.rename(qualified);
            incoming.push(param);
        }
        self.entries.append(&mut incoming);
        Ok(())
    }

    /// Add a batch of name/value pairs, all-or-nothing.
    ///
    /// # Errors
    /// Same contract as [`ParamCollection::add_range`].
    pub fn add_values<V: Into<SqlValue>>(
        &mut self,
        pairs: impl IntoIterator<Item = (String, V)>,
    ) -> Result<(), SqlConduitError> {
        self.add_range(
            pairs
                .into_iter()
                .map(|(name, value)| SqlParameter::new(name, value)),
        )
    }

    /// Look up a parameter by name (case-insensitive, binder-qualified).
    ///
    /// # Errors
    /// `InvalidArgument` if the name is empty or whitespace.
    pub fn get(&self, name: &str) -> Result<Option<&SqlParameter>, SqlConduitError> {
        let qualified = self.qualify(name)?;
        Ok(self.position_of(&qualified).map(|i| &self.entries[i]))
    }

    /// Look up a parameter by position.
    ///
    /// # Errors
    /// `IndexOutOfRange` for an invalid index.
    pub fn get_at(&self, index: usize) -> Result<&SqlParameter, SqlConduitError> {
        self.entries.get(index).ok_or_else(|| {
            SqlConduitError::IndexOutOfRange(format!(
                "parameter index {index} out of range (len {})",
                self.entries.len()
            ))
        })
    }

    /// Whether a parameter with this name exists.
    ///
    /// # Errors
    /// `InvalidArgument` if the name is empty.
    pub fn contains(&self, name: &str) -> Result<bool, SqlConduitError> {
        let qualified = self.qualify(name)?;
        Ok(self.position_of(&qualified).is_some())
    }

    /// Remove by name. Absent names are a no-op returning `false`.
    ///
    /// # Errors
    /// `InvalidArgument` if the name is empty.
    pub fn remove(&mut self, name: &str) -> Result<bool, SqlConduitError> {
        let qualified = self.qualify(name)?;
        match self.position_of(&qualified) {
            Some(i) => {
                self.entries.remove(i);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Remove by position.
    ///
    /// # Errors
    /// `IndexOutOfRange` for an invalid index.
    pub fn remove_at(&mut self, index: usize) -> Result<(), SqlConduitError> {
        if index >= self.entries.len() {
            return Err(SqlConduitError::IndexOutOfRange(format!(
                "parameter index {index} out of range (len {})",
                self.entries.len()
            )));
        }
        self.entries.remove(index);
        Ok(())
    }

    /// Replace the parameter with this name. A missing name is a fail-fast
    /// `IndexOutOfRange` rather than a write to an arbitrary position.
    ///
    /// # Errors
    /// `IndexOutOfRange` if the name is absent; `InvalidArgument` for an
    /// empty name.
    pub fn replace(
        &mut self,
        name: &str,
        mut param: SqlParameter,
    ) -> Result<(), SqlConduitError> {
        let qualified = self.qualify(name)?;
        let index = self.position_of(&qualified).ok_or_else(|| {
            SqlConduitError::IndexOutOfRange(format!("no parameter named {qualified}"))
        })?;
        let replacement_name = self.qualify(param.name())?;
        if let Some(existing) = self.position_of(&replacement_name)
            && existing != index
        {
            return Err(SqlConduitError::DuplicateParameter(replacement_name));
        }
        param.rename(replacement_name);
        self.entries[index] = param;
        Ok(())
    }

    /// Replace the parameter at this position.
    ///
    /// # Errors
    /// `IndexOutOfRange` for an invalid index.
    pub fn replace_at(
        &mut self,
        index: usize,
        mut param: SqlParameter,
    ) -> Result<(), SqlConduitError> {
        if index >= self.entries.len() {
            return Err(SqlConduitError::IndexOutOfRange(format!(
                "parameter index {index} out of range (len {})",
                self.entries.len()
            )));
        }
        let replacement_name = self.qualify(param.name())?;
        if let Some(existing) = self.position_of(&replacement_name)
            && existing != index
        {
            return Err(SqlConduitError::DuplicateParameter(replacement_name));
        }
        param.rename(replacement_name);
        self.entries[index] = param;
        Ok(())
    }

    /// Set the value of the named parameter in place.
    ///
    /// # Errors
    /// `IndexOutOfRange` if the name is absent; `InvalidArgument` for an
    /// empty name.
    pub fn set_value(
        &mut self,
        name: &str,
        value: impl Into<SqlValue>,
    ) -> Result<(), SqlConduitError> {
        let qualified = self.qualify(name)?;
        let index = self.position_of(&qualified).ok_or_else(|| {
            SqlConduitError::IndexOutOfRange(format!("no parameter named {qualified}"))
        })?;
        self.entries[index].set_value(value);
        Ok(())
    }

    /// Set the value of the parameter at this position.
    ///
    /// # Errors
    /// `IndexOutOfRange` for an invalid index.
    pub fn set_value_at(
        &mut self,
        index: usize,
        value: impl Into<SqlValue>,
    ) -> Result<(), SqlConduitError> {
        if index >= self.entries.len() {
            return Err(SqlConduitError::IndexOutOfRange(format!(
                "parameter index {index} out of range (len {})",
                self.entries.len()
            )));
        }
        self.entries[index].set_value(value);
        Ok(())
    }

    /// Remove all parameters. Idempotent.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Replace the collection's contents with the post-execution state of a
    /// command's parameter list, capturing output and return values the
    /// backend assigned.
    pub fn sync_from(&mut self, executed: &[SqlParameter]) {
        self.entries = executed.to_vec();
    }
}

impl<'a> IntoIterator for &'a ParamCollection {
    type Item = &'a SqlParameter;
    type IntoIter = std::slice::Iter<'a, SqlParameter>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
