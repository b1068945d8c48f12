use std::collections::HashMap;
use std::sync::Arc;

use crate::types::SqlValue;

/// A single row from a query result.
///
/// Column names are shared across all rows of a result set; lookups are
/// case-insensitive. A NULL column is stored as `SqlValue::Null`, never a
/// stand-in default, so downstream coercion can tell the two apart.
#[derive(Debug, Clone)]
pub struct DynamicRow {
    /// The column names for this row (shared across all rows in a result set)
    column_names: Arc<Vec<String>>,
    values: Vec<SqlValue>,
    // Lowercased name -> index cache, shared with the owning result set
    index_cache: Arc<HashMap<String, usize>>,
}

impl DynamicRow {
    /// Create a row with its own lookup cache.
    #[must_use]
    pub fn new(column_names: Arc<Vec<String>>, values: Vec<SqlValue>) -> Self {
        let cache = Arc::new(build_index_cache(&column_names));
        Self {
            column_names,
            values,
            index_cache: cache,
        }
    }

    pub(crate) fn with_cache(
        column_names: Arc<Vec<String>>,
        values: Vec<SqlValue>,
        index_cache: Arc<HashMap<String, usize>>,
    ) -> Self {
        Self {
            column_names,
            values,
            index_cache,
        }
    }

    #[must_use]
    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    #[must_use]
    pub fn values(&self) -> &[SqlValue] {
        &self.values
    }

    /// Index of a column by name, ignoring case.
    #[must_use]
    pub fn column_index(&self, column_name: &str) -> Option<usize> {
        let key = column_name.to_lowercase();
        if let Some(&idx) = self.index_cache.get(&key) {
            return Some(idx);
        }
        // Fall back to a linear scan for names the cache missed
        self.column_names
            .iter()
            .position(|col| col.eq_ignore_ascii_case(column_name))
    }

    /// Value of a column by name, or `None` when the column is absent.
    #[must_use]
    pub fn get(&self, column_name: &str) -> Option<&SqlValue> {
        self.column_index(column_name)
            .and_then(|idx| self.values.get(idx))
    }

    /// Value of a column by position.
    #[must_use]
    pub fn get_by_index(&self, index: usize) -> Option<&SqlValue> {
        self.values.get(index)
    }
}

pub(crate) fn build_index_cache(column_names: &[String]) -> HashMap<String, usize> {
    column_names
        .iter()
        .enumerate()
        .map(|(i, name)| (name.to_lowercase(), i))
        .collect()
}
