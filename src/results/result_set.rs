use std::collections::HashMap;
use std::sync::Arc;

use crate::types::SqlValue;

use super::row::{DynamicRow, build_index_cache};

/// A buffered, ordered result set.
#[derive(Debug, Clone, Default)]
pub struct ResultSet {
    /// The rows returned by the query
    pub results: Vec<DynamicRow>,
    /// The number of rows affected (for DML statements)
    pub rows_affected: u64,
    // Shared by every row so the cache is built once per result set
    column_names: Option<Arc<Vec<String>>>,
    index_cache: Option<Arc<HashMap<String, usize>>>,
}

impl ResultSet {
    /// Create a result set with preallocated row capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> ResultSet {
        ResultSet {
            results: Vec::with_capacity(capacity),
            rows_affected: 0,
            column_names: None,
            index_cache: None,
        }
    }

    /// Set the column names shared by all rows.
    pub fn set_column_names(&mut self, column_names: Arc<Vec<String>>) {
        self.index_cache = Some(Arc::new(build_index_cache(&column_names)));
        self.column_names = Some(column_names);
    }

    #[must_use]
    pub fn column_names(&self) -> Option<&Arc<Vec<String>>> {
        self.column_names.as_ref()
    }

    /// Append a row built from bare values; requires column names to be set.
    pub fn add_row_values(&mut self, values: Vec<SqlValue>) {
        if let (Some(columns), Some(cache)) = (&self.column_names, &self.index_cache) {
            self.results
                .push(DynamicRow::with_cache(columns.clone(), values, cache.clone()));
            self.rows_affected += 1;
        }
    }

    /// Append an already-built row, adopting its column names if none are set.
    pub fn add_row(&mut self, row: DynamicRow) {
        if self.column_names.is_none() {
            let columns: Arc<Vec<String>> = Arc::new(row.column_names().to_vec());
            self.set_column_names(columns);
        }
        self.results.push(row);
        self.rows_affected += 1;
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.results.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DynamicRow> {
        self.results.iter()
    }
}

impl<'a> IntoIterator for &'a ResultSet {
    type Item = &'a DynamicRow;
    type IntoIter = std::slice::Iter<'a, DynamicRow>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.iter()
    }
}
