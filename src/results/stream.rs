use std::collections::HashMap;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::error::SqlConduitError;
use crate::provider::RowCursor;
use crate::types::SqlValue;

use super::result_set::ResultSet;
use super::row::{DynamicRow, build_index_cache};

/// Lazy, single-pass adapter from a driver cursor to [`DynamicRow`]s.
///
/// Not restartable; dropping it abandons the cursor's remaining rows.
pub struct RowIter {
    cursor: Box<dyn RowCursor>,
    columns: Arc<Vec<String>>,
    index_cache: Arc<HashMap<String, usize>>,
}

impl RowIter {
    #[must_use]
    pub fn new(cursor: Box<dyn RowCursor>) -> Self {
        let columns = cursor.columns();
        let index_cache = Arc::new(build_index_cache(&columns));
        Self {
            cursor,
            columns,
            index_cache,
        }
    }

    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    fn wrap(&self, values: Vec<SqlValue>) -> DynamicRow {
        DynamicRow::with_cache(self.columns.clone(), values, self.index_cache.clone())
    }

    /// Async advance, honoring the cancellation token at the read call.
    ///
    /// # Errors
    /// `Cancelled` when the token fires, otherwise the driver's error.
    pub async fn next_row_async(
        &mut self,
        cancel: &CancellationToken,
    ) -> Result<Option<DynamicRow>, SqlConduitError> {
        let values = self.cursor.next_row_async(cancel).await?;
        Ok(values.map(|v| self.wrap(v)))
    }

    /// Release the underlying cursor.
    ///
    /// # Errors
    /// Propagates the driver's close failure.
    pub fn close(&mut self) -> Result<(), SqlConduitError> {
        self.cursor.close()
    }
}

impl Iterator for RowIter {
    type Item = Result<DynamicRow, SqlConduitError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.cursor.next_row() {
            Ok(Some(values)) => Some(Ok(self.wrap(values))),
            Ok(None) => None,
            Err(e) => Some(Err(e)),
        }
    }
}

/// Drain a cursor into a buffered [`ResultSet`], closing it afterwards.
///
/// # Errors
/// Propagates the driver's row-read failure.
pub fn buffer_cursor(mut cursor: Box<dyn RowCursor>) -> Result<ResultSet, SqlConduitError> {
    let columns = cursor.columns();
    let mut set = ResultSet::default();
    set.set_column_names(columns);
    loop {
        match cursor.next_row() {
            Ok(Some(values)) => set.add_row_values(values),
            Ok(None) => break,
            Err(e) => {
                let _ = cursor.close();
                return Err(e);
            }
        }
    }
    cursor.close()?;
    Ok(set)
}

/// Async variant of [`buffer_cursor`]; cancellation is checked per row.
///
/// # Errors
/// `Cancelled` when the token fires mid-read, otherwise the driver's error.
pub async fn buffer_cursor_async(
    mut cursor: Box<dyn RowCursor>,
    cancel: &CancellationToken,
) -> Result<ResultSet, SqlConduitError> {
    let columns = cursor.columns();
    let mut set = ResultSet::default();
    set.set_column_names(columns);
    loop {
        match cursor.next_row_async(cancel).await {
            Ok(Some(values)) => set.add_row_values(values),
            Ok(None) => break,
            Err(e) => {
                let _ = cursor.close();
                return Err(e);
            }
        }
    }
    cursor.close()?;
    Ok(set)
}
