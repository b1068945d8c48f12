use tokio_util::sync::CancellationToken;

use crate::error::SqlConduitError;
use crate::materialize::{FromRow, RowMapping, project_with};
use crate::provider::RowCursor;
use crate::results::RowIter;

use super::cursor::CursorGuard;

/// Lazy synchronous typed sequence over a live cursor.
///
/// Single-pass; dropping it releases the cursor (and any scoped
/// connection) best-effort.
pub struct TypedRows<T: FromRow> {
    rows: RowIter,
    mapping: RowMapping<T>,
}

impl<T: FromRow> TypedRows<T> {
    pub(crate) fn new(guard: CursorGuard, mapping: RowMapping<T>) -> Self {
        Self {
            rows: RowIter::new(Box::new(guard) as Box<dyn RowCursor>),
            mapping,
        }
    }

    /// Release the cursor early.
    ///
    /// # Errors
    /// Propagates the driver's close failure.
    pub fn close(&mut self) -> Result<(), SqlConduitError> {
        self.rows.close()
    }
}

impl<T: FromRow> Iterator for TypedRows<T> {
    type Item = Result<T, SqlConduitError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.rows
            .next()
            .map(|row| row.and_then(|r| project_with(&r, &self.mapping)))
    }
}

/// Async lazy typed sequence; the cancellation token captured at creation
/// is honored on every row read.
pub struct TypedStream<T: FromRow> {
    rows: RowIter,
    mapping: RowMapping<T>,
    cancel: CancellationToken,
}

impl<T: FromRow> TypedStream<T> {
    pub(crate) fn new(guard: CursorGuard, mapping: RowMapping<T>, cancel: CancellationToken) -> Self {
        Self {
            rows: RowIter::new(Box::new(guard) as Box<dyn RowCursor>),
            mapping,
            cancel,
        }
    }

    /// Pull the next typed row; `None` when exhausted.
    ///
    /// # Errors
    /// `Cancelled` when the captured token fires; driver and coercion
    /// failures otherwise.
    pub async fn next(&mut self) -> Result<Option<T>, SqlConduitError> {
        match self.rows.next_row_async(&self.cancel).await? {
            Some(row) => Ok(Some(project_with(&row, &self.mapping)?)),
            None => Ok(None),
        }
    }

    /// Release the cursor early.
    ///
    /// # Errors
    /// Propagates the driver's close failure.
    pub fn close(&mut self) -> Result<(), SqlConduitError> {
        self.rows.close()
    }
}
