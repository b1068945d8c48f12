use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::SqlConduitError;
use crate::provider::{DriverConnection, RowCursor};
use crate::types::SqlValue;

/// A raw cursor handed back to the caller, optionally carrying the
/// connection the executor opened for it.
///
/// The caller is responsible for closing it; closing also closes an
/// executor-opened underlying connection. Dropping it closes both
/// best-effort.
pub struct CursorGuard {
    cursor: Option<Box<dyn RowCursor>>,
    owned_conn: Option<Box<dyn DriverConnection>>,
}

impl CursorGuard {
    pub(crate) fn new(
        cursor: Box<dyn RowCursor>,
        owned_conn: Option<Box<dyn DriverConnection>>,
    ) -> Self {
        Self {
            cursor: Some(cursor),
            owned_conn,
        }
    }

    fn cursor_mut(&mut self) -> Result<&mut Box<dyn RowCursor>, SqlConduitError> {
        self.cursor
            .as_mut()
            .ok_or_else(|| SqlConduitError::Execution("cursor already closed".into()))
    }
}

#[async_trait]
impl RowCursor for CursorGuard {
    fn columns(&self) -> Arc<Vec<String>> {
        self.cursor
            .as_ref()
            .map_or_else(|| Arc::new(Vec::new()), |c| c.columns())
    }

    fn next_row(&mut self) -> Result<Option<Vec<SqlValue>>, SqlConduitError> {
        self.cursor_mut()?.next_row()
    }

    fn close(&mut self) -> Result<(), SqlConduitError> {
        let cursor_result = match self.cursor.take() {
            Some(mut cursor) => cursor.close(),
            None => Ok(()),
        };
        let conn_result = match self.owned_conn.take() {
            Some(mut conn) => conn.close(),
            None => Ok(()),
        };
        cursor_result.and(conn_result)
    }

    async fn next_row_async(
        &mut self,
        cancel: &CancellationToken,
    ) -> Result<Option<Vec<SqlValue>>, SqlConduitError> {
        self.cursor_mut()?.next_row_async(cancel).await
    }
}

impl Drop for CursorGuard {
    fn drop(&mut self) {
        if let Some(mut cursor) = self.cursor.take() {
            let _ = cursor.close();
        }
        if let Some(mut conn) = self.owned_conn.take() {
            let _ = conn.close();
        }
    }
}
