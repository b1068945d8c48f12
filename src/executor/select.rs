use tokio_util::sync::CancellationToken;

use crate::error::SqlConduitError;
use crate::materialize::{FromRow, project_with};
use crate::provider::RowCursor;
use crate::results::{ResultSet, buffer_cursor, buffer_cursor_async};

use super::builder::QueryBuilder;
use super::core;
use super::cursor::CursorGuard;
use super::target::QueryTarget;
use super::typed_stream::{TypedRows, TypedStream};

impl<'e, 'q> QueryBuilder<'e, 'q> {
    /// Execute and buffer the full result set.
    ///
    /// # Errors
    /// Propagates driver failures; the parameter store is resynced first.
    pub fn select(self) -> Result<ResultSet, SqlConduitError> {
        let kind = self.effective_kind();
        let timeout = self.effective_timeout();
        let ex = self.executor;
        match self.target {
            QueryTarget::Own => {
                let conn =
                    core::own_conn(&mut ex.conn, &ex.factory, ex.connection_string.as_deref())?;
                let cursor =
                    core::run_query(conn, &ex.factory, &mut ex.params, kind, self.sql, timeout)?;
                buffer_cursor(cursor)
            }
            QueryTarget::Connection(conn) => {
                let cursor =
                    core::run_query(conn, &ex.factory, &mut ex.params, kind, self.sql, timeout)?;
                buffer_cursor(cursor)
            }
            QueryTarget::ConnectionString(s) => {
                let mut conn = ex.factory.create_connection(s)?;
                let result = core::run_query(
                    conn.as_mut(),
                    &ex.factory,
                    &mut ex.params,
                    kind,
                    self.sql,
                    timeout,
                )
                .and_then(buffer_cursor);
                core::finish_scoped(result, conn.as_mut())
            }
        }
    }

    /// Execute and hand the raw cursor to the caller, who must close it.
    /// For a connection-string target the cursor carries the scoped
    /// connection and closes it too.
    ///
    /// # Errors
    /// Propagates driver failures; the parameter store is resynced first.
    pub fn reader(self) -> Result<CursorGuard, SqlConduitError> {
        let kind = self.effective_kind();
        let timeout = self.effective_timeout();
        let ex = self.executor;
        match self.target {
            QueryTarget::Own => {
                let conn =
                    core::own_conn(&mut ex.conn, &ex.factory, ex.connection_string.as_deref())?;
                let cursor =
                    core::run_query(conn, &ex.factory, &mut ex.params, kind, self.sql, timeout)?;
                Ok(CursorGuard::new(cursor, None))
            }
            QueryTarget::Connection(conn) => {
                let cursor =
                    core::run_query(conn, &ex.factory, &mut ex.params, kind, self.sql, timeout)?;
                Ok(CursorGuard::new(cursor, None))
            }
            QueryTarget::ConnectionString(s) => {
                let mut conn = ex.factory.create_connection(s)?;
                match core::run_query(
                    conn.as_mut(),
                    &ex.factory,
                    &mut ex.params,
                    kind,
                    self.sql,
                    timeout,
                ) {
                    Ok(cursor) => Ok(CursorGuard::new(cursor, Some(conn))),
                    Err(e) => {
                        let _ = conn.close();
                        Err(e)
                    }
                }
            }
        }
    }

    /// Materialize every row into `T`, in encounter order.
    ///
    /// # Errors
    /// Driver failures and `TypeConversion` coercion failures.
    pub fn fetch_all<T: FromRow>(self) -> Result<Vec<T>, SqlConduitError> {
        let set = self.select()?;
        crate::materialize::project_list(&set)
    }

    /// Materialize the first row into `T`; zero rows yield `T::default()`.
    ///
    /// # Errors
    /// Driver failures and `TypeConversion` coercion failures.
    pub fn fetch_one<T: FromRow>(self) -> Result<T, SqlConduitError> {
        let mut guard = self.reader()?;
        let mapping = T::row_mapping();
        let columns = guard.columns();
        let first = guard.next_row();
        let close_result = guard.close();
        let row = match first {
            Ok(Some(values)) => Some(crate::results::DynamicRow::new(columns, values)),
            Ok(None) => None,
            Err(e) => return Err(e),
        };
        close_result?;
        match row {
            Some(row) => project_with(&row, &mapping),
            None => Ok(T::default()),
        }
    }

    /// Lazy typed iteration over the cursor; single-pass, not restartable.
    ///
    /// # Errors
    /// Propagates driver failures from executing the statement.
    pub fn fetch_iter<T: FromRow>(self) -> Result<TypedRows<T>, SqlConduitError> {
        let guard = self.reader()?;
        Ok(TypedRows::new(guard, T::row_mapping()))
    }

    /// Async variant of [`QueryBuilder::select`].
    ///
    /// # Errors
    /// `Cancelled` when the token fires before or during the read.
    pub async fn select_async(
        self,
        cancel: &CancellationToken,
    ) -> Result<ResultSet, SqlConduitError> {
        let kind = self.effective_kind();
        let timeout = self.effective_timeout();
        let ex = self.executor;
        match self.target {
            QueryTarget::Own => {
                let conn =
                    core::own_conn(&mut ex.conn, &ex.factory, ex.connection_string.as_deref())?;
                let cursor = core::run_query_async(
                    conn, &ex.factory, &mut ex.params, kind, self.sql, timeout, cancel,
                )
                .await?;
                buffer_cursor_async(cursor, cancel).await
            }
            QueryTarget::Connection(conn) => {
                let cursor = core::run_query_async(
                    conn, &ex.factory, &mut ex.params, kind, self.sql, timeout, cancel,
                )
                .await?;
                buffer_cursor_async(cursor, cancel).await
            }
            QueryTarget::ConnectionString(s) => {
                let mut conn = ex.factory.create_connection(s)?;
                let result = match core::run_query_async(
                    conn.as_mut(),
                    &ex.factory,
                    &mut ex.params,
                    kind,
                    self.sql,
                    timeout,
                    cancel,
                )
                .await
                {
                    Ok(cursor) => buffer_cursor_async(cursor, cancel).await,
                    Err(e) => Err(e),
                };
                core::finish_scoped_async(result, conn.as_mut()).await
            }
        }
    }

    /// Async variant of [`QueryBuilder::reader`].
    ///
    /// # Errors
    /// `Cancelled` when the token fires before the execute call.
    pub async fn reader_async(
        self,
        cancel: &CancellationToken,
    ) -> Result<CursorGuard, SqlConduitError> {
        let kind = self.effective_kind();
        let timeout = self.effective_timeout();
        let ex = self.executor;
        match self.target {
            QueryTarget::Own => {
                let conn =
                    core::own_conn(&mut ex.conn, &ex.factory, ex.connection_string.as_deref())?;
                let cursor = core::run_query_async(
                    conn, &ex.factory, &mut ex.params, kind, self.sql, timeout, cancel,
                )
                .await?;
                Ok(CursorGuard::new(cursor, None))
            }
            QueryTarget::Connection(conn) => {
                let cursor = core::run_query_async(
                    conn, &ex.factory, &mut ex.params, kind, self.sql, timeout, cancel,
                )
                .await?;
                Ok(CursorGuard::new(cursor, None))
            }
            QueryTarget::ConnectionString(s) => {
                let mut conn = ex.factory.create_connection(s)?;
                match core::run_query_async(
                    conn.as_mut(),
                    &ex.factory,
                    &mut ex.params,
                    kind,
                    self.sql,
                    timeout,
                    cancel,
                )
                .await
                {
                    Ok(cursor) => Ok(CursorGuard::new(cursor, Some(conn))),
                    Err(e) => {
                        let _ = conn.close_async().await;
                        Err(e)
                    }
                }
            }
        }
    }

    /// Async variant of [`QueryBuilder::fetch_all`].
    ///
    /// # Errors
    /// `Cancelled`, driver failures, and coercion failures.
    pub async fn fetch_all_async<T: FromRow>(
        self,
        cancel: &CancellationToken,
    ) -> Result<Vec<T>, SqlConduitError> {
        let set = self.select_async(cancel).await?;
        crate::materialize::project_list(&set)
    }

    /// Async variant of [`QueryBuilder::fetch_one`].
    ///
    /// # Errors
    /// `Cancelled`, driver failures, and coercion failures.
    pub async fn fetch_one_async<T: FromRow>(
        self,
        cancel: &CancellationToken,
    ) -> Result<T, SqlConduitError> {
        let mut guard = self.reader_async(cancel).await?;
        let mapping = T::row_mapping();
        let columns = guard.columns();
        let first = guard.next_row_async(cancel).await;
        let close_result = guard.close();
        let row = match first {
            Ok(Some(values)) => Some(crate::results::DynamicRow::new(columns, values)),
            Ok(None) => None,
            Err(e) => return Err(e),
        };
        close_result?;
        match row {
            Some(row) => project_with(&row, &mapping),
            None => Ok(T::default()),
        }
    }

    /// Async lazy typed sequence; rows are pulled on demand with the same
    /// cancellation token captured here.
    ///
    /// # Errors
    /// `Cancelled` and driver failures from executing the statement.
    pub async fn fetch_stream<T: FromRow>(
        self,
        cancel: &CancellationToken,
    ) -> Result<TypedStream<T>, SqlConduitError> {
        let guard = self.reader_async(cancel).await?;
        Ok(TypedStream::new(guard, T::row_mapping(), cancel.clone()))
    }
}
