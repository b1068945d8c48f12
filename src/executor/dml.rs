use tokio_util::sync::CancellationToken;

use crate::error::SqlConduitError;
use crate::types::SqlValue;

use super::builder::QueryBuilder;
use super::core;
use super::target::QueryTarget;

impl<'e, 'q> QueryBuilder<'e, 'q> {
    /// Execute as a non-query and return the affected row count.
    ///
    /// # Errors
    /// Propagates driver failures; the parameter store is resynced first.
    pub fn execute(self) -> Result<u64, SqlConduitError> {
        let kind = self.effective_kind();
        let timeout = self.effective_timeout();
        let ex = self.executor;
        match self.target {
            QueryTarget::Own => {
                let conn =
                    core::own_conn(&mut ex.conn, &ex.factory, ex.connection_string.as_deref())?;
                let source = ex.params.as_slice().to_vec();
                core::run_execute(
                    conn, &ex.factory, &mut ex.params, &source, kind, self.sql, timeout, false,
                )
            }
            QueryTarget::Connection(conn) => {
                let source = ex.params.as_slice().to_vec();
                core::run_execute(
                    conn, &ex.factory, &mut ex.params, &source, kind, self.sql, timeout, false,
                )
            }
            QueryTarget::ConnectionString(s) => {
                let mut conn = ex.factory.create_connection(s)?;
                let source = ex.params.as_slice().to_vec();
                let result = core::run_execute(
                    conn.as_mut(),
                    &ex.factory,
                    &mut ex.params,
                    &source,
                    kind,
                    self.sql,
                    timeout,
                    false,
                );
                core::finish_scoped(result, conn.as_mut())
            }
        }
    }

    /// Execute and return the first column of the first row.
    ///
    /// # Errors
    /// Propagates driver failures; the parameter store is resynced first.
    pub fn scalar(self) -> Result<SqlValue, SqlConduitError> {
        let kind = self.effective_kind();
        let timeout = self.effective_timeout();
        let ex = self.executor;
        match self.target {
            QueryTarget::Own => {
                let conn =
                    core::own_conn(&mut ex.conn, &ex.factory, ex.connection_string.as_deref())?;
                core::run_scalar(conn, &ex.factory, &mut ex.params, kind, self.sql, timeout)
            }
            QueryTarget::Connection(conn) => {
                core::run_scalar(conn, &ex.factory, &mut ex.params, kind, self.sql, timeout)
            }
            QueryTarget::ConnectionString(s) => {
                let mut conn = ex.factory.create_connection(s)?;
                let result = core::run_scalar(
                    conn.as_mut(),
                    &ex.factory,
                    &mut ex.params,
                    kind,
                    self.sql,
                    timeout,
                );
                core::finish_scoped(result, conn.as_mut())
            }
        }
    }

    /// Async variant of [`QueryBuilder::execute`].
    ///
    /// # Errors
    /// `Cancelled` when the token fires before or during execution.
    pub async fn execute_async(self, cancel: &CancellationToken) -> Result<u64, SqlConduitError> {
        let kind = self.effective_kind();
        let timeout = self.effective_timeout();
        let ex = self.executor;
        match self.target {
            QueryTarget::Own => {
                let conn =
                    core::own_conn(&mut ex.conn, &ex.factory, ex.connection_string.as_deref())?;
                let source = ex.params.as_slice().to_vec();
                core::run_execute_async(
                    conn, &ex.factory, &mut ex.params, &source, kind, self.sql, timeout, false,
                    cancel,
                )
                .await
            }
            QueryTarget::Connection(conn) => {
                let source = ex.params.as_slice().to_vec();
                core::run_execute_async(
                    conn, &ex.factory, &mut ex.params, &source, kind, self.sql, timeout, false,
                    cancel,
                )
                .await
            }
            QueryTarget::ConnectionString(s) => {
                let mut conn = ex.factory.create_connection(s)?;
                let source = ex.params.as_slice().to_vec();
                let result = core::run_execute_async(
                    conn.as_mut(),
                    &ex.factory,
                    &mut ex.params,
                    &source,
                    kind,
                    self.sql,
                    timeout,
                    false,
                    cancel,
                )
                .await;
                core::finish_scoped_async(result, conn.as_mut()).await
            }
        }
    }

    /// Async variant of [`QueryBuilder::scalar`].
    ///
    /// # Errors
    /// `Cancelled` when the token fires before or during execution.
    pub async fn scalar_async(
        self,
        cancel: &CancellationToken,
    ) -> Result<SqlValue, SqlConduitError> {
        let kind = self.effective_kind();
        let timeout = self.effective_timeout();
        let ex = self.executor;
        match self.target {
            QueryTarget::Own => {
                let conn =
                    core::own_conn(&mut ex.conn, &ex.factory, ex.connection_string.as_deref())?;
                core::run_scalar_async(
                    conn, &ex.factory, &mut ex.params, kind, self.sql, timeout, cancel,
                )
                .await
            }
            QueryTarget::Connection(conn) => {
                core::run_scalar_async(
                    conn, &ex.factory, &mut ex.params, kind, self.sql, timeout, cancel,
                )
                .await
            }
            QueryTarget::ConnectionString(s) => {
                let mut conn = ex.factory.create_connection(s)?;
                let result = core::run_scalar_async(
                    conn.as_mut(),
                    &ex.factory,
                    &mut ex.params,
                    kind,
                    self.sql,
                    timeout,
                    cancel,
                )
                .await;
                core::finish_scoped_async(result, conn.as_mut()).await
            }
        }
    }
}
