use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::error::SqlConduitError;
use crate::params::ParamCollection;
use crate::provider::{DriverConnection, DriverTransaction, ObjectFactory};
use crate::types::{CommandKind, IsolationLevel};

use super::core;
use super::target::QueryTarget;
use super::{SqlExecutor, ensure_open, ensure_open_async};

/// Knobs for transaction-scoped execution.
#[derive(Debug, Clone, Copy)]
pub struct TransactedOptions {
    /// Command kind; `None` uses the executor default.
    pub kind: Option<CommandKind>,
    /// Commit on success (default). `false` leaves the implicit
    /// transaction open only when the caller supplied it.
    pub commit: bool,
    pub isolation: IsolationLevel,
}

impl Default for TransactedOptions {
    fn default() -> Self {
        Self {
            kind: None,
            commit: true,
            isolation: IsolationLevel::Default,
        }
    }
}

impl SqlExecutor {
    /// Execute one statement inside an implicit transaction on the
    /// executor's own connection: commit on success, roll back on failure.
    ///
    /// # Errors
    /// The execution failure after rollback; `RollbackFailed` carrying
    /// both errors when the rollback itself fails.
    pub fn execute_transacted(&mut self, sql: &str) -> Result<u64, SqlConduitError> {
        self.execute_transacted_on(QueryTarget::Own, sql, TransactedOptions::default())
    }

    /// [`SqlExecutor::execute_transacted`] against an explicit target.
    ///
    /// # Errors
    /// Same contract as [`SqlExecutor::execute_transacted`].
    pub fn execute_transacted_on(
        &mut self,
        target: QueryTarget<'_>,
        sql: &str,
        opts: TransactedOptions,
    ) -> Result<u64, SqlConduitError> {
        let kind = opts.kind.unwrap_or(self.default_kind);
        let timeout = self.timeout;
        let ex = self;
        match target {
            QueryTarget::Own => {
                let conn =
                    core::own_conn(&mut ex.conn, &ex.factory, ex.connection_string.as_deref())?;
                transacted_on_conn(conn, &ex.factory, &mut ex.params, sql, kind, timeout, opts)
            }
            QueryTarget::Connection(conn) => {
                transacted_on_conn(conn, &ex.factory, &mut ex.params, sql, kind, timeout, opts)
            }
            QueryTarget::ConnectionString(s) => {
                let mut conn = ex.factory.create_connection(s)?;
                let result = transacted_on_conn(
                    conn.as_mut(),
                    &ex.factory,
                    &mut ex.params,
                    sql,
                    kind,
                    timeout,
                    opts,
                );
                core::finish_scoped(result, conn.as_mut())
            }
        }
    }

    /// Execute one statement inside a caller-supplied open transaction on
    /// the executor's own connection. Commits when `commit` is true; any
    /// execution failure rolls the supplied transaction back before the
    /// error is returned.
    ///
    /// # Errors
    /// Same contract as [`SqlExecutor::execute_transacted`].
    pub fn execute_in_transaction(
        &mut self,
        sql: &str,
        tx: &mut dyn DriverTransaction,
        commit: bool,
    ) -> Result<u64, SqlConduitError> {
        let kind = self.default_kind;
        let timeout = self.timeout;
        let ex = self;
        let conn = core::own_conn(&mut ex.conn, &ex.factory, ex.connection_string.as_deref())?;
        ensure_open(conn)?;
        let source = ex.params.as_slice().to_vec();
        let result = core::run_execute(
            conn,
            &ex.factory,
            &mut ex.params,
            &source,
            kind,
            sql,
            timeout,
            true,
        );
        settle_sync(result, tx, commit)
    }

    /// Async variant of [`SqlExecutor::execute_transacted`].
    ///
    /// # Errors
    /// `Cancelled` (after rollback of the implicit transaction) when the
    /// token fires mid-flight; otherwise as the sync variant.
    pub async fn execute_transacted_async(
        &mut self,
        sql: &str,
        cancel: &CancellationToken,
    ) -> Result<u64, SqlConduitError> {
        self.execute_transacted_on_async(QueryTarget::Own, sql, TransactedOptions::default(), cancel)
            .await
    }

    /// Async variant of [`SqlExecutor::execute_transacted_on`].
    ///
    /// # Errors
    /// Same contract as [`SqlExecutor::execute_transacted_async`].
    pub async fn execute_transacted_on_async(
        &mut self,
        target: QueryTarget<'_>,
        sql: &str,
        opts: TransactedOptions,
        cancel: &CancellationToken,
    ) -> Result<u64, SqlConduitError> {
        core::check_cancelled(cancel)?;
        let kind = opts.kind.unwrap_or(self.default_kind);
        let timeout = self.timeout;
        let ex = self;
        match target {
            QueryTarget::Own => {
                let conn =
                    core::own_conn(&mut ex.conn, &ex.factory, ex.connection_string.as_deref())?;
                transacted_on_conn_async(
                    conn, &ex.factory, &mut ex.params, sql, kind, timeout, opts, cancel,
                )
                .await
            }
            QueryTarget::Connection(conn) => {
                transacted_on_conn_async(
                    conn, &ex.factory, &mut ex.params, sql, kind, timeout, opts, cancel,
                )
                .await
            }
            QueryTarget::ConnectionString(s) => {
                let mut conn = ex.factory.create_connection(s)?;
                let result = transacted_on_conn_async(
                    conn.as_mut(),
                    &ex.factory,
                    &mut ex.params,
                    sql,
                    kind,
                    timeout,
                    opts,
                    cancel,
                )
                .await;
                core::finish_scoped_async(result, conn.as_mut()).await
            }
        }
    }

    /// Async variant of [`SqlExecutor::execute_in_transaction`].
    ///
    /// # Errors
    /// Same contract as [`SqlExecutor::execute_in_transaction`].
    pub async fn execute_in_transaction_async(
        &mut self,
        sql: &str,
        tx: &mut dyn DriverTransaction,
        commit: bool,
        cancel: &CancellationToken,
    ) -> Result<u64, SqlConduitError> {
        core::check_cancelled(cancel)?;
        let kind = self.default_kind;
        let timeout = self.timeout;
        let ex = self;
        let conn = core::own_conn(&mut ex.conn, &ex.factory, ex.connection_string.as_deref())?;
        ensure_open_async(conn, cancel).await?;
        let source = ex.params.as_slice().to_vec();
        let result = core::run_execute_async(
            conn,
            &ex.factory,
            &mut ex.params,
            &source,
            kind,
            sql,
            timeout,
            true,
            cancel,
        )
        .await;
        settle_async(result, tx, commit, cancel).await
    }
}

fn transacted_on_conn(
    conn: &mut dyn DriverConnection,
    factory: &ObjectFactory,
    store: &mut ParamCollection,
    sql: &str,
    kind: CommandKind,
    timeout: Option<Duration>,
    opts: TransactedOptions,
) -> Result<u64, SqlConduitError> {
    ensure_open(conn)?;
    let mut tx = factory.create_transaction(conn, opts.isolation)?;
    let source = store.as_slice().to_vec();
    let result = core::run_execute(conn, factory, store, &source, kind, sql, timeout, true);
    settle_sync(result, tx.as_mut(), opts.commit)
}

#[allow(clippy::too_many_arguments)]
async fn transacted_on_conn_async(
    conn: &mut dyn DriverConnection,
    factory: &ObjectFactory,
    store: &mut ParamCollection,
    sql: &str,
    kind: CommandKind,
    timeout: Option<Duration>,
    opts: TransactedOptions,
    cancel: &CancellationToken,
) -> Result<u64, SqlConduitError> {
    ensure_open_async(conn, cancel).await?;
    let mut tx = factory
        .create_transaction_async(conn, opts.isolation, cancel)
        .await?;
    let source = store.as_slice().to_vec();
    let result = core::run_execute_async(
        conn, factory, store, &source, kind, sql, timeout, true, cancel,
    )
    .await;
    settle_async(result, tx.as_mut(), opts.commit, cancel).await
}

/// Commit-on-success / rollback-on-failure, chaining a rollback failure
/// with the error that triggered it.
fn settle_sync(
    result: Result<u64, SqlConduitError>,
    tx: &mut dyn DriverTransaction,
    commit: bool,
) -> Result<u64, SqlConduitError> {
    match result {
        Ok(affected) => {
            if commit {
                tx.commit()?;
            }
            Ok(affected)
        }
        Err(e) => {
            warn!(error = %e, "execution failed, rolling back");
            match tx.rollback() {
                Ok(()) => Err(e),
                Err(rb) => Err(SqlConduitError::rollback_failed(e, rb)),
            }
        }
    }
}

async fn settle_async(
    result: Result<u64, SqlConduitError>,
    tx: &mut dyn DriverTransaction,
    commit: bool,
    cancel: &CancellationToken,
) -> Result<u64, SqlConduitError> {
    match result {
        Ok(affected) => {
            if commit {
                tx.commit_async(cancel).await?;
            }
            Ok(affected)
        }
        Err(e) => {
            warn!(error = %e, "execution failed, rolling back");
            match tx.rollback_async().await {
                Ok(()) => Err(e),
                Err(rb) => Err(SqlConduitError::rollback_failed(e, rb)),
            }
        }
    }
}
