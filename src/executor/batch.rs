use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::error::SqlConduitError;
use crate::params::{ParamCollection, SqlParameter};
use crate::provider::{DriverConnection, ObjectFactory};
use crate::types::{CommandKind, IsolationLevel};

use super::core;
use super::target::QueryTarget;
use super::{SqlExecutor, ensure_open, ensure_open_async};

/// A SQL statement, its kind, and its own bound parameters: one unit of a
/// batch.
///
/// ```rust
/// use sql_conduit::prelude::*;
///
/// let step = QueryAndParams::new(
///     "INSERT INTO t (id, name) VALUES (@id, @name)",
///     vec![
///         SqlParameter::new("@id", 1),
///         SqlParameter::new("@name", "alice"),
///     ],
/// );
/// # let _ = step;
/// ```
#[derive(Debug, Clone, Default)]
pub struct QueryAndParams {
    /// The SQL query string
    pub query: String,
    /// How to interpret the query text
    pub kind: CommandKind,
    /// The parameters to be bound to the query
    pub params: Vec<SqlParameter>,
}

impl QueryAndParams {
    /// Create a new `QueryAndParams` with the given query string and parameters.
    pub fn new(query: impl Into<String>, params: Vec<SqlParameter>) -> Self {
        Self {
            query: query.into(),
            kind: CommandKind::Text,
            params,
        }
    }

    /// Create a new `QueryAndParams` with no parameters.
    pub fn new_without_params(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            kind: CommandKind::Text,
            params: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_kind(mut self, kind: CommandKind) -> Self {
        self.kind = kind;
        self
    }
}

impl SqlExecutor {
    /// Execute a batch sequentially on the executor's own connection with
    /// no wrapping transaction.
    ///
    /// Statement `k` failing aborts `k+1..`; the effects of statements
    /// before `k` stay applied. Use
    /// [`SqlExecutor::execute_batch_transacted`] when all-or-nothing
    /// semantics are required.
    ///
    /// # Errors
    /// The failing statement's error, after the per-statement parameter
    /// resync.
    pub fn execute_batch(
        &mut self,
        batch: &[QueryAndParams],
    ) -> Result<Vec<u64>, SqlConduitError> {
        self.execute_batch_on(QueryTarget::Own, batch)
    }

    /// [`SqlExecutor::execute_batch`] against an explicit target.
    ///
    /// # Errors
    /// Same contract as [`SqlExecutor::execute_batch`].
    pub fn execute_batch_on(
        &mut self,
        target: QueryTarget<'_>,
        batch: &[QueryAndParams],
    ) -> Result<Vec<u64>, SqlConduitError> {
        let timeout = self.timeout;
        let ex = self;
        match target {
            QueryTarget::Own => {
                let conn =
                    core::own_conn(&mut ex.conn, &ex.factory, ex.connection_string.as_deref())?;
                batch_on_conn(conn, &ex.factory, &mut ex.params, batch, timeout)
            }
            QueryTarget::Connection(conn) => {
                batch_on_conn(conn, &ex.factory, &mut ex.params, batch, timeout)
            }
            QueryTarget::ConnectionString(s) => {
                let mut conn = ex.factory.create_connection(s)?;
                let result =
                    batch_on_conn(conn.as_mut(), &ex.factory, &mut ex.params, batch, timeout);
                core::finish_scoped(result, conn.as_mut())
            }
        }
    }

    /// Execute a batch inside one transaction: every statement commits
    /// together or the whole batch rolls back.
    ///
    /// The first statement's text is offered to the driver as a prepare
    /// hint before execution begins.
    ///
    /// # Errors
    /// The failing statement's error after rollback; `RollbackFailed` when
    /// the rollback itself fails.
    pub fn execute_batch_transacted(
        &mut self,
        batch: &[QueryAndParams],
    ) -> Result<Vec<u64>, SqlConduitError> {
        self.execute_batch_transacted_on(QueryTarget::Own, batch, IsolationLevel::Default)
    }

    /// [`SqlExecutor::execute_batch_transacted`] against an explicit target.
    ///
    /// # Errors
    /// Same contract as [`SqlExecutor::execute_batch_transacted`].
    pub fn execute_batch_transacted_on(
        &mut self,
        target: QueryTarget<'_>,
        batch: &[QueryAndParams],
        isolation: IsolationLevel,
    ) -> Result<Vec<u64>, SqlConduitError> {
        let timeout = self.timeout;
        let ex = self;
        match target {
            QueryTarget::Own => {
                let conn =
                    core::own_conn(&mut ex.conn, &ex.factory, ex.connection_string.as_deref())?;
                batch_tx_on_conn(conn, &ex.factory, &mut ex.params, batch, timeout, isolation)
            }
            QueryTarget::Connection(conn) => {
                batch_tx_on_conn(conn, &ex.factory, &mut ex.params, batch, timeout, isolation)
            }
            QueryTarget::ConnectionString(s) => {
                let mut conn = ex.factory.create_connection(s)?;
                let result = batch_tx_on_conn(
                    conn.as_mut(),
                    &ex.factory,
                    &mut ex.params,
                    batch,
                    timeout,
                    isolation,
                );
                core::finish_scoped(result, conn.as_mut())
            }
        }
    }

    /// Async variant of [`SqlExecutor::execute_batch`].
    ///
    /// # Errors
    /// `Cancelled` between statements when the token fires; otherwise as
    /// the sync variant.
    pub async fn execute_batch_async(
        &mut self,
        batch: &[QueryAndParams],
        cancel: &CancellationToken,
    ) -> Result<Vec<u64>, SqlConduitError> {
        core::check_cancelled(cancel)?;
        let timeout = self.timeout;
        let ex = self;
        let conn = core::own_conn(&mut ex.conn, &ex.factory, ex.connection_string.as_deref())?;
        ensure_open_async(conn, cancel).await?;
        let mut counts = Vec::with_capacity(batch.len());
        for item in batch {
            let result = core::run_execute_async(
                conn,
                &ex.factory,
                &mut ex.params,
                &item.params,
                item.kind,
                &item.query,
                timeout,
                false,
                cancel,
            )
            .await;
            counts.push(result?);
        }
        Ok(counts)
    }

    /// Async variant of [`SqlExecutor::execute_batch_transacted`].
    ///
    /// # Errors
    /// Same contract as [`SqlExecutor::execute_batch_transacted`], plus
    /// `Cancelled` (after rollback) when the token fires mid-batch.
    pub async fn execute_batch_transacted_async(
        &mut self,
        batch: &[QueryAndParams],
        cancel: &CancellationToken,
    ) -> Result<Vec<u64>, SqlConduitError> {
        core::check_cancelled(cancel)?;
        let timeout = self.timeout;
        let ex = self;
        let conn = core::own_conn(&mut ex.conn, &ex.factory, ex.connection_string.as_deref())?;
        ensure_open_async(conn, cancel).await?;
        let mut tx = ex
            .factory
            .create_transaction_async(conn, IsolationLevel::Default, cancel)
            .await?;
        if let Some(first) = batch.first() {
            conn.prepare(&first.query)?;
        }
        let mut counts = Vec::with_capacity(batch.len());
        let mut failure: Option<SqlConduitError> = None;
        for item in batch {
            let result = core::run_execute_async(
                conn,
                &ex.factory,
                &mut ex.params,
                &item.params,
                item.kind,
                &item.query,
                timeout,
                true,
                cancel,
            )
            .await;
            match result {
                Ok(n) => counts.push(n),
                Err(e) => {
                    failure = Some(e);
                    break;
                }
            }
        }
        match failure {
            None => {
                tx.commit_async(cancel).await?;
                Ok(counts)
            }
            Some(e) => {
                warn!(error = %e, "batch failed, rolling back");
                match tx.rollback_async().await {
                    Ok(()) => Err(e),
                    Err(rb) => Err(SqlConduitError::rollback_failed(e, rb)),
                }
            }
        }
    }
}

fn batch_on_conn(
    conn: &mut dyn DriverConnection,
    factory: &ObjectFactory,
    store: &mut ParamCollection,
    batch: &[QueryAndParams],
    timeout: Option<Duration>,
) -> Result<Vec<u64>, SqlConduitError> {
    ensure_open(conn)?;
    let mut counts = Vec::with_capacity(batch.len());
    for item in batch {
        let result = core::run_execute(
            conn,
            factory,
            store,
            &item.params,
            item.kind,
            &item.query,
            timeout,
            false,
        );
        // A failure aborts the remaining statements; the already-applied
        // ones stay committed since nothing wraps them.
        counts.push(result?);
    }
    Ok(counts)
}

fn batch_tx_on_conn(
    conn: &mut dyn DriverConnection,
    factory: &ObjectFactory,
    store: &mut ParamCollection,
    batch: &[QueryAndParams],
    timeout: Option<Duration>,
    isolation: IsolationLevel,
) -> Result<Vec<u64>, SqlConduitError> {
    ensure_open(conn)?;
    let mut tx = factory.create_transaction(conn, isolation)?;
    if let Some(first) = batch.first() {
        conn.prepare(&first.query)?;
    }
    let mut counts = Vec::with_capacity(batch.len());
    let mut failure: Option<SqlConduitError> = None;
    for item in batch {
        let result = core::run_execute(
            conn,
            factory,
            store,
            &item.params,
            item.kind,
            &item.query,
            timeout,
            true,
        );
        match result {
            Ok(n) => counts.push(n),
            Err(e) => {
                failure = Some(e);
                break;
            }
        }
    }
    match failure {
        None => {
            tx.commit()?;
            Ok(counts)
        }
        Some(e) => {
            warn!(error = %e, "batch failed, rolling back");
            match tx.rollback() {
                Ok(()) => Err(e),
                Err(rb) => Err(SqlConduitError::rollback_failed(e, rb)),
            }
        }
    }
}
