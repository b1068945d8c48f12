use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::SqlConduitError;
use crate::params::{ParamCollection, SqlParameter};
use crate::provider::{DriverConnection, ObjectFactory, RowCursor};
use crate::types::{CommandKind, SqlValue};

use super::{OwnedConn, ensure_open, ensure_open_async};

/// Resolve the executor's own connection, creating it lazily from the
/// connection string on first use.
pub(crate) fn own_conn<'a>(
    conn: &'a mut OwnedConn,
    factory: &ObjectFactory,
    connection_string: Option<&str>,
) -> Result<&'a mut dyn DriverConnection, SqlConduitError> {
    if matches!(conn, OwnedConn::None) {
        let Some(s) = connection_string else {
            return Err(SqlConduitError::Config(
                "executor has neither a connection nor a connection string".into(),
            ));
        };
        *conn = OwnedConn::Owned(factory.create_connection(s)?);
    }
    match conn {
        OwnedConn::Owned(c) | OwnedConn::Attached(c) => Ok(c.as_mut()),
        OwnedConn::None => Err(SqlConduitError::Config(
            "executor connection unavailable".into(),
        )),
    }
}

pub(crate) fn check_cancelled(cancel: &CancellationToken) -> Result<(), SqlConduitError> {
    if cancel.is_cancelled() {
        return Err(SqlConduitError::Cancelled);
    }
    Ok(())
}

/// Execute a non-query against `conn` and always resync the store from the
/// command's post-execution parameters, success or failure.
#[allow(clippy::too_many_arguments)]
pub(crate) fn run_execute(
    conn: &mut dyn DriverConnection,
    factory: &ObjectFactory,
    store: &mut ParamCollection,
    source: &[SqlParameter],
    kind: CommandKind,
    text: &str,
    timeout: Option<Duration>,
    transactional: bool,
) -> Result<u64, SqlConduitError> {
    ensure_open(conn)?;
    let mut cmd =
        factory.create_command_with_params(kind, text, source.to_vec(), timeout, transactional);
    debug!(query = text, "executing non-query");
    let result = conn.execute(&mut cmd);
    store.sync_from(&cmd.params);
    result
}

#[allow(clippy::too_many_arguments)]
pub(crate) fn run_scalar(
    conn: &mut dyn DriverConnection,
    factory: &ObjectFactory,
    store: &mut ParamCollection,
    kind: CommandKind,
    text: &str,
    timeout: Option<Duration>,
) -> Result<SqlValue, SqlConduitError> {
    ensure_open(conn)?;
    let mut cmd =
        factory.create_command_with_params(kind, text, store.as_slice().to_vec(), timeout, false);
    debug!(query = text, "executing scalar");
    let result = conn.scalar(&mut cmd);
    store.sync_from(&cmd.params);
    result
}

pub(crate) fn run_query(
    conn: &mut dyn DriverConnection,
    factory: &ObjectFactory,
    store: &mut ParamCollection,
    kind: CommandKind,
    text: &str,
    timeout: Option<Duration>,
) -> Result<Box<dyn RowCursor>, SqlConduitError> {
    ensure_open(conn)?;
    let mut cmd =
        factory.create_command_with_params(kind, text, store.as_slice().to_vec(), timeout, false);
    debug!(query = text, "executing query");
    let result = conn.query(&mut cmd);
    store.sync_from(&cmd.params);
    result
}

#[allow(clippy::too_many_arguments)]
pub(crate) async fn run_execute_async(
    conn: &mut dyn DriverConnection,
    factory: &ObjectFactory,
    store: &mut ParamCollection,
    source: &[SqlParameter],
    kind: CommandKind,
    text: &str,
    timeout: Option<Duration>,
    transactional: bool,
    cancel: &CancellationToken,
) -> Result<u64, SqlConduitError> {
    check_cancelled(cancel)?;
    ensure_open_async(conn, cancel).await?;
    let mut cmd =
        factory.create_command_with_params(kind, text, source.to_vec(), timeout, transactional);
    debug!(query = text, "executing non-query (async)");
    let result = conn.execute_async(&mut cmd, cancel).await;
    store.sync_from(&cmd.params);
    result
}

pub(crate) async fn run_scalar_async(
    conn: &mut dyn DriverConnection,
    factory: &ObjectFactory,
    store: &mut ParamCollection,
    kind: CommandKind,
    text: &str,
    timeout: Option<Duration>,
    cancel: &CancellationToken,
) -> Result<SqlValue, SqlConduitError> {
    check_cancelled(cancel)?;
    ensure_open_async(conn, cancel).await?;
    let mut cmd =
        factory.create_command_with_params(kind, text, store.as_slice().to_vec(), timeout, false);
    debug!(query = text, "executing scalar (async)");
    let result = conn.scalar_async(&mut cmd, cancel).await;
    store.sync_from(&cmd.params);
    result
}

pub(crate) async fn run_query_async(
    conn: &mut dyn DriverConnection,
    factory: &ObjectFactory,
    store: &mut ParamCollection,
    kind: CommandKind,
    text: &str,
    timeout: Option<Duration>,
    cancel: &CancellationToken,
) -> Result<Box<dyn RowCursor>, SqlConduitError> {
    check_cancelled(cancel)?;
    ensure_open_async(conn, cancel).await?;
    let mut cmd =
        factory.create_command_with_params(kind, text, store.as_slice().to_vec(), timeout, false);
    debug!(query = text, "executing query (async)");
    let result = conn.query_async(&mut cmd, cancel).await;
    store.sync_from(&cmd.params);
    result
}

/// Close a scoped connection, folding a close failure into the outcome
/// without masking a primary error.
pub(crate) fn finish_scoped<T>(
    result: Result<T, SqlConduitError>,
    conn: &mut dyn DriverConnection,
) -> Result<T, SqlConduitError> {
    let close_result = conn.close();
    match (result, close_result) {
        (Ok(value), Ok(())) => Ok(value),
        (Err(e), _) => Err(e),
        (Ok(_), Err(close_err)) => Err(close_err),
    }
}

pub(crate) async fn finish_scoped_async<T>(
    result: Result<T, SqlConduitError>,
    conn: &mut dyn DriverConnection,
) -> Result<T, SqlConduitError> {
    let close_result = conn.close_async().await;
    match (result, close_result) {
        (Ok(value), Ok(())) => Ok(value),
        (Err(e), _) => Err(e),
        (Ok(_), Err(close_err)) => Err(close_err),
    }
}
