//! Orchestrates connection lifecycle, command construction, execution, and
//! the guaranteed output-parameter resync.

mod batch;
mod builder;
mod core;
mod cursor;
mod dml;
mod select;
mod target;
mod transacted;
mod typed_stream;

pub use batch::QueryAndParams;
pub use builder::QueryBuilder;
pub use cursor::CursorGuard;
pub use target::QueryTarget;
pub use transacted::TransactedOptions;
pub use typed_stream::{TypedRows, TypedStream};

use std::time::Duration;

use crate::error::SqlConduitError;
use crate::params::ParamCollection;
use crate::provider::{DriverConnection, ObjectFactory};
use crate::types::CommandKind;

pub(crate) enum OwnedConn {
    /// No connection yet; created lazily from the connection string.
    None,
    /// Opened by the executor from its connection string; closed on drop.
    Owned(Box<dyn DriverConnection>),
    /// Supplied by the caller; never closed by the executor.
    Attached(Box<dyn DriverConnection>),
}

/// Executes parameterized SQL against one logical connection.
///
/// Owns the parameter store and the command defaults (timeout, query kind,
/// binder). Not safe for concurrent use from multiple logical operations:
/// the post-execution parameter resync is a shared mutable write. Use one
/// executor per unit of work.
pub struct SqlExecutor {
    pub(crate) factory: ObjectFactory,
    pub(crate) conn: OwnedConn,
    pub(crate) connection_string: Option<String>,
    pub(crate) params: ParamCollection,
    pub(crate) timeout: Option<Duration>,
    pub(crate) default_kind: CommandKind,
}

impl SqlExecutor {
    /// Executor that opens its own connection lazily from `connection_string`.
    pub fn new(factory: ObjectFactory, connection_string: impl Into<String>) -> Self {
        Self {
            factory,
            conn: OwnedConn::None,
            connection_string: Some(connection_string.into()),
            params: ParamCollection::new("@"),
            timeout: None,
            default_kind: CommandKind::Text,
        }
    }

    /// Executor over a caller-supplied connection. The connection is
    /// borrowed: the executor never closes it; reclaim it with
    /// [`SqlExecutor::detach_connection`].
    pub fn with_connection(factory: ObjectFactory, connection: Box<dyn DriverConnection>) -> Self {
        Self {
            factory,
            conn: OwnedConn::Attached(connection),
            connection_string: None,
            params: ParamCollection::new("@"),
            timeout: None,
            default_kind: CommandKind::Text,
        }
    }

    /// Override the binder prefix (default `@`). Clears the store, since
    /// existing names are qualified with the old prefix.
    #[must_use]
    pub fn with_binder(mut self, binder: &str) -> Self {
        self.params = ParamCollection::new(binder);
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn with_default_kind(mut self, kind: CommandKind) -> Self {
        self.default_kind = kind;
        self
    }

    #[must_use]
    pub fn factory(&self) -> &ObjectFactory {
        &self.factory
    }

    #[must_use]
    pub fn connection_string(&self) -> Option<&str> {
        self.connection_string.as_deref()
    }

    /// The executor's parameter store.
    #[must_use]
    pub fn params(&self) -> &ParamCollection {
        &self.params
    }

    /// Mutable access to the parameter store.
    pub fn params_mut(&mut self) -> &mut ParamCollection {
        &mut self.params
    }

    /// Take back a connection supplied via [`SqlExecutor::with_connection`],
    /// or the one the executor opened for itself.
    pub fn detach_connection(&mut self) -> Option<Box<dyn DriverConnection>> {
        match std::mem::replace(&mut self.conn, OwnedConn::None) {
            OwnedConn::None => None,
            OwnedConn::Owned(c) | OwnedConn::Attached(c) => Some(c),
        }
    }

    /// Start a fluent statement builder:
    /// ```rust,no_run
    /// # use sql_conduit::prelude::*;
    /// # fn demo(executor: &mut SqlExecutor) -> Result<(), SqlConduitError> {
    /// let rows = executor.query("SELECT id, name FROM users").select()?;
    /// # let _ = rows;
    /// # Ok(()) }
    /// ```
    pub fn query<'e, 'q>(&'e mut self, sql: &'q str) -> QueryBuilder<'e, 'q> {
        QueryBuilder::new(self, sql)
    }
}

impl Drop for SqlExecutor {
    fn drop(&mut self) {
        if let OwnedConn::Owned(conn) = &mut self.conn {
            let _ = conn.close();
        }
    }
}

/// Open the connection iff it is closed; already-open connections are left
/// alone, never reopened or errored on.
///
/// # Errors
/// Propagates the driver's open failure.
pub fn ensure_open(conn: &mut dyn DriverConnection) -> Result<(), SqlConduitError> {
    if conn.state() == crate::types::ConnectionState::Closed {
        conn.open()?;
    }
    Ok(())
}

/// Async variant of [`ensure_open`].
///
/// # Errors
/// `Cancelled` when the token fires first, otherwise the driver's error.
pub async fn ensure_open_async(
    conn: &mut dyn DriverConnection,
    cancel: &tokio_util::sync::CancellationToken,
) -> Result<(), SqlConduitError> {
    if conn.state() == crate::types::ConnectionState::Closed {
        conn.open_async(cancel).await?;
    }
    Ok(())
}
