use std::time::Duration;

use crate::provider::DriverConnection;
use crate::types::CommandKind;

use super::SqlExecutor;
use super::target::QueryTarget;

/// Fluent per-statement builder.
///
/// Parameters come from the executor's store; the builder only adjusts the
/// statement-local knobs (kind, timeout, target) before a terminal
/// operation executes it.
pub struct QueryBuilder<'e, 'q> {
    pub(crate) executor: &'e mut SqlExecutor,
    pub(crate) sql: &'q str,
    pub(crate) kind: Option<CommandKind>,
    pub(crate) timeout: Option<Duration>,
    pub(crate) target: QueryTarget<'e>,
}

impl<'e, 'q> QueryBuilder<'e, 'q> {
    pub(crate) fn new(executor: &'e mut SqlExecutor, sql: &'q str) -> Self {
        Self {
            executor,
            sql,
            kind: None,
            timeout: None,
            target: QueryTarget::Own,
        }
    }

    /// Override the command kind for this statement.
    #[must_use]
    pub fn kind(mut self, kind: CommandKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Override the command timeout for this statement.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Run against a caller-managed connection (never closed here).
    #[must_use]
    pub fn on_connection(mut self, conn: &'e mut dyn DriverConnection) -> Self {
        self.target = QueryTarget::Connection(conn);
        self
    }

    /// Run against a fresh scoped connection opened from this string and
    /// closed on every exit path.
    #[must_use]
    pub fn on_connection_string(mut self, connection_string: &'e str) -> Self {
        self.target = QueryTarget::ConnectionString(connection_string);
        self
    }

    pub(crate) fn effective_kind(&self) -> CommandKind {
        self.kind.unwrap_or(self.executor.default_kind)
    }

    pub(crate) fn effective_timeout(&self) -> Option<Duration> {
        self.timeout.or(self.executor.timeout)
    }
}
