use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::SqlConduitError;
use crate::types::{ConnectionState, IsolationLevel, SqlDataType, SqlValue};

use super::command::Command;

/// Entry point a backend driver implements to plug into the conduit.
///
/// Resolved at construction time from a provider name (see
/// [`crate::provider::register_provider`]), an existing connection, or a
/// factory instance handed in directly.
pub trait ProviderFactory: Send + Sync {
    /// Stable name this provider registers under (e.g. `"postgres"`).
    fn provider_name(&self) -> &str;

    /// Create a closed connection for the given connection string.
    ///
    /// # Errors
    /// Returns `SqlConduitError::Config` for an unusable connection string.
    fn create_connection(
        &self,
        connection_string: &str,
    ) -> Result<Box<dyn DriverConnection>, SqlConduitError>;

    /// Whether [`ProviderFactory::enumerate_data_sources`] is supported.
    fn supports_data_source_enumeration(&self) -> bool {
        false
    }

    /// List discoverable data sources, when the backend supports it.
    ///
    /// # Errors
    /// Returns `SqlConduitError::Config` when enumeration is unsupported.
    fn enumerate_data_sources(&self) -> Result<Vec<String>, SqlConduitError> {
        Err(SqlConduitError::Config(format!(
            "provider {} does not enumerate data sources",
            self.provider_name()
        )))
    }
}

/// A single backend connection.
///
/// Sync methods block the caller; async methods suspend at the driver I/O
/// call and honor the cancellation token mid-flight. The default async
/// implementations delegate to the sync ones after a fail-fast cancellation
/// check, which suits in-process backends.
#[async_trait]
pub trait DriverConnection: Send {
    fn state(&self) -> ConnectionState;

    /// Open the connection. Called only when the state is `Closed`.
    ///
    /// # Errors
    /// Returns `SqlConduitError::Execution` on connect failure.
    fn open(&mut self) -> Result<(), SqlConduitError>;

    /// Close the connection. Idempotent.
    ///
    /// # Errors
    /// Returns `SqlConduitError::Execution` on close failure.
    fn close(&mut self) -> Result<(), SqlConduitError>;

    /// Execute a non-query command, returning affected rows. Output and
    /// return parameters are written back into `command` before returning,
    /// best-effort even on failure.
    ///
    /// # Errors
    /// Returns the backend failure untranslated.
    fn execute(&mut self, command: &mut Command) -> Result<u64, SqlConduitError>;

    /// Execute a command and return a forward-only row cursor.
    ///
    /// # Errors
    /// Returns the backend failure untranslated.
    fn query(&mut self, command: &mut Command) -> Result<Box<dyn RowCursor>, SqlConduitError>;

    /// Execute a command and return the first column of the first row.
    ///
    /// # Errors
    /// Returns the backend failure untranslated.
    fn scalar(&mut self, command: &mut Command) -> Result<SqlValue, SqlConduitError>;

    /// Optimization hint that `sql` is about to run repeatedly. Drivers may
    /// ignore it.
    ///
    /// # Errors
    /// Returns the backend failure untranslated.
    fn prepare(&mut self, _sql: &str) -> Result<(), SqlConduitError> {
        Ok(())
    }

    /// Begin a transaction on this connection.
    ///
    /// # Errors
    /// Returns `SqlConduitError::Transaction` if one is already active or
    /// the backend refuses.
    fn begin(
        &mut self,
        isolation: IsolationLevel,
    ) -> Result<Box<dyn DriverTransaction>, SqlConduitError>;

    async fn open_async(&mut self, cancel: &CancellationToken) -> Result<(), SqlConduitError> {
        if cancel.is_cancelled() {
            return Err(SqlConduitError::Cancelled);
        }
        self.open()
    }

    async fn close_async(&mut self) -> Result<(), SqlConduitError> {
        self.close()
    }

    async fn execute_async(
        &mut self,
        command: &mut Command,
        cancel: &CancellationToken,
    ) -> Result<u64, SqlConduitError> {
        if cancel.is_cancelled() {
            return Err(SqlConduitError::Cancelled);
        }
        self.execute(command)
    }

    async fn query_async(
        &mut self,
        command: &mut Command,
        cancel: &CancellationToken,
    ) -> Result<Box<dyn RowCursor>, SqlConduitError> {
        if cancel.is_cancelled() {
            return Err(SqlConduitError::Cancelled);
        }
        self.query(command)
    }

    async fn scalar_async(
        &mut self,
        command: &mut Command,
        cancel: &CancellationToken,
    ) -> Result<SqlValue, SqlConduitError> {
        if cancel.is_cancelled() {
            return Err(SqlConduitError::Cancelled);
        }
        self.scalar(command)
    }

    async fn begin_async(
        &mut self,
        isolation: IsolationLevel,
        cancel: &CancellationToken,
    ) -> Result<Box<dyn DriverTransaction>, SqlConduitError> {
        if cancel.is_cancelled() {
            return Err(SqlConduitError::Cancelled);
        }
        self.begin(isolation)
    }
}

/// An open backend transaction.
///
/// Commit and rollback consume the handle's usefulness; a second completion
/// attempt is a `Transaction` error from the driver.
#[async_trait]
pub trait DriverTransaction: Send {
    /// # Errors
    /// Returns `SqlConduitError::Transaction` when commit fails or the
    /// transaction already completed.
    fn commit(&mut self) -> Result<(), SqlConduitError>;

    /// # Errors
    /// Returns `SqlConduitError::Transaction` when rollback fails or the
    /// transaction already completed.
    fn rollback(&mut self) -> Result<(), SqlConduitError>;

    async fn commit_async(&mut self, cancel: &CancellationToken) -> Result<(), SqlConduitError> {
        if cancel.is_cancelled() {
            return Err(SqlConduitError::Cancelled);
        }
        self.commit()
    }

    async fn rollback_async(&mut self) -> Result<(), SqlConduitError> {
        self.rollback()
    }
}

/// Forward-only row cursor produced by [`DriverConnection::query`].
#[async_trait]
pub trait RowCursor: Send {
    /// Column names, shared with every row this cursor produces.
    fn columns(&self) -> Arc<Vec<String>>;

    /// Advance to the next row; `None` when exhausted. Single-pass.
    ///
    /// # Errors
    /// Returns the backend failure untranslated.
    fn next_row(&mut self) -> Result<Option<Vec<SqlValue>>, SqlConduitError>;

    /// Release the cursor. Idempotent.
    ///
    /// # Errors
    /// Returns the backend failure untranslated.
    fn close(&mut self) -> Result<(), SqlConduitError> {
        Ok(())
    }

    async fn next_row_async(
        &mut self,
        cancel: &CancellationToken,
    ) -> Result<Option<Vec<SqlValue>>, SqlConduitError> {
        if cancel.is_cancelled() {
            return Err(SqlConduitError::Cancelled);
        }
        self.next_row()
    }
}

/// Optional collaborator that infers a backend type tag from a runtime
/// value when the caller supplies none.
pub trait TypeMapper: Send + Sync {
    fn map_value(&self, value: &SqlValue) -> Option<SqlDataType>;
}

/// Maps each value variant straight to its tag; NULL maps to nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultTypeMapper;

impl TypeMapper for DefaultTypeMapper {
    fn map_value(&self, value: &SqlValue) -> Option<SqlDataType> {
        match value {
            SqlValue::Int(_) => Some(SqlDataType::Int),
            SqlValue::Float(_) => Some(SqlDataType::Float),
            SqlValue::Text(_) => Some(SqlDataType::Text),
            SqlValue::Bool(_) => Some(SqlDataType::Bool),
            SqlValue::Timestamp(_) => Some(SqlDataType::Timestamp),
            SqlValue::Json(_) => Some(SqlDataType::Json),
            SqlValue::Blob(_) => Some(SqlDataType::Blob),
            SqlValue::Null => None,
        }
    }
}
