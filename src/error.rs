use thiserror::Error;

/// Error taxonomy for the conduit.
///
/// Backend failures surface as [`SqlConduitError::Execution`] without
/// translation; local validation errors (duplicate names, bad indices,
/// empty names) are raised before any I/O happens.
#[derive(Debug, Error)]
pub enum SqlConduitError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Duplicate parameter name: {0}")]
    DuplicateParameter(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Index out of range: {0}")]
    IndexOutOfRange(String),

    #[error("Type conversion error: {0}")]
    TypeConversion(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Backend execution error: {0}")]
    Execution(String),

    #[error("Transaction error: {0}")]
    Transaction(String),

    /// Rollback after a failed execution itself failed. Both errors are
    /// kept so neither masks the other.
    #[error("Rollback failed ({rollback}) while handling: {original}")]
    RollbackFailed {
        original: Box<SqlConduitError>,
        rollback: Box<SqlConduitError>,
    },
}

impl SqlConduitError {
    /// Wrap an execution failure and the rollback failure it triggered.
    #[must_use]
    pub fn rollback_failed(original: SqlConduitError, rollback: SqlConduitError) -> Self {
        SqlConduitError::RollbackFailed {
            original: Box::new(original),
            rollback: Box::new(rollback),
        }
    }
}
