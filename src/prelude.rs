//! Convenient imports for common functionality.
//!
//! This module re-exports the most commonly used types and functions
//! to make it easier to get started with the library.

pub use crate::conduit::SqlConduit;
pub use crate::error::SqlConduitError;
pub use crate::executor::{
    CursorGuard, QueryAndParams, QueryBuilder, QueryTarget, SqlExecutor, TransactedOptions,
    TypedRows, TypedStream, ensure_open, ensure_open_async,
};
pub use crate::materialize::{
    FromRow, FromSqlValue, RowMapping, project, project_list, project_single, project_with,
};
pub use crate::params::{ParamCollection, SqlParameter};
pub use crate::provider::{
    Command, DefaultTypeMapper, DriverConnection, DriverTransaction, ObjectFactory,
    ProviderFactory, RowCursor, TypeMapper, register_provider, resolve_provider,
};
pub use crate::results::{DynamicRow, ResultSet, RowIter, buffer_cursor, buffer_cursor_async};
pub use crate::types::{
    CommandKind, ConnectionState, IsolationLevel, ParamDirection, SqlDataType, SqlValue,
};
