use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDateTime;
use tokio_util::sync::CancellationToken;

use crate::error::SqlConduitError;
use crate::params::{ParamCollection, SqlParameter};
use crate::types::{CommandKind, IsolationLevel, ParamDirection, SqlDataType, SqlValue};

use super::command::Command;
use super::traits::{DriverConnection, DriverTransaction, ProviderFactory, TypeMapper};

/// Creates driver objects uniformly regardless of backend.
///
/// Wraps a resolved [`ProviderFactory`] and applies the provider-neutral
/// construction rules: date-sentinel normalization, type-tag inference
/// through an optional [`TypeMapper`], and variable-size inference.
#[derive(Clone)]
pub struct ObjectFactory {
    provider: Arc<dyn ProviderFactory>,
    type_mapper: Option<Arc<dyn TypeMapper>>,
}

impl ObjectFactory {
    pub fn new(provider: Arc<dyn ProviderFactory>) -> Self {
        Self {
            provider,
            type_mapper: None,
        }
    }

    /// Attach a type mapper consulted when no explicit type tag is given.
    #[must_use]
    pub fn with_type_mapper(mut self, mapper: Arc<dyn TypeMapper>) -> Self {
        self.type_mapper = Some(mapper);
        self
    }

    #[must_use]
    pub fn provider(&self) -> &Arc<dyn ProviderFactory> {
        &self.provider
    }

    /// Build a parameter, normalizing sentinel timestamps to NULL.
    ///
    /// Backends reject the minimum/maximum representable date-time, so a
    /// value that stringifies to either sentinel is replaced with NULL.
    /// When no type tag is supplied and a type mapper is configured, the
    /// tag is inferred from the runtime value.
    pub fn create_parameter(
        &self,
        name: &str,
        value: impl Into<SqlValue>,
        data_type: Option<SqlDataType>,
        direction: ParamDirection,
    ) -> SqlParameter {
        let value = normalize_sentinel(value.into());
        let inferred = data_type.or_else(|| {
            self.type_mapper
                .as_ref()
                .and_then(|mapper| mapper.map_value(&value))
        });
        let mut param = SqlParameter::new(name, value).with_direction(direction);
        param.set_data_type(inferred);
        param
    }

    /// Build a variable-size parameter (string/binary).
    ///
    /// Output parameters must declare a size up front; input string and
    /// binary values with no explicit size get one inferred from the
    /// value's length.
    ///
    /// # Errors
    /// `InvalidArgument` when `direction` is output-like and `size` is
    /// `None`.
    pub fn create_variable_size_parameter(
        &self,
        name: &str,
        value: impl Into<SqlValue>,
        data_type: Option<SqlDataType>,
        direction: ParamDirection,
        size: Option<usize>,
    ) -> Result<SqlParameter, SqlConduitError> {
        let mut param = self.create_parameter(name, value, data_type, direction);
        let resolved = match size {
            Some(explicit) => Some(explicit),
            None => {
                if param.is_output() {
                    return Err(SqlConduitError::InvalidArgument(format!(
                        "output parameter {name} requires an explicit size"
                    )));
                }
                match param.value() {
                    SqlValue::Text(s) => Some(s.chars().count()),
                    SqlValue::Blob(b) => Some(b.len()),
                    _ => None,
                }
            }
        };
        if let Some(size) = resolved {
            param = param.with_size(size);
        }
        Ok(param)
    }

    /// Assemble a command descriptor from query text, kind, the parameter
    /// store (in insertion order), timeout, and transaction membership.
    #[must_use]
    pub fn create_command(
        &self,
        kind: CommandKind,
        text: &str,
        params: &ParamCollection,
        timeout: Option<Duration>,
        transactional: bool,
    ) -> Command {
        Command::new(
            kind,
            text.to_owned(),
            params.as_slice().to_vec(),
            timeout,
            transactional,
        )
    }

    /// Command variant for batch units that carry their own parameters.
    #[must_use]
    pub fn create_command_with_params(
        &self,
        kind: CommandKind,
        text: &str,
        params: Vec<SqlParameter>,
        timeout: Option<Duration>,
        transactional: bool,
    ) -> Command {
        Command::new(kind, text.to_owned(), params, timeout, transactional)
    }

    /// Create a closed connection for `connection_string`.
    ///
    /// # Errors
    /// Propagates the provider's `Config` error for bad strings.
    pub fn create_connection(
        &self,
        connection_string: &str,
    ) -> Result<Box<dyn DriverConnection>, SqlConduitError> {
        self.provider.create_connection(connection_string)
    }

    /// Begin a transaction on `conn`.
    ///
    /// # Errors
    /// Propagates the driver's `Transaction` error.
    pub fn create_transaction(
        &self,
        conn: &mut dyn DriverConnection,
        isolation: IsolationLevel,
    ) -> Result<Box<dyn DriverTransaction>, SqlConduitError> {
        conn.begin(isolation)
    }

    /// Async variant of [`ObjectFactory::create_transaction`].
    ///
    /// # Errors
    /// `Cancelled` when the token fires first; otherwise the driver's error.
    pub async fn create_transaction_async(
        &self,
        conn: &mut dyn DriverConnection,
        isolation: IsolationLevel,
        cancel: &CancellationToken,
    ) -> Result<Box<dyn DriverTransaction>, SqlConduitError> {
        conn.begin_async(isolation, cancel).await
    }
}

fn normalize_sentinel(value: SqlValue) -> SqlValue {
    match value {
        SqlValue::Timestamp(dt) if dt == NaiveDateTime::MIN || dt == NaiveDateTime::MAX => {
            SqlValue::Null
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinel_timestamps_become_null() {
        assert_eq!(
            normalize_sentinel(SqlValue::Timestamp(NaiveDateTime::MIN)),
            SqlValue::Null
        );
        assert_eq!(
            normalize_sentinel(SqlValue::Timestamp(NaiveDateTime::MAX)),
            SqlValue::Null
        );
        let ts = NaiveDateTime::parse_from_str("2024-05-01 10:00:00", "%Y-%m-%d %H:%M:%S").unwrap();
        assert_eq!(
            normalize_sentinel(SqlValue::Timestamp(ts)),
            SqlValue::Timestamp(ts)
        );
    }
}
