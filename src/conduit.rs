use std::sync::Arc;

use crate::error::SqlConduitError;
use crate::executor::{QueryBuilder, SqlExecutor};
use crate::params::SqlParameter;
use crate::provider::{DriverConnection, ObjectFactory, ProviderFactory, resolve_provider};
use crate::types::SqlValue;

/// One cohesive entry point over the executor, the parameter store, and
/// provider resolution.
///
/// ```rust,no_run
/// use sql_conduit::prelude::*;
///
/// # fn demo() -> Result<(), SqlConduitError> {
/// let mut db = SqlConduit::from_provider_name("memory", "mem://demo")?;
/// db.add_param("id", 5)?;
/// let rows = db.query("SELECT id, name FROM users WHERE id = @id").select()?;
/// # let _ = rows;
/// # Ok(()) }
/// ```
pub struct SqlConduit {
    executor: SqlExecutor,
}

impl SqlConduit {
    /// Resolve the provider from the global registry by name.
    ///
    /// # Errors
    /// `Config` for an unknown provider name.
    pub fn from_provider_name(
        provider_name: &str,
        connection_string: impl Into<String>,
    ) -> Result<Self, SqlConduitError> {
        let provider = resolve_provider(provider_name)?;
        Ok(Self::from_factory(provider, connection_string))
    }

    /// Build directly over a factory instance.
    pub fn from_factory(
        provider: Arc<dyn ProviderFactory>,
        connection_string: impl Into<String>,
    ) -> Self {
        Self {
            executor: SqlExecutor::new(ObjectFactory::new(provider), connection_string),
        }
    }

    /// Build over an existing connection. The connection is borrowed: it is
    /// never closed here and can be reclaimed through
    /// [`SqlConduit::into_executor`] and
    /// [`SqlExecutor::detach_connection`].
    pub fn from_connection(
        provider: Arc<dyn ProviderFactory>,
        connection: Box<dyn DriverConnection>,
    ) -> Self {
        Self {
            executor: SqlExecutor::with_connection(ObjectFactory::new(provider), connection),
        }
    }

    #[must_use]
    pub fn connection_string(&self) -> Option<&str> {
        self.executor.connection_string()
    }

    #[must_use]
    pub fn executor(&self) -> &SqlExecutor {
        &self.executor
    }

    pub fn executor_mut(&mut self) -> &mut SqlExecutor {
        &mut self.executor
    }

    #[must_use]
    pub fn into_executor(self) -> SqlExecutor {
        self.executor
    }

    /// Add a named parameter to the store.
    ///
    /// # Errors
    /// As [`crate::params::ParamCollection::add`].
    pub fn add_param(
        &mut self,
        name: &str,
        value: impl Into<SqlValue>,
    ) -> Result<(), SqlConduitError> {
        self.executor.params_mut().add(name, value)?;
        Ok(())
    }

    /// Add a batch of parameters, all-or-nothing.
    ///
    /// # Errors
    /// As [`crate::params::ParamCollection::add_range`].
    pub fn add_params(
        &mut self,
        params: impl IntoIterator<Item = SqlParameter>,
    ) -> Result<(), SqlConduitError> {
        self.executor.params_mut().add_range(params)
    }

    /// Update a stored parameter's value in place.
    ///
    /// # Errors
    /// As [`crate::params::ParamCollection::set_value`].
    pub fn set_param_value(
        &mut self,
        name: &str,
        value: impl Into<SqlValue>,
    ) -> Result<(), SqlConduitError> {
        self.executor.params_mut().set_value(name, value)
    }

    /// Read a stored parameter, typically to fetch an output value after
    /// execution.
    ///
    /// # Errors
    /// As [`crate::params::ParamCollection::get`].
    pub fn param(&self, name: &str) -> Result<Option<&SqlParameter>, SqlConduitError> {
        self.executor.params().get(name)
    }

    /// Clear the parameter store.
    pub fn clear_params(&mut self) {
        self.executor.params_mut().clear();
    }

    /// Start a fluent statement builder on the underlying executor.
    pub fn query<'e, 'q>(&'e mut self, sql: &'q str) -> QueryBuilder<'e, 'q> {
        self.executor.query(sql)
    }
}
