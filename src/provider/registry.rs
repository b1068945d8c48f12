use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use lazy_static::lazy_static;

use crate::error::SqlConduitError;

use super::traits::ProviderFactory;

lazy_static! {
    static ref PROVIDERS: RwLock<HashMap<String, Arc<dyn ProviderFactory>>> =
        RwLock::new(HashMap::new());
}

/// Register a provider under a case-insensitive name. Re-registering a name
/// replaces the previous factory.
pub fn register_provider(name: &str, factory: Arc<dyn ProviderFactory>) {
    let mut providers = match PROVIDERS.write() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    providers.insert(name.to_lowercase(), factory);
}

/// Resolve a registered provider by name.
///
/// # Errors
/// Returns `SqlConduitError::Config` for an unknown provider name.
pub fn resolve_provider(name: &str) -> Result<Arc<dyn ProviderFactory>, SqlConduitError> {
    let providers = match PROVIDERS.read() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    providers
        .get(&name.to_lowercase())
        .cloned()
        .ok_or_else(|| SqlConduitError::Config(format!("no provider registered as {name}")))
}
