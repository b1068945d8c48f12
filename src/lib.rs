//! Driver-agnostic SQL helpers: a named parameter store with binder-prefix
//! semantics, a provider object factory over a pluggable driver boundary, a
//! dynamic-row materializer with registration-time field bindings, and an
//! executor with consistent transaction and output-parameter behavior
//! across sync and async paths.

pub mod conduit;
pub mod error;
pub mod executor;
pub mod materialize;
pub mod params;
pub mod prelude;
pub mod provider;
pub mod results;
#[cfg(feature = "test-utils")]
pub mod test_utils;
pub mod types;

pub use conduit::SqlConduit;
pub use error::SqlConduitError;
