//! The pluggable driver boundary and the object factory built on top of it.
//!
//! Backends live entirely behind these traits; the rest of the crate never
//! names a concrete driver.

mod command;
mod factory;
mod registry;
mod traits;

pub use command::Command;
pub use factory::ObjectFactory;
pub use registry::{register_provider, resolve_provider};
pub use traits::{
    DefaultTypeMapper, DriverConnection, DriverTransaction, ProviderFactory, RowCursor, TypeMapper,
};
