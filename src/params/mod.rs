//! Ordered, named parameter storage with binder-prefix semantics.

mod collection;
mod parameter;

pub use collection::ParamCollection;
pub use parameter::SqlParameter;
