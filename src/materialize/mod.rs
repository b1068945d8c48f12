//! Projection of dynamic rows onto strongly-typed structs.
//!
//! Target types register their field bindings once (a [`RowMapping`]) and
//! the projection functions apply them per row; there is no runtime
//! reflection. See [`FromRow`] for the registration seam.

mod convert;
mod mapping;
mod project;

pub use convert::FromSqlValue;
pub use mapping::{FromRow, RowMapping};
pub use project::{project, project_list, project_single, project_with};
