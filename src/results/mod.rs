//! Driver-agnostic query results: dynamic rows, buffered result sets, and
//! the lazy cursor adapter.

mod result_set;
mod row;
mod stream;

pub use result_set::ResultSet;
pub use row::DynamicRow;
pub use stream::{RowIter, buffer_cursor, buffer_cursor_async};
