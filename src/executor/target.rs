use crate::provider::DriverConnection;

/// Where a statement runs.
///
/// `Own` uses the executor's connection (opened lazily from its connection
/// string). `Connection` borrows a caller-managed connection, which is
/// never closed here. `ConnectionString` opens a fresh connection scoped to
/// the one call and guarantees it is closed on every exit path.
pub enum QueryTarget<'a> {
    Own,
    Connection(&'a mut dyn DriverConnection),
    ConnectionString(&'a str),
}

impl<'a> From<&'a mut dyn DriverConnection> for QueryTarget<'a> {
    fn from(conn: &'a mut dyn DriverConnection) -> Self {
        QueryTarget::Connection(conn)
    }
}
