// SQLite backend: the buffered-native adapter.
//
// - config: opening the database and running work on the blocking pool
// - params: explicit parameter classification (i/d/s)
// - query: value extraction and rowset buffering
// - prepared: the prepared handle driven by `Statement`
// - connection: the `DriverConnection` implementation

pub mod config;
pub mod connection;
pub mod params;
pub mod prepared;
pub mod query;

pub use connection::SqliteConnection;
pub use params::{ParamKind, Params};
pub use prepared::SqlitePrepared;
