// Turso backend: the library-managed adapter.
//
// - config: opening the local database
// - params: parameter conversion (blobs bind natively)
// - query: value conversion and cursor reads
// - prepared: the prepared handle driven by `Statement`
// - connection: the `DriverConnection` implementation

pub mod config;
pub mod connection;
pub mod params;
pub mod prepared;
pub mod query;

pub use connection::TursoConnection;
pub use params::Params;
pub use prepared::TursoPrepared;
