//! Driver-agnostic SQL connector.
//!
//! A [`Connector`] owns one lazily opened connection and offers one-shot
//! [`query`](Connector::query)/[`exec`](Connector::exec) calls, reusable [`Statement`]s with
//! an explicit `Ready → Result → ResultEnd` lifecycle, transaction control and an
//! in-memory diagnostic log. Results are shaped by [`ResultFlags`]: one row, every row,
//! or decided by the data, with rows keyed by position, by column name, or both.
//!
//! Two backends sit behind the same surface:
//! - `sqlite` (rusqlite): every rowset is buffered client-side when its statement runs.
//! - `turso`: rows stay in the library's cursor until fetched.

pub mod adapter;
pub mod config;
pub mod connector;
pub mod diagnostics;
pub mod error;
pub mod flags;
pub mod prelude;
pub mod registry;
pub mod results;
pub mod script;
pub mod statement;
pub mod types;

#[cfg(feature = "sqlite")]
pub mod sqlite;
#[cfg(feature = "turso")]
pub mod turso;

pub use config::{ConnectorConfig, ConnectorConfigBuilder};
pub use connector::Connector;
pub use diagnostics::{LogEntry, Step};
pub use error::{ContractViolation, FlagsError, SqlConnectorError};
pub use flags::{Keying, ResultFlags, Shape};
pub use registry::ConnectorRegistry;
pub use results::{ColumnSet, QueryResult, Row};
pub use script::Script;
pub use statement::{Statement, StatementState};
pub use types::{DatabaseType, RowValues};
