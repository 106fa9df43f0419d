//! Convenient imports for common functionality.

pub use crate::config::{ConnectorConfig, ConnectorConfigBuilder};
pub use crate::connector::Connector;
pub use crate::diagnostics::LogEntry;
pub use crate::error::{ContractViolation, SqlConnectorError};
pub use crate::flags::{Keying, ResultFlags, Shape};
pub use crate::registry::ConnectorRegistry;
pub use crate::results::{QueryResult, Row};
pub use crate::statement::{Statement, StatementState};
pub use crate::types::{DatabaseType, RowValues};
