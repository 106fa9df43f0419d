use thiserror::Error;

#[cfg(feature = "sqlite")]
use rusqlite;
#[cfg(feature = "turso")]
use turso;

use crate::statement::StatementState;

/// Operational failures: bad SQL, constraint violations, bind failures, lost connections.
///
/// The sentinel-returning calls (`query`, `exec`, `prepare`, ...) swallow these into
/// `None`/`0`/`false`; the `try_*` variants hand them back.
#[derive(Debug, Error)]
pub enum SqlConnectorError {
    #[cfg(feature = "sqlite")]
    #[error(transparent)]
    SqliteError(#[from] rusqlite::Error),

    #[cfg(feature = "turso")]
    #[error(transparent)]
    TursoError(#[from] turso::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Parameter conversion error: {0}")]
    ParameterError(String),

    #[error("SQL execution error: {0}")]
    ExecutionError(String),

    #[error("Other database error: {0}")]
    Other(String),
}

/// A statement method was called in a state that does not permit it.
///
/// This is a programmer error, never a database failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("`{operation}` is not allowed while the statement is {state:?}: {hint}")]
pub struct ContractViolation {
    pub operation: &'static str,
    pub state: StatementState,
    pub hint: &'static str,
}

impl ContractViolation {
    pub(crate) fn new(operation: &'static str, state: StatementState) -> Self {
        let hint = match state {
            StatementState::Ready => "call execute() before fetching a result",
            StatementState::Result | StatementState::ResultEnd => {
                "call reset() before reusing a statement"
            }
        };
        Self {
            operation,
            state,
            hint,
        }
    }
}

/// Rejected legacy flag bitset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FlagsError {
    #[error("unknown result flag bits: {0:#x}")]
    UnknownBits(u8),
    #[error("conflicting result shape bits: {0:#x}")]
    ConflictingShape(u8),
}
