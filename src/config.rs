use serde::{Deserialize, Serialize};

use crate::connector::Connector;
use crate::error::SqlConnectorError;
use crate::types::DatabaseType;

/// Connection settings, supplied once at process start and read-only afterwards.
///
/// For the embedded engines `database` is the database path (`":memory:"` works).
/// `host` and the credentials are part of the configuration surface but neither
/// embedded engine uses them.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectorConfig {
    pub db_type: DatabaseType,
    #[serde(default)]
    pub host: Option<String>,
    pub database: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

impl std::fmt::Debug for ConnectorConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectorConfig")
            .field("db_type", &self.db_type)
            .field("host", &self.host)
            .field("database", &self.database)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl ConnectorConfig {
    #[must_use]
    pub fn new(db_type: DatabaseType, database: impl Into<String>) -> Self {
        Self {
            db_type,
            host: None,
            database: database.into(),
            username: None,
            password: None,
        }
    }

    #[must_use]
    pub fn builder(db_type: DatabaseType, database: impl Into<String>) -> ConnectorConfigBuilder {
        ConnectorConfigBuilder::new(db_type, database)
    }

    /// Check required fields.
    ///
    /// # Errors
    /// Returns `SqlConnectorError::ConfigError` if `database` is empty.
    pub fn validate(&self) -> Result<(), SqlConnectorError> {
        if self.database.trim().is_empty() {
            return Err(SqlConnectorError::ConfigError(
                "database is required".to_string(),
            ));
        }
        Ok(())
    }

    /// True when settings only meaningful to a networked server were supplied.
    pub(crate) fn has_server_settings(&self) -> bool {
        self.host.is_some() || self.username.is_some() || self.password.is_some()
    }
}

/// Fluent builder for [`ConnectorConfig`].
#[derive(Debug, Clone)]
pub struct ConnectorConfigBuilder {
    config: ConnectorConfig,
}

impl ConnectorConfigBuilder {
    #[must_use]
    pub fn new(db_type: DatabaseType, database: impl Into<String>) -> Self {
        Self {
            config: ConnectorConfig::new(db_type, database),
        }
    }

    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = Some(host.into());
        self
    }

    #[must_use]
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.config.username = Some(username.into());
        self
    }

    #[must_use]
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.config.password = Some(password.into());
        self
    }

    #[must_use]
    pub fn finish(self) -> ConnectorConfig {
        self.config
    }

    /// Build a [`Connector`]. No connection is opened until the first operation.
    ///
    /// # Errors
    ///
    /// Returns `SqlConnectorError::ConfigError` if the configuration is incomplete.
    pub fn build(self) -> Result<Connector, SqlConnectorError> {
        Connector::new(self.finish())
    }
}

#[cfg(all(test, feature = "sqlite"))]
mod tests {
    use super::*;

    #[test]
    fn builder_sets_every_field() {
        let cfg = ConnectorConfig::builder(DatabaseType::Sqlite, "bans.db")
            .host("localhost")
            .username("slbans")
            .password("hunter2")
            .finish();
        assert_eq!(cfg.host.as_deref(), Some("localhost"));
        assert_eq!(cfg.username.as_deref(), Some("slbans"));
        assert!(cfg.has_server_settings());
        assert!(!format!("{cfg:?}").contains("hunter2"));
    }

    #[test]
    fn empty_database_is_rejected() {
        let cfg = ConnectorConfig::new(DatabaseType::Sqlite, " ");
        assert!(matches!(
            cfg.validate(),
            Err(SqlConnectorError::ConfigError(_))
        ));
    }

    #[test]
    fn deserializes_with_optional_fields_missing() {
        let cfg: ConnectorConfig =
            serde_json::from_str(r#"{"db_type": "sqlite", "database": ":memory:"}"#)
                .expect("config json");
        assert_eq!(cfg, ConnectorConfig::new(DatabaseType::Sqlite, ":memory:"));
    }
}
