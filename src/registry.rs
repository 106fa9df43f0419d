use std::sync::{Arc, OnceLock};

use tracing::debug;

use crate::config::ConnectorConfig;
use crate::connector::Connector;
use crate::error::SqlConnectorError;

/// Hands out connectors for one configured backend.
///
/// The registry is built once at startup and passed to whoever needs a connector.
/// [`shared`](ConnectorRegistry::shared) returns the same instance on every call;
/// [`new_instance`](ConnectorRegistry::new_instance) builds an isolated one with its own
/// connection and its own diagnostic log.
#[derive(Debug)]
pub struct ConnectorRegistry {
    config: ConnectorConfig,
    shared: OnceLock<Arc<Connector>>,
}

impl ConnectorRegistry {
    /// # Errors
    ///
    /// Returns `SqlConnectorError::ConfigError` if the configuration is incomplete.
    pub fn new(config: ConnectorConfig) -> Result<Self, SqlConnectorError> {
        config.validate()?;
        Ok(Self {
            config,
            shared: OnceLock::new(),
        })
    }

    #[must_use]
    pub fn config(&self) -> &ConnectorConfig {
        &self.config
    }

    /// The process-wide default connector, created on first call.
    #[must_use]
    pub fn shared(&self) -> Arc<Connector> {
        Arc::clone(self.shared.get_or_init(|| {
            debug!(db_type = ?self.config.db_type, "creating shared connector");
            Arc::new(self.build())
        }))
    }

    /// A connector independent of the shared one.
    #[must_use]
    pub fn new_instance(&self) -> Connector {
        self.build()
    }

    fn build(&self) -> Connector {
        Connector::from_validated(self.config.clone())
    }
}

#[cfg(all(test, feature = "sqlite"))]
mod tests {
    use super::*;
    use crate::types::DatabaseType;

    #[test]
    fn shared_is_one_instance() {
        let registry =
            ConnectorRegistry::new(ConnectorConfig::new(DatabaseType::Sqlite, ":memory:"))
                .expect("registry");
        let a = registry.shared();
        let b = registry.shared();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(Arc::strong_count(&a), 3);
    }

    #[test]
    fn rejects_incomplete_config() {
        let err = ConnectorRegistry::new(ConnectorConfig::new(DatabaseType::Sqlite, ""))
            .expect_err("empty database");
        assert!(matches!(err, SqlConnectorError::ConfigError(_)));
    }

    #[tokio::test]
    async fn new_instances_do_not_share_logs() {
        let registry =
            ConnectorRegistry::new(ConnectorConfig::new(DatabaseType::Sqlite, ":memory:"))
                .expect("registry");
        let shared = registry.shared();
        let isolated = registry.new_instance();
        shared.start_logging();
        assert!(!isolated.is_logging());
        assert_eq!(isolated.exec("CREATE TABLE t (id INTEGER)", &[]).await, 0);
        assert!(shared.flush_log().is_empty());
    }
}
