#![cfg(any(feature = "sqlite", feature = "turso"))]

mod common;

use common::{backends, banlist_connector, memory_connector};
use sql_connector::prelude::*;

async fn count(connector: &Connector) -> Option<i64> {
    connector
        .query("SELECT COUNT(*) AS n FROM banlist", &[], ResultFlags::ONE_ROW)
        .await
        .and_then(QueryResult::into_row)
        .and_then(|row| row.get("n").and_then(RowValues::as_int).copied())
}

#[tokio::test]
async fn commit_and_rollback() -> Result<(), SqlConnectorError> {
    for db in backends() {
        let connector = banlist_connector(db, 1).await?;

        assert!(connector.begin_transaction().await);
        connector
            .exec("INSERT INTO banlist (uuid) VALUES (?)", &[RowValues::Text("t1".into())])
            .await;
        assert!(connector.rollback().await, "{db:?}");
        assert_eq!(count(&connector).await, Some(1));

        assert!(connector.begin_transaction().await);
        connector
            .exec("INSERT INTO banlist (uuid) VALUES (?)", &[RowValues::Text("t2".into())])
            .await;
        assert!(connector.commit().await);
        assert_eq!(count(&connector).await, Some(2));
    }
    Ok(())
}

#[tokio::test]
async fn transaction_control_without_a_connection() -> Result<(), SqlConnectorError> {
    for db in backends() {
        let connector = memory_connector(db)?;
        assert!(!connector.commit().await);
        assert!(!connector.rollback().await);
        assert!(!connector.is_connected());

        // begin connects lazily.
        assert!(connector.begin_transaction().await);
        assert!(connector.is_connected());
        assert!(connector.commit().await, "{db:?}");
    }
    Ok(())
}
