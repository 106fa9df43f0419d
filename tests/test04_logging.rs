#![cfg(any(feature = "sqlite", feature = "turso"))]

mod common;

use common::{backends, banlist_connector, memory_connector};
use sql_connector::prelude::*;

#[tokio::test]
async fn one_entry_per_operation_in_call_order() -> Result<(), SqlConnectorError> {
    for db in backends() {
        let connector = banlist_connector(db, 2).await?;
        connector.start_logging();
        assert!(connector.is_logging());

        connector
            .query(
                "SELECT uuid FROM banlist WHERE deleted = ?",
                &[RowValues::Int(0)],
                ResultFlags::MANY_ROWS,
            )
            .await;
        connector
            .exec(
                "UPDATE banlist SET deleted = 1 WHERE uuid = ?",
                &[RowValues::Text("u0".into())],
            )
            .await;

        let entries = connector.flush_log();
        let ops: Vec<&str> = entries.iter().map(|e| e.operation.as_str()).collect();
        assert_eq!(ops, vec!["query", "exec"], "{db:?}");
        assert_eq!(entries[0].payload["outcome"]["rows"], 2);
        assert_eq!(entries[1].payload["outcome"], 1);
        assert!(entries[1].payload["steps"].is_array());

        assert!(connector.flush_log().is_empty());
    }
    Ok(())
}

#[tokio::test]
async fn failures_are_logged_with_their_step() -> Result<(), SqlConnectorError> {
    for db in backends() {
        let connector = banlist_connector(db, 0).await?;
        connector.start_logging();
        assert_eq!(connector.exec("DELETE FROM missing_table", &[]).await, 0);

        let entries = connector.flush_log();
        assert_eq!(entries.len(), 1);
        assert!(entries[0].payload["outcome"]["error"].is_string(), "{db:?}");
        let failed_steps = entries[0].payload["steps"]
            .as_array()
            .map(|steps| steps.iter().filter(|s| !s["error"].is_null()).count());
        assert_eq!(failed_steps, Some(1));
    }
    Ok(())
}

#[tokio::test]
async fn connect_is_part_of_the_first_operation() -> Result<(), SqlConnectorError> {
    for db in backends() {
        let connector = memory_connector(db)?;
        connector.start_logging();
        connector.exec("CREATE TABLE t (id INTEGER)", &[]).await;
        connector.exec("INSERT INTO t VALUES (1)", &[]).await;

        let entries = connector.flush_log();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].payload["steps"][0]["name"], "connect");
        assert_ne!(entries[1].payload["steps"][0]["name"], "connect");
    }
    Ok(())
}

#[tokio::test]
async fn statements_log_through_their_connector() -> Result<(), Box<dyn std::error::Error>> {
    for db in backends() {
        let connector = banlist_connector(db, 1).await?;
        connector.start_logging();
        let mut stmt = connector
            .try_prepare("SELECT uuid FROM banlist", ResultFlags::MANY_ROWS)
            .await?;
        stmt.execute(&[]).await?;
        stmt.rows().await?;
        stmt.reset().await;

        let ops: Vec<String> = connector
            .flush_log()
            .into_iter()
            .map(|e| e.operation)
            .collect();
        assert_eq!(ops, vec!["prepare", "execute", "rows", "reset"], "{db:?}");

        connector.stop_logging();
        assert!(stmt.execute(&[]).await?);
        assert!(connector.flush_log().is_empty());
    }
    Ok(())
}

#[cfg(feature = "sqlite")]
#[tokio::test]
async fn sqlite_logs_parameter_type_codes() -> Result<(), SqlConnectorError> {
    let connector = banlist_connector(DatabaseType::Sqlite, 0).await?;
    connector.start_logging();
    connector
        .exec(
            "INSERT INTO banlist (id, uuid, reason) VALUES (?, ?, ?)",
            &[
                RowValues::Int(10),
                RowValues::Text("x".into()),
                RowValues::Null,
            ],
        )
        .await;
    let entries = connector.flush_log();
    let bind = entries[0].payload["steps"]
        .as_array()
        .and_then(|steps| steps.iter().find(|s| s["name"] == "bind_param"))
        .cloned();
    assert_eq!(
        bind.map(|s| s["detail"].clone()),
        Some(serde_json::json!(["isi"]))
    );
    Ok(())
}
