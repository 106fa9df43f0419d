#![cfg(any(feature = "sqlite", feature = "turso"))]

mod common;

use common::{backends, memory_connector};
use sql_connector::prelude::*;

#[tokio::test]
async fn multi_row_inserts_report_every_row() -> Result<(), Box<dyn std::error::Error>> {
    for db in backends() {
        let connector = memory_connector(db)?;
        assert_eq!(connector.try_exec("CREATE TABLE t (a INTEGER)", &[]).await?, 0);

        let bound = connector
            .try_exec("INSERT INTO t VALUES (?), (?)", &[RowValues::Int(3), RowValues::Int(4)])
            .await?;
        assert_eq!(bound, 2, "{db:?}");
        assert_eq!(connector.try_exec("INSERT INTO t VALUES (5), (6)", &[]).await?, 2, "{db:?}");
        assert_eq!(connector.try_exec("INSERT INTO t SELECT a FROM t", &[]).await?, 4, "{db:?}");

        let mut stmt = connector
            .try_prepare("INSERT INTO t SELECT a FROM t WHERE a > ?", ResultFlags::default())
            .await?;
        assert!(stmt.execute(&[RowValues::Int(4)]).await?);
        assert_eq!(stmt.row_count().await?, 4, "{db:?}");
        assert!(stmt.close().await);
    }
    Ok(())
}

#[tokio::test]
async fn ddl_does_not_repeat_the_previous_count() -> Result<(), Box<dyn std::error::Error>> {
    for db in backends() {
        let connector = memory_connector(db)?;
        connector.try_exec("CREATE TABLE t (a INTEGER)", &[]).await?;
        assert_eq!(connector.try_exec("INSERT INTO t VALUES (1), (2), (3)", &[]).await?, 3);

        assert_eq!(connector.try_exec("CREATE TABLE u (b INTEGER)", &[]).await?, 0, "{db:?}");
        assert_eq!(connector.exec("UPDATE t SET a = 0 WHERE a > 9", &[]).await, 0, "{db:?}");
        assert_eq!(connector.exec("UPDATE t SET a = a + 1 WHERE a > 1", &[]).await, 2, "{db:?}");
    }
    Ok(())
}
