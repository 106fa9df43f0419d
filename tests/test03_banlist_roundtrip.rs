#![cfg(any(feature = "sqlite", feature = "turso"))]

mod common;

use common::{backends, banlist_connector, text_of};
use sql_connector::prelude::*;

const SOFT_DELETE: &str = "UPDATE banlist SET deleted = 1, modified = ? WHERE uuid = ?";

fn soft_delete_params(uuid: &str) -> [RowValues; 2] {
    [
        RowValues::Text("2024-05-01 10:00:00".into()),
        RowValues::Text(uuid.into()),
    ]
}

#[tokio::test]
async fn soft_delete_then_read_back() -> Result<(), SqlConnectorError> {
    for db in backends() {
        let connector = banlist_connector(db, 2).await?;

        assert_eq!(connector.exec(SOFT_DELETE, &soft_delete_params("u1")).await, 1, "{db:?}");
        assert_eq!(connector.exec(SOFT_DELETE, &soft_delete_params("nobody")).await, 0);

        let row = connector
            .query(
                "SELECT uuid FROM banlist WHERE deleted = 1",
                &[],
                ResultFlags::ONE_ROW,
            )
            .await
            .and_then(QueryResult::into_row)
            .expect("deleted row");
        assert_eq!(text_of(&row, "uuid").as_deref(), Some("u1"));

        let active = connector
            .query(
                "SELECT uuid FROM banlist WHERE deleted = ?",
                &[RowValues::Bool(false)],
                ResultFlags::MANY_ROWS.with_keying(Keying::Positional),
            )
            .await
            .and_then(QueryResult::into_rows)
            .expect("active rows");
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].get_by_index(0), Some(&RowValues::Text("u0".into())));
    }
    Ok(())
}

#[tokio::test]
async fn typed_values_round_trip() -> Result<(), SqlConnectorError> {
    for db in backends() {
        let connector = common::memory_connector(db)?;
        connector
            .try_exec(
                "CREATE TABLE vals (i INTEGER, f REAL, t TEXT, b INTEGER, ts TEXT, j TEXT, n TEXT)",
                &[],
            )
            .await?;
        let ts = chrono::NaiveDate::from_ymd_opt(2024, 1, 2)
            .and_then(|d| d.and_hms_opt(3, 4, 5))
            .expect("timestamp");
        let inserted = connector
            .try_exec(
                "INSERT INTO vals VALUES (?, ?, ?, ?, ?, ?, ?)",
                &[
                    RowValues::Int(42),
                    RowValues::Float(2.5),
                    RowValues::Text("ban".into()),
                    RowValues::Bool(true),
                    RowValues::Timestamp(ts),
                    RowValues::JSON(serde_json::json!({ "k": 1 })),
                    RowValues::Null,
                ],
            )
            .await?;
        assert_eq!(inserted, 1);

        let row = connector
            .try_query("SELECT * FROM vals", &[], ResultFlags::ONE_ROW)
            .await?
            .and_then(QueryResult::into_row)
            .expect("row");
        assert_eq!(row.get("i"), Some(&RowValues::Int(42)));
        assert_eq!(row.get("f").and_then(RowValues::as_float), Some(2.5));
        assert_eq!(row.get("b").and_then(RowValues::as_bool), Some(true));
        assert_eq!(row.get("ts").and_then(RowValues::as_timestamp), Some(ts), "{db:?}");
        assert_eq!(text_of(&row, "j").as_deref(), Some(r#"{"k":1}"#));
        assert!(row.get("n").is_some_and(RowValues::is_null));
    }
    Ok(())
}

#[cfg(feature = "sqlite")]
#[tokio::test]
async fn sqlite_upsert_revives_a_deleted_ban() -> Result<(), SqlConnectorError> {
    let connector = banlist_connector(DatabaseType::Sqlite, 1).await?;
    connector.try_exec(SOFT_DELETE, &soft_delete_params("u0")).await?;

    let upsert = "INSERT INTO banlist (uuid, reason) VALUES (?, ?) \
                  ON CONFLICT(uuid) DO UPDATE SET reason = excluded.reason, deleted = 0";
    let changed = connector
        .try_exec(
            upsert,
            &[RowValues::Text("u0".into()), RowValues::Text("spam".into())],
        )
        .await?;
    assert_eq!(changed, 1);

    let row = connector
        .query(
            "SELECT reason, deleted FROM banlist WHERE uuid = ?",
            &[RowValues::Text("u0".into())],
            ResultFlags::ONE_ROW,
        )
        .await
        .and_then(QueryResult::into_row)
        .expect("row");
    assert_eq!(text_of(&row, "reason").as_deref(), Some("spam"));
    assert_eq!(row.get("deleted"), Some(&RowValues::Int(0)));
    Ok(())
}

#[cfg(feature = "sqlite")]
#[tokio::test]
async fn sqlite_rejects_blob_parameters() -> Result<(), SqlConnectorError> {
    let connector = banlist_connector(DatabaseType::Sqlite, 0).await?;
    let err = connector
        .try_exec(
            "INSERT INTO banlist (uuid, reason) VALUES (?, ?)",
            &[RowValues::Blob(vec![0xde, 0xad]), RowValues::Null],
        )
        .await
        .expect_err("blob bind");
    assert!(matches!(err, SqlConnectorError::ParameterError(_)));
    Ok(())
}

#[cfg(feature = "turso")]
#[tokio::test]
async fn turso_binds_blobs_natively() -> Result<(), SqlConnectorError> {
    let connector = common::memory_connector(DatabaseType::Turso)?;
    connector.try_exec("CREATE TABLE raw (b BLOB)", &[]).await?;
    connector
        .try_exec("INSERT INTO raw VALUES (?)", &[RowValues::Blob(vec![0xde, 0xad])])
        .await?;
    let row = connector
        .query("SELECT b FROM raw", &[], ResultFlags::ONE_ROW)
        .await
        .and_then(QueryResult::into_row)
        .expect("row");
    assert_eq!(row.get("b").and_then(RowValues::as_blob), Some(&[0xde, 0xad][..]));
    Ok(())
}

#[cfg(feature = "turso")]
#[tokio::test]
async fn turso_failures_keep_the_driver_error() -> Result<(), SqlConnectorError> {
    let connector = common::banlist_connector(DatabaseType::Turso, 1).await?;
    let err = connector
        .try_exec(
            "INSERT INTO banlist (uuid, reason) VALUES (?, ?)",
            &[RowValues::Text("u0".into()), RowValues::Null],
        )
        .await
        .expect_err("duplicate uuid");
    assert!(matches!(err, SqlConnectorError::TursoError(_)), "{err:?}");

    let err = connector
        .try_query("SELECT nope FROM missing", &[], ResultFlags::MANY_ROWS)
        .await
        .expect_err("unknown table");
    assert!(matches!(err, SqlConnectorError::TursoError(_)), "{err:?}");
    Ok(())
}

#[tokio::test]
async fn last_insert_id_tracks_inserts() -> Result<(), SqlConnectorError> {
    for db in backends() {
        let connector = common::memory_connector(db)?;
        // Never connected.
        assert_eq!(connector.last_insert_id().await, None);

        connector.try_exec(common::BANLIST_SCHEMA, &[]).await?;
        assert_eq!(connector.last_insert_id().await, None, "{db:?}");

        connector
            .try_exec(
                "INSERT INTO banlist (uuid) VALUES (?)",
                &[RowValues::Text("a".into())],
            )
            .await?;
        connector
            .try_exec(
                "INSERT INTO banlist (uuid) VALUES (?)",
                &[RowValues::Text("b".into())],
            )
            .await?;
        assert_eq!(connector.last_insert_id().await, Some(2), "{db:?}");
    }
    Ok(())
}
