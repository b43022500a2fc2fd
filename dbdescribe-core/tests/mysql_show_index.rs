//! MySQL SHOW INDEX action tests with testcontainers.

#![cfg(feature = "mysql")]

use dbdescribe_core::{ActionParams, DbDescribeError, Result, TableParams, create_action};
use serde_json::Value;
use sqlx::MySqlPool;
use std::time::Duration;
use testcontainers_modules::{mysql::Mysql, testcontainers::runners::AsyncRunner};
use tokio_util::sync::CancellationToken;

/// Helper function to wait for MySQL to be ready
async fn wait_for_mysql_ready(database_url: &str, max_attempts: u32) -> Result<()> {
    let mut attempts = 0;
    while attempts < max_attempts {
        if let Ok(pool) = MySqlPool::connect(database_url).await {
            if sqlx::query("SELECT 1").fetch_one(&pool).await.is_ok() {
                pool.close().await;
                return Ok(());
            }
            pool.close().await;
        }
        attempts += 1;
        if attempts < max_attempts {
            tokio::time::sleep(Duration::from_millis(500)).await;
        }
    }
    Err(DbDescribeError::connection_failed(std::io::Error::new(
        std::io::ErrorKind::TimedOut,
        format!(
            "MySQL failed to become ready after {} attempts",
            max_attempts
        ),
    )))
}

async fn show_index(database_url: &str, table: &str) -> Result<Vec<Vec<Value>>> {
    let action = create_action(
        "integration",
        ActionParams::MysqlShowIndex(TableParams {
            dsn: database_url.to_string(),
            table: table.to_string(),
        }),
    )?;
    let payload = action.run(CancellationToken::new()).await?;
    Ok(serde_json::from_slice(&payload).unwrap())
}

fn column(header: &[Value], name: &str) -> usize {
    header
        .iter()
        .position(|value| value == name)
        .unwrap_or_else(|| panic!("column {} missing from {:?}", name, header))
}

#[tokio::test]
async fn test_integration_show_index_rows() -> Result<()> {
    let mysql = Mysql::default().start().await.unwrap();
    let port = mysql.get_host_port_ipv4(3306).await.unwrap();
    let database_url = format!("mysql://root@localhost:{}/test", port);
    wait_for_mysql_ready(&database_url, 30).await?;

    let pool = MySqlPool::connect(&database_url).await.unwrap();
    sqlx::query(
        "CREATE TABLE city (
            id INT AUTO_INCREMENT PRIMARY KEY,
            name VARCHAR(64) NOT NULL,
            district VARCHAR(64),
            INDEX city_district (district(8))
        )",
    )
    .execute(&pool)
    .await
    .unwrap();
    sqlx::query("CREATE TABLE `odd``name` (id INT)")
        .execute(&pool)
        .await
        .unwrap();
    pool.close().await;

    let rows = show_index(&database_url, "city").await?;
    assert_eq!(rows.len(), 3, "header plus two index rows: {:?}", rows);

    let header = &rows[0];
    let key_name = column(header, "Key_name");
    let non_unique = column(header, "Non_unique");
    let sub_part = column(header, "Sub_part");

    let primary = rows
        .iter()
        .skip(1)
        .find(|row| row[key_name] == "PRIMARY")
        .unwrap();
    assert_eq!(primary[non_unique], Value::String("0".to_string()));
    assert_eq!(primary[sub_part], Value::Null);

    let district = rows
        .iter()
        .skip(1)
        .find(|row| row[key_name] == "city_district")
        .unwrap();
    assert_eq!(district[non_unique], Value::String("1".to_string()));
    assert_eq!(district[sub_part], Value::String("8".to_string()));

    // a table without indexes still yields the header
    let odd = show_index(&database_url, "odd`name").await?;
    assert_eq!(odd.len(), 1);
    assert!(odd[0].contains(&Value::String("Key_name".to_string())));

    let missing = show_index(&database_url, "no_such_table").await.unwrap_err();
    assert!(matches!(missing, DbDescribeError::Query { .. }), "{:?}", missing);

    Ok(())
}

#[tokio::test]
async fn test_cancelled_mysql_action() {
    let cancel = CancellationToken::new();
    cancel.cancel();

    let action = create_action(
        "cancelled",
        ActionParams::MysqlShowIndex(TableParams {
            dsn: "mysql://root@127.0.0.1:9/test".to_string(),
            table: "city".to_string(),
        }),
    )
    .unwrap();

    let err = action.run(cancel).await.unwrap_err();
    assert!(err.is_cancelled());
}
