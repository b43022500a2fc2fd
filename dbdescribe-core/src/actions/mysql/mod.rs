//! MySQL `SHOW INDEX` action.
//!
//! The payload is a JSON array whose first element lists the column names
//! and every following element holds one row. The statement runs over the
//! text protocol, so every value arrives as text and is emitted as a JSON
//! string; NULL stays null.

use super::helpers::{acquire_failed, cancellable};
use super::{Action, MYSQL_SHOW_INDEX, TableParams, sealed};
use crate::config::{ConnectionConfig, DatabaseType};
use crate::error::{DbDescribeError, redact_database_url};
use crate::Result;
use async_trait::async_trait;
use futures::TryStreamExt;
use serde_json::Value;
use sqlx::mysql::{MySqlConnectOptions, MySqlPoolOptions};
use sqlx::{Column, Executor, MySqlConnection, MySqlPool, Row, Statement, ValueRef};
use std::str::FromStr;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// `mysql-show-index`: lists the indexes of a table as JSON rows.
#[derive(Debug)]
pub struct MySqlShowIndexAction {
    id: String,
    params: TableParams,
}

impl MySqlShowIndexAction {
    /// Creates the action; nothing connects until [`Action::run`].
    pub fn new(id: impl Into<String>, params: TableParams) -> Self {
        Self {
            id: id.into(),
            params,
        }
    }

    async fn run_with_pool(
        &self,
        pool: &MySqlPool,
        config: &ConnectionConfig,
        cancel: &CancellationToken,
    ) -> Result<Vec<u8>> {
        let mut conn = cancellable(cancel, "connecting", async {
            pool.acquire()
                .await
                .map_err(|e| acquire_failed(e, config.connect_timeout))
        })
        .await?;

        let sql = show_index_statement(&self.params.table);
        let rows = cancellable(
            cancel,
            "querying indexes",
            with_timeout(config.statement_timeout, show_index(&mut conn, &sql)),
        )
        .await?;

        tracing::debug!(
            "SHOW INDEX on '{}' returned {} rows",
            self.params.table,
            rows.len().saturating_sub(1)
        );

        serde_json::to_vec(&rows).map_err(|e| DbDescribeError::Serialization {
            context: "Failed to encode SHOW INDEX rows".to_string(),
            source: e,
        })
    }
}

impl sealed::Sealed for MySqlShowIndexAction {}

#[async_trait]
impl Action for MySqlShowIndexAction {
    fn id(&self) -> &str {
        &self.id
    }

    fn action_type(&self) -> &'static str {
        MYSQL_SHOW_INDEX
    }

    async fn run(&self, cancel: CancellationToken) -> Result<Vec<u8>> {
        let config = ConnectionConfig::from_url(&self.params.dsn)?;
        if config.database_type != DatabaseType::MySQL {
            return Err(DbDescribeError::configuration(format!(
                "{} requires a MySQL connection string, got {}",
                MYSQL_SHOW_INDEX, config.database_type
            )));
        }

        tracing::info!(
            "Action {} listing indexes of '{}' on {}",
            self.id,
            self.params.table,
            config
        );

        let pool = create_pool(&self.params.dsn, &config)?;
        let result = self.run_with_pool(&pool, &config, &cancel).await;
        pool.close().await;

        if let Err(e) = &result {
            tracing::debug!("Action {} failed: {}", self.id, e);
        }
        result
    }
}

fn create_pool(dsn: &str, config: &ConnectionConfig) -> Result<MySqlPool> {
    let options = MySqlConnectOptions::from_str(dsn).map_err(|e| {
        DbDescribeError::configuration(format!(
            "Invalid MySQL connection string {}: {}",
            redact_database_url(dsn),
            e
        ))
    })?;

    let read_only = config.read_only;

    Ok(MySqlPoolOptions::new()
        .max_connections(1)
        .min_connections(0)
        .acquire_timeout(config.connect_timeout)
        .test_before_acquire(false)
        .after_connect(move |conn, _meta| {
            Box::pin(async move {
                if read_only {
                    conn.execute("SET SESSION TRANSACTION READ ONLY").await?;
                }
                Ok(())
            })
        })
        .connect_lazy_with(options))
}

/// Wraps a backtick-quoted identifier, doubling embedded backticks.
fn quote_identifier(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

fn show_index_statement(table: &str) -> String {
    format!("SHOW /* dbdescribe */ INDEX IN {}", quote_identifier(table))
}

/// MySQL and MariaDB disagree on server-side statement limits, so the limit
/// is enforced on the client.
async fn with_timeout<T, F>(limit: Duration, fut: F) -> Result<T>
where
    F: std::future::Future<Output = Result<T>>,
{
    tokio::time::timeout(limit, fut).await.map_err(|elapsed| {
        DbDescribeError::query_failed(
            format!("SHOW INDEX exceeded statement timeout of {:?}", limit),
            elapsed,
        )
    })?
}

async fn show_index(conn: &mut MySqlConnection, sql: &str) -> Result<Vec<Value>> {
    let statement = conn
        .prepare(sql)
        .await
        .map_err(|e| DbDescribeError::query_failed("Failed to prepare SHOW INDEX", e))?;
    let header: Vec<Value> = statement
        .columns()
        .iter()
        .map(|column| Value::String(column.name().to_string()))
        .collect();
    drop(statement);

    let mut output = vec![Value::Array(header)];

    // a plain &str runs over the text protocol
    let mut rows = conn.fetch(sql);
    while let Some(row) = rows
        .try_next()
        .await
        .map_err(|e| DbDescribeError::query_failed("Failed to read SHOW INDEX rows", e))?
    {
        let mut values = Vec::with_capacity(row.len());
        for index in 0..row.len() {
            let is_null = row
                .try_get_raw(index)
                .map_err(|e| field_error(index, e))?
                .is_null();
            if is_null {
                values.push(Value::Null);
                continue;
            }
            let bytes: Vec<u8> = row
                .try_get_unchecked(index)
                .map_err(|e| field_error(index, e))?;
            values.push(Value::String(String::from_utf8_lossy(&bytes).into_owned()));
        }
        output.push(Value::Array(values));
    }

    Ok(output)
}

fn field_error(index: usize, error: sqlx::Error) -> DbDescribeError {
    DbDescribeError::parse_field(&index.to_string(), Some("SHOW INDEX"), error)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_identifier() {
        assert_eq!(quote_identifier("orders"), "`orders`");
        assert_eq!(quote_identifier("Order Lines"), "`Order Lines`");
        assert_eq!(quote_identifier("a`b"), "`a``b`");
        assert_eq!(
            quote_identifier("x`; DROP TABLE t; --"),
            "`x``; DROP TABLE t; --`"
        );
    }

    #[test]
    fn test_show_index_statement() {
        assert_eq!(
            show_index_statement("city"),
            "SHOW /* dbdescribe */ INDEX IN `city`"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_with_timeout_is_query_error() {
        let result: Result<()> = with_timeout(Duration::from_secs(1), async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(())
        })
        .await;
        assert!(matches!(result, Err(DbDescribeError::Query { .. })));
    }

    #[tokio::test]
    async fn test_rejects_postgres_dsn() {
        let action = MySqlShowIndexAction::new(
            "my-1",
            TableParams {
                dsn: "postgres://u@localhost/db".to_string(),
                table: "city".to_string(),
            },
        );
        let err = action.run(CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, DbDescribeError::Configuration { .. }));
    }
}
