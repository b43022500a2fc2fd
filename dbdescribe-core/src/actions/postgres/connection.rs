//! PostgreSQL session setup for one report invocation.
//!
//! Every invocation gets its own single-connection pool. Session settings
//! are applied in `after_connect` so that a reconnect inherits them.

use crate::config::ConnectionConfig;
use crate::error::{DbDescribeError, redact_database_url};
use crate::Result;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{Executor, PgPool};
use std::str::FromStr;

/// Creates a lazily connecting pool for `dsn`.
///
/// # Errors
/// Returns a configuration error if the driver rejects the connection
/// string. Connection failures surface later, on acquire.
pub(crate) fn create_pool(dsn: &str, config: &ConnectionConfig) -> Result<PgPool> {
    let options = PgConnectOptions::from_str(dsn)
        .map_err(|e| {
            DbDescribeError::configuration(format!(
                "Invalid PostgreSQL connection string {}: {}",
                redact_database_url(dsn),
                e
            ))
        })?
        .application_name(&config.application_name);

    let statement_timeout_ms = config.statement_timeout.as_millis();
    let read_only = config.read_only;

    let pool = PgPoolOptions::new()
        .max_connections(1)
        .min_connections(0)
        .acquire_timeout(config.connect_timeout)
        .test_before_acquire(false)
        .after_connect(move |conn, _meta| {
            Box::pin(async move {
                conn.execute(
                    format!("SET statement_timeout = {}", statement_timeout_ms).as_str(),
                )
                .await?;

                if read_only {
                    conn.execute("SET default_transaction_read_only = on")
                        .await?;
                }

                Ok(())
            })
        })
        .connect_lazy_with(options);

    tracing::debug!(
        "Created PostgreSQL pool for {} (statement_timeout={}ms)",
        config,
        statement_timeout_ms
    );

    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_pool_is_lazy() {
        let config = ConnectionConfig::from_url("postgres://u:p@127.0.0.1:1/db").unwrap();
        let pool = create_pool("postgres://u:p@127.0.0.1:1/db", &config).unwrap();
        assert_eq!(pool.size(), 0);
    }

    #[tokio::test]
    async fn test_create_pool_rejects_bad_dsn() {
        let config = ConnectionConfig::default();
        let err = create_pool("postgres://u:secret@h:notaport/db", &config).unwrap_err();
        assert!(matches!(err, DbDescribeError::Configuration { .. }));
        assert!(!err.to_string().contains("secret"));
    }
}
