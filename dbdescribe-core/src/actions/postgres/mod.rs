//! PostgreSQL `\d+`-style table report.
//!
//! # Module Structure
//! - `connection`: single-connection pool with session settings
//! - `models`: decoded catalog rows
//! - `resolver`: table name to oid lookup and report title
//! - `columns`: aligned column table
//! - `indexes`: `Indexes:` section
//! - `constraints`: check, foreign-key and referenced-by sections
//!
//! # Report Layout
//! The report is assembled in a fixed order: title, column table, indexes,
//! check constraints, foreign keys, referenced by. List sections with no
//! rows are omitted entirely. Any failure discards the partial report.

mod columns;
mod connection;
mod constraints;
mod indexes;
mod models;
mod resolver;

pub use models::{
    ColumnDescriptor, ConstraintRecord, IndexConstraintType, IndexDescriptor, StorageClass,
    TableHandle,
};

use super::helpers::{acquire_failed, cancellable};
use super::{Action, POSTGRESQL_SHOW_CREATE_TABLE, TableParams, sealed};
use crate::config::{ConnectionConfig, DatabaseType};
use crate::error::DbDescribeError;
use crate::Result;
use async_trait::async_trait;
use constraints::ConstraintKind;
use sqlx::{PgConnection, PgPool};
use std::time::Instant;
use tokio_util::sync::CancellationToken;

/// `postgresql-show-create-table`: renders the table report as UTF-8 text.
#[derive(Debug)]
pub struct PostgresShowCreateTableAction {
    id: String,
    params: TableParams,
}

impl PostgresShowCreateTableAction {
    /// Creates the action; nothing connects until [`Action::run`].
    pub fn new(id: impl Into<String>, params: TableParams) -> Self {
        Self {
            id: id.into(),
            params,
        }
    }

    async fn run_with_pool(
        &self,
        pool: &PgPool,
        config: &ConnectionConfig,
        cancel: &CancellationToken,
    ) -> Result<String> {
        let mut conn = cancellable(cancel, "connecting", async {
            pool.acquire()
                .await
                .map_err(|e| acquire_failed(e, config.connect_timeout))
        })
        .await?;

        describe_table(&mut conn, &self.params.table, cancel).await
    }
}

impl sealed::Sealed for PostgresShowCreateTableAction {}

#[async_trait]
impl Action for PostgresShowCreateTableAction {
    fn id(&self) -> &str {
        &self.id
    }

    fn action_type(&self) -> &'static str {
        POSTGRESQL_SHOW_CREATE_TABLE
    }

    async fn run(&self, cancel: CancellationToken) -> Result<Vec<u8>> {
        let config = ConnectionConfig::from_url(&self.params.dsn)?;
        if config.database_type != DatabaseType::PostgreSQL {
            return Err(DbDescribeError::configuration(format!(
                "{} requires a PostgreSQL connection string, got {}",
                POSTGRESQL_SHOW_CREATE_TABLE, config.database_type
            )));
        }

        tracing::info!(
            "Action {} describing table '{}' on {}",
            self.id,
            self.params.table,
            config
        );

        let pool = connection::create_pool(&self.params.dsn, &config)?;
        let result = self.run_with_pool(&pool, &config, &cancel).await;
        pool.close().await;

        match &result {
            Ok(report) => tracing::debug!("Action {} produced {} bytes", self.id, report.len()),
            Err(e) => tracing::debug!("Action {} failed: {}", self.id, e),
        }
        result.map(String::into_bytes)
    }
}

/// Builds the complete report for `table` on an open connection.
///
/// Queries run one at a time in report order; each step is aborted if
/// `cancel` fires.
///
/// # Errors
/// `NotFound` if the table is not visible, `Cancelled` if the token fires,
/// `Query` for any catalog failure.
pub async fn describe_table(
    conn: &mut PgConnection,
    table: &str,
    cancel: &CancellationToken,
) -> Result<String> {
    let start = Instant::now();

    let handle = cancellable(
        cancel,
        "resolving table",
        resolver::resolve_table(conn, table),
    )
    .await?;
    let mut report = resolver::title_line(&handle);

    let columns = cancellable(
        cancel,
        "querying columns",
        columns::fetch_columns(conn, &handle),
    )
    .await?;
    columns::render_columns(&columns, &mut report);

    let indexes = cancellable(
        cancel,
        "querying indexes",
        indexes::fetch_indexes(conn, &handle),
    )
    .await?;
    indexes::indexes_section(&indexes)?.flush_into(&mut report);

    for (kind, step) in [
        (ConstraintKind::Check, "querying check constraints"),
        (ConstraintKind::ForeignKey, "querying foreign keys"),
        (ConstraintKind::ReferencedBy, "querying referencing foreign keys"),
    ] {
        let records = cancellable(
            cancel,
            step,
            constraints::fetch_constraints(conn, &handle, kind),
        )
        .await?;
        constraints::constraints_section(kind, &records)?.flush_into(&mut report);
    }

    tracing::info!(
        "Described {} ({} columns, {} indexes) in {:?}",
        handle.qualified_name(),
        columns.len(),
        indexes.len(),
        start.elapsed()
    );

    Ok(report)
}
