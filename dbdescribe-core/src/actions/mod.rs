//! Catalog actions behind one invocation contract.
//!
//! An action is identified by the caller-supplied ID, classified by its type
//! string, and executed once to produce an opaque byte payload. The set of
//! actions is closed: [`Action`] is sealed and instances are built only by
//! [`create_action`].
//!
//! # Module Structure
//! - `helpers`: row decoding and cancellation helpers
//! - `postgres`: `\d+`-style table report (`postgresql-show-create-table`)
//! - `mysql`: `SHOW INDEX` as JSON rows (`mysql-show-index`)

#[cfg(any(feature = "postgresql", feature = "mysql"))]
pub mod helpers;

#[cfg(feature = "mysql")]
pub mod mysql;
#[cfg(feature = "postgresql")]
pub mod postgres;

use crate::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

mod sealed {
    pub trait Sealed {}
}

/// Parameters for the actions that operate on a single table.
#[derive(Clone, Serialize, Deserialize)]
pub struct TableParams {
    /// Connection string, owned and validated by the caller
    pub dsn: String,
    /// Unqualified, case-sensitive table name
    pub table: String,
}

impl std::fmt::Debug for TableParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableParams")
            .field("dsn", &crate::error::redact_database_url(&self.dsn))
            .field("table", &self.table)
            .finish()
    }
}

/// The closed set of actions that can be started.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ActionParams {
    /// `\d+ table` analog on PostgreSQL
    PostgresqlShowCreateTable(TableParams),
    /// `SHOW INDEX IN table` on MySQL
    MysqlShowIndex(TableParams),
}

impl ActionParams {
    /// Type string of the action these parameters start.
    pub fn action_type(&self) -> &'static str {
        match self {
            Self::PostgresqlShowCreateTable(_) => POSTGRESQL_SHOW_CREATE_TABLE,
            Self::MysqlShowIndex(_) => MYSQL_SHOW_INDEX,
        }
    }
}

/// Type string of the PostgreSQL table report action.
pub const POSTGRESQL_SHOW_CREATE_TABLE: &str = "postgresql-show-create-table";
/// Type string of the MySQL index listing action.
pub const MYSQL_SHOW_INDEX: &str = "mysql-show-index";

/// One runnable action.
///
/// `run` yields either the complete payload or a single error, never a
/// partial payload. Cancelling the token aborts the pending round trip and
/// fails the action with `DbDescribeError::Cancelled`.
#[async_trait]
pub trait Action: sealed::Sealed + Send + Sync + std::fmt::Debug {
    /// Caller-assigned action ID.
    fn id(&self) -> &str;

    /// Action type string, e.g. `postgresql-show-create-table`.
    fn action_type(&self) -> &'static str;

    /// Executes the action.
    async fn run(&self, cancel: CancellationToken) -> Result<Vec<u8>>;
}

/// Builds the action for `params`.
///
/// # Errors
/// Returns an unsupported-feature error if the driver for the requested
/// action was not compiled in.
pub fn create_action(id: impl Into<String>, params: ActionParams) -> Result<Box<dyn Action>> {
    let id = id.into();
    match params {
        #[cfg(feature = "postgresql")]
        ActionParams::PostgresqlShowCreateTable(params) => Ok(Box::new(
            postgres::PostgresShowCreateTableAction::new(id, params),
        )),
        #[cfg(not(feature = "postgresql"))]
        ActionParams::PostgresqlShowCreateTable(_) => {
            Err(crate::error::DbDescribeError::unsupported_feature(
                POSTGRESQL_SHOW_CREATE_TABLE,
                "Compile with --features postgresql to enable PostgreSQL support",
            ))
        }
        #[cfg(feature = "mysql")]
        ActionParams::MysqlShowIndex(params) => {
            Ok(Box::new(mysql::MySqlShowIndexAction::new(id, params)))
        }
        #[cfg(not(feature = "mysql"))]
        ActionParams::MysqlShowIndex(_) => Err(crate::error::DbDescribeError::unsupported_feature(
            MYSQL_SHOW_INDEX,
            "Compile with --features mysql to enable MySQL support",
        )),
    }
}
