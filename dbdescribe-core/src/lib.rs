//! Core library for dbdescribe.
//!
//! dbdescribe runs one-shot catalog actions against a database and returns
//! an opaque byte payload: a psql `\d+`-style text report for a PostgreSQL
//! table, or the rows of `SHOW INDEX` as JSON for a MySQL table.
//!
//! # Guarantees
//! - Sessions are read-only and every statement is time limited
//! - Connection strings are redacted in logs and error messages
//! - An action yields a complete payload or exactly one error
//! - Cancellation aborts the pending round trip
//!
//! # Example
//! ```rust,no_run
//! use dbdescribe_core::{ActionParams, TableParams, create_action};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> dbdescribe_core::Result<()> {
//! let action = create_action(
//!     "describe-orders",
//!     ActionParams::PostgresqlShowCreateTable(TableParams {
//!         dsn: "postgres://app@localhost/shop".to_string(),
//!         table: "orders".to_string(),
//!     }),
//! )?;
//! let report = action.run(CancellationToken::new()).await?;
//! print!("{}", String::from_utf8_lossy(&report));
//! # Ok(())
//! # }
//! ```

pub mod actions;
pub mod config;
pub mod error;
pub mod logging;
pub mod report;

pub use actions::{
    Action, ActionParams, MYSQL_SHOW_INDEX, POSTGRESQL_SHOW_CREATE_TABLE, TableParams,
    create_action,
};
pub use config::{ConnectionConfig, DatabaseType};
pub use error::{DbDescribeError, Result};
pub use logging::init_logging;
