//! Helper utilities shared by the action implementations.

use crate::{Result, error::DbDescribeError};
use sqlx::{ColumnIndex, Row};
use std::future::Future;
use tokio_util::sync::CancellationToken;

/// Extension trait for extracting typed values from database rows
/// with consistent error handling.
///
/// # Example
/// ```rust,ignore
/// use dbdescribe_core::actions::helpers::RowExt;
///
/// let name: String = row.get_field("attname", Some("column"))?;
/// let target: Option<i32> = row.get_field("attstattarget", None)?;
/// ```
pub trait RowExt: Row {
    /// Extracts a typed field from the row with proper error context.
    ///
    /// Decoding a NULL into a non-`Option` type is reported as a query error.
    fn get_field<'r, T>(&'r self, field_name: &str, query_context: Option<&str>) -> Result<T>
    where
        T: sqlx::Decode<'r, Self::Database> + sqlx::Type<Self::Database>;
}

impl<R> RowExt for R
where
    R: Row,
    for<'a> &'a str: ColumnIndex<R>,
{
    fn get_field<'r, T>(&'r self, field_name: &str, query_context: Option<&str>) -> Result<T>
    where
        T: sqlx::Decode<'r, Self::Database> + sqlx::Type<Self::Database>,
    {
        self.try_get(field_name)
            .map_err(|e| DbDescribeError::parse_field(field_name, query_context, e))
    }
}

/// Runs one blocking step of an action, aborting it if `cancel` fires first.
///
/// The step future is dropped on cancellation, which releases any cursor or
/// pending round trip it owns.
pub(crate) async fn cancellable<T, F>(cancel: &CancellationToken, step: &str, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    if cancel.is_cancelled() {
        return Err(DbDescribeError::cancelled(format!("cancelled before {}", step)));
    }

    tokio::select! {
        biased;
        () = cancel.cancelled() => {
            tracing::debug!("Cancellation observed while {}", step);
            Err(DbDescribeError::cancelled(format!("cancelled while {}", step)))
        }
        result = fut => result,
    }
}

/// Maps a pool acquisition failure to a connection error.
pub(crate) fn acquire_failed(error: sqlx::Error, timeout: std::time::Duration) -> DbDescribeError {
    match error {
        sqlx::Error::PoolTimedOut => DbDescribeError::connection_context(
            format!("Timed out after {:?} waiting for a connection", timeout),
            sqlx::Error::PoolTimedOut,
        ),
        other => DbDescribeError::connection_failed(other),
    }
}
