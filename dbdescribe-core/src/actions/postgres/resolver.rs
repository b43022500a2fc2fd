//! Table name resolution.

use super::models::TableHandle;
use crate::actions::helpers::RowExt;
use crate::{Result, error::DbDescribeError};
use sqlx::PgConnection;
use sqlx::postgres::types::Oid;

const RESOLVE_TABLE_QUERY: &str = r#"
    SELECT /* dbdescribe */ c.oid,
           n.nspname,
           c.relname
    FROM pg_catalog.pg_class c
             LEFT JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace
    WHERE c.relname = $1
      AND pg_catalog.pg_table_is_visible(c.oid)
    ORDER BY n.nspname, c.relname
    LIMIT 1
"#;

/// Finds the relation named `table` that is visible through the search path.
///
/// # Errors
/// `NotFound` if no visible relation has that name, `Query` for any other
/// failure.
pub(crate) async fn resolve_table(conn: &mut PgConnection, table: &str) -> Result<TableHandle> {
    let row = sqlx::query(RESOLVE_TABLE_QUERY)
        .bind(table)
        .fetch_optional(conn)
        .await
        .map_err(|e| {
            DbDescribeError::query_failed(format!("Failed to resolve table '{}'", table), e)
        })?
        .ok_or_else(|| DbDescribeError::not_found(table))?;

    let oid: Oid = row.get_field("oid", Some("table resolution"))?;
    let schema: String = row.get_field("nspname", Some("table resolution"))?;
    let relation: String = row.get_field("relname", Some("table resolution"))?;

    tracing::debug!("Resolved table '{}' to oid {}", table, oid.0);

    Ok(TableHandle {
        oid,
        schema,
        relation,
    })
}

/// First line of the report.
pub(crate) fn title_line(handle: &TableHandle) -> String {
    format!("Table \"{}\"\n", handle.qualified_name())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_line_is_not_escaped() {
        let handle = TableHandle {
            oid: Oid(1),
            schema: "sales".to_string(),
            relation: "Order Lines".to_string(),
        };
        assert_eq!(title_line(&handle), "Table \"sales.Order Lines\"\n");
    }
}
