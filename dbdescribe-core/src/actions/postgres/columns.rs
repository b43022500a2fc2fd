//! Column table of the report.

use super::models::{ColumnDescriptor, StorageClass, TableHandle};
use crate::actions::helpers::RowExt;
use crate::report::TabWriter;
use crate::{Result, error::DbDescribeError};
use futures::TryStreamExt;
use sqlx::PgConnection;

const COLUMNS_QUERY: &str = r#"
    SELECT /* dbdescribe */ a.attname,
           pg_catalog.format_type(a.atttypid, a.atttypmod) AS format_type,
           (SELECT substring(pg_catalog.pg_get_expr(d.adbin, d.adrelid) for 128)
            FROM pg_catalog.pg_attrdef d
            WHERE d.adrelid = a.attrelid
              AND d.adnum = a.attnum
              AND a.atthasdef) AS default_expr,
           a.attnotnull,
           (SELECT c.collname
            FROM pg_catalog.pg_collation c,
                 pg_catalog.pg_type t
            WHERE c.oid = a.attcollation
              AND t.oid = a.atttypid
              AND a.attcollation <> t.typcollation) AS attcollation,
           a.attstorage::text AS attstorage,
           CASE WHEN a.attstattarget = -1 THEN NULL ELSE a.attstattarget::int4 END AS attstattarget,
           pg_catalog.col_description(a.attrelid, a.attnum) AS description
    FROM pg_catalog.pg_attribute a
    WHERE a.attrelid = $1
      AND a.attnum > 0
      AND NOT a.attisdropped
    ORDER BY a.attnum
"#;

const HEADER: [&str; 8] = [
    "Column",
    "Type",
    "Collation",
    "Nullable",
    "Default",
    "Storage",
    "Stats target",
    "Description",
];

/// Catalog value meaning "use the default statistics target".
const STATS_TARGET_DEFAULT: i32 = -1;

pub(crate) async fn fetch_columns(
    conn: &mut PgConnection,
    handle: &TableHandle,
) -> Result<Vec<ColumnDescriptor>> {
    let mut rows = sqlx::query(COLUMNS_QUERY).bind(handle.oid).fetch(conn);
    let mut columns = Vec::new();

    while let Some(row) = rows.try_next().await.map_err(|e| {
        DbDescribeError::query_failed(
            format!("Failed to query columns of {}", handle.qualified_name()),
            e,
        )
    })? {
        let ctx = Some("column");
        let storage: String = row.get_field("attstorage", ctx)?;
        columns.push(ColumnDescriptor {
            name: row.get_field("attname", ctx)?,
            type_name: row.get_field("format_type", ctx)?,
            default: row.get_field("default_expr", ctx)?,
            not_null: row.get_field("attnotnull", ctx)?,
            collation: row.get_field("attcollation", ctx)?,
            storage: StorageClass::from_code(&storage),
            stats_target: row.get_field("attstattarget", ctx)?,
            description: row.get_field("description", ctx)?,
        });
    }

    tracing::debug!(
        "Collected {} columns for {}",
        columns.len(),
        handle.qualified_name()
    );
    Ok(columns)
}

/// Renders the aligned column table, header row included.
pub(crate) fn render_columns(columns: &[ColumnDescriptor], out: &mut String) {
    let mut tw = TabWriter::new();
    tw.write_row(HEADER);

    for column in columns {
        let stats_target = column
            .stats_target
            .filter(|&target| target != STATS_TARGET_DEFAULT)
            .map(|target| target.to_string())
            .unwrap_or_default();

        tw.write_row([
            column.name.as_str(),
            column.type_name.as_str(),
            column.collation.as_deref().unwrap_or_default(),
            nullable_label(column.not_null),
            column.default.as_deref().unwrap_or_default(),
            column.storage.label(),
            stats_target.as_str(),
            column.description.as_deref().unwrap_or_default(),
        ]);
    }

    tw.finish(out);
}

fn nullable_label(not_null: bool) -> &'static str {
    if not_null { "not null" } else { "" }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(name: &str, type_name: &str) -> ColumnDescriptor {
        ColumnDescriptor {
            name: name.to_string(),
            type_name: type_name.to_string(),
            default: None,
            not_null: false,
            collation: None,
            storage: StorageClass::Plain,
            stats_target: None,
            description: None,
        }
    }

    #[test]
    fn test_single_not_null_column() {
        let mut id = column("id", "integer");
        id.not_null = true;

        let mut out = String::new();
        render_columns(&[id], &mut out);

        assert_eq!(
            out,
            "Column |Type    |Collation |Nullable |Default |Storage |Stats target |Description\n\
             id     |integer |          |not null |        |plain   |             |\n"
        );
    }

    #[test]
    fn test_optional_fields_and_alignment() {
        let id = ColumnDescriptor {
            not_null: true,
            default: Some("nextval('orders_id_seq'::regclass)".to_string()),
            ..column("id", "bigint")
        };
        let note = ColumnDescriptor {
            collation: Some("C".to_string()),
            storage: StorageClass::Extended,
            stats_target: Some(500),
            description: Some("free text".to_string()),
            ..column("note", "text")
        };

        let mut out = String::new();
        render_columns(&[id, note], &mut out);
        let lines: Vec<&str> = out.lines().collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[1],
            "id     |bigint |          |not null |nextval('orders_id_seq'::regclass) |plain    |             |"
        );
        assert_eq!(
            lines[2],
            "note   |text   |C         |         |                                   |extended |500          |free text"
        );
    }

    #[test]
    fn test_stats_target_sentinel_is_blank() {
        let col = ColumnDescriptor {
            stats_target: Some(STATS_TARGET_DEFAULT),
            ..column("qty", "integer")
        };

        let mut out = String::new();
        render_columns(&[col], &mut out);

        assert!(!out.contains("-1"));
        assert!(out.ends_with("|plain   |             |\n"));
    }

    #[test]
    fn test_unknown_storage_is_blank() {
        let col = ColumnDescriptor {
            storage: StorageClass::Unknown,
            ..column("x", "integer")
        };

        let mut out = String::new();
        render_columns(&[col], &mut out);
        assert_eq!(
            out.lines().nth(1),
            Some("x      |integer |          |         |        |        |             |")
        );
    }
}
