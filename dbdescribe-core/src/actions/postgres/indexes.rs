//! `Indexes:` section of the report.

use super::models::{IndexConstraintType, IndexDescriptor, TableHandle};
use crate::actions::helpers::RowExt;
use crate::report::{Section, quote};
use crate::{Result, error::DbDescribeError};
use futures::TryStreamExt;
use sqlx::PgConnection;
use sqlx::postgres::types::Oid;

const INDEXES_QUERY: &str = r#"
    SELECT /* dbdescribe */ c2.relname,
           i.indisprimary,
           i.indisunique,
           i.indisclustered,
           i.indisvalid,
           i.indrelid::pg_catalog.regclass::text AS indrelid,
           pg_catalog.pg_get_indexdef(i.indexrelid, 0, false) AS indexdef,
           pg_catalog.pg_get_constraintdef(con.oid, true) AS condef,
           con.contype::text AS contype,
           con.condeferrable,
           con.condeferred,
           i.indisreplident,
           c2.reltablespace
    FROM pg_catalog.pg_class c,
         pg_catalog.pg_class c2,
         pg_catalog.pg_index i
             LEFT JOIN pg_catalog.pg_constraint con
                       ON (con.conrelid = i.indrelid
                           AND con.conindid = i.indexrelid
                           AND con.contype IN ('p', 'u', 'x'))
    WHERE c.oid = $1
      AND c.oid = i.indrelid
      AND i.indexrelid = c2.oid
    ORDER BY i.indisprimary DESC, i.indisunique DESC, c2.relname
"#;

const USING: &str = " USING ";

pub(crate) async fn fetch_indexes(
    conn: &mut PgConnection,
    handle: &TableHandle,
) -> Result<Vec<IndexDescriptor>> {
    let mut rows = sqlx::query(INDEXES_QUERY).bind(handle.oid).fetch(conn);
    let mut indexes = Vec::new();

    while let Some(row) = rows.try_next().await.map_err(|e| {
        DbDescribeError::query_failed(
            format!("Failed to query indexes of {}", handle.qualified_name()),
            e,
        )
    })? {
        let ctx = Some("index");
        let contype: Option<String> = row.get_field("contype", ctx)?;
        let tablespace: Oid = row.get_field("reltablespace", ctx)?;

        indexes.push(IndexDescriptor {
            name: row.get_field("relname", ctx)?,
            is_primary: row.get_field("indisprimary", ctx)?,
            is_unique: row.get_field("indisunique", ctx)?,
            is_clustered: row.get_field("indisclustered", ctx)?,
            is_valid: row.get_field("indisvalid", ctx)?,
            owning_relation: row.get_field("indrelid", ctx)?,
            index_definition: row.get_field("indexdef", ctx)?,
            constraint_definition: row.get_field("condef", ctx)?,
            constraint_type: contype
                .as_deref()
                .map(IndexConstraintType::from_code)
                .transpose()?,
            deferrable: row.get_field("condeferrable", ctx)?,
            initially_deferred: row.get_field("condeferred", ctx)?,
            replica_identity: row.get_field("indisreplident", ctx)?,
            tablespace: tablespace.0,
        });
    }

    tracing::debug!(
        "Collected {} indexes for {}",
        indexes.len(),
        handle.qualified_name()
    );
    Ok(indexes)
}

/// Builds the `Indexes:` section; empty when the table has no indexes.
pub(crate) fn indexes_section(indexes: &[IndexDescriptor]) -> Result<Section> {
    let mut section = Section::new("Indexes:");
    for index in indexes {
        section.push_row(&index_line(index)?);
    }
    Ok(section)
}

/// Label line for one index, without indentation or newline.
///
/// # Errors
/// A missing definition is reported as a query error rather than printed
/// as an empty string.
pub(crate) fn index_line(index: &IndexDescriptor) -> Result<String> {
    let mut line = quote(&index.name);

    if index.constraint_type == Some(IndexConstraintType::Exclusion) {
        let definition = index
            .constraint_definition
            .as_deref()
            .ok_or_else(|| DbDescribeError::unexpected_null("condef", "index"))?;
        line.push(' ');
        line.push_str(definition);
        return Ok(line);
    }

    // primary key and unique are mutually exclusive labels
    if index.is_primary {
        line.push_str(" PRIMARY KEY,");
    } else if index.is_unique {
        if index.constraint_type == Some(IndexConstraintType::Unique) {
            line.push_str(" UNIQUE CONSTRAINT,");
        } else {
            line.push_str(" UNIQUE,");
        }
    }

    let definition = index
        .index_definition
        .as_deref()
        .ok_or_else(|| DbDescribeError::unexpected_null("indexdef", "index"))?;
    line.push(' ');
    line.push_str(strip_using(definition));

    if index.deferrable.unwrap_or(false) {
        line.push_str(" DEFERRABLE");
        if index.initially_deferred.unwrap_or(false) {
            line.push_str(" INITIALLY DEFERRED");
        }
    }

    Ok(line)
}

/// Everything after the first ` USING `, or the whole definition.
fn strip_using(definition: &str) -> &str {
    definition
        .find(USING)
        .map_or(definition, |pos| &definition[pos.saturating_add(USING.len())..])
}
