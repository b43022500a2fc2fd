//! Check constraint, foreign-key and referenced-by sections.

use super::models::{ConstraintRecord, TableHandle};
use crate::actions::helpers::RowExt;
use crate::report::{Section, quote};
use crate::{Result, error::DbDescribeError};
use futures::TryStreamExt;
use sqlx::PgConnection;

const CHECK_CONSTRAINTS_QUERY: &str = r#"
    SELECT /* dbdescribe */ r.conname,
           pg_catalog.pg_get_constraintdef(r.oid, true) AS condef
    FROM pg_catalog.pg_constraint r
    WHERE r.conrelid = $1
      AND r.contype = 'c'
    ORDER BY r.conname
"#;

const FOREIGN_KEYS_QUERY: &str = r#"
    SELECT /* dbdescribe */ r.conname,
           pg_catalog.pg_get_constraintdef(r.oid, true) AS condef
    FROM pg_catalog.pg_constraint r
    WHERE r.conrelid = $1
      AND r.contype = 'f'
    ORDER BY r.conname
"#;

const REFERENCED_BY_QUERY: &str = r#"
    SELECT /* dbdescribe */ c.conname,
           c.conrelid::pg_catalog.regclass::text AS conrelid,
           pg_catalog.pg_get_constraintdef(c.oid, true) AS condef
    FROM pg_catalog.pg_constraint c
    WHERE c.confrelid = $1
      AND c.contype = 'f'
    ORDER BY c.conname
"#;

/// The three constraint-backed relationship sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ConstraintKind {
    Check,
    ForeignKey,
    ReferencedBy,
}

impl ConstraintKind {
    fn query(self) -> &'static str {
        match self {
            Self::Check => CHECK_CONSTRAINTS_QUERY,
            Self::ForeignKey => FOREIGN_KEYS_QUERY,
            Self::ReferencedBy => REFERENCED_BY_QUERY,
        }
    }

    fn header(self) -> &'static str {
        match self {
            Self::Check => "Check constraints:",
            Self::ForeignKey => "Foreign-key constraints:",
            Self::ReferencedBy => "Referenced by:",
        }
    }

    fn describe(self) -> &'static str {
        match self {
            Self::Check => "check constraints",
            Self::ForeignKey => "foreign keys",
            Self::ReferencedBy => "referencing foreign keys",
        }
    }
}

pub(crate) async fn fetch_constraints(
    conn: &mut PgConnection,
    handle: &TableHandle,
    kind: ConstraintKind,
) -> Result<Vec<ConstraintRecord>> {
    let mut rows = sqlx::query(kind.query()).bind(handle.oid).fetch(conn);
    let mut records = Vec::new();

    while let Some(row) = rows.try_next().await.map_err(|e| {
        DbDescribeError::query_failed(
            format!(
                "Failed to query {} of {}",
                kind.describe(),
                handle.qualified_name()
            ),
            e,
        )
    })? {
        let ctx = Some(kind.describe());
        let referencing_table = match kind {
            ConstraintKind::ReferencedBy => Some(row.get_field("conrelid", ctx)?),
            ConstraintKind::Check | ConstraintKind::ForeignKey => None,
        };
        records.push(ConstraintRecord {
            name: row.get_field("conname", ctx)?,
            definition: row.get_field("condef", ctx)?,
            referencing_table,
        });
    }

    tracing::debug!(
        "Collected {} {} for {}",
        records.len(),
        kind.describe(),
        handle.qualified_name()
    );
    Ok(records)
}

/// Builds the section for `kind`; empty when there are no records.
pub(crate) fn constraints_section(
    kind: ConstraintKind,
    records: &[ConstraintRecord],
) -> Result<Section> {
    let mut section = Section::new(kind.header());
    for record in records {
        let line = match kind {
            ConstraintKind::ReferencedBy => {
                let table = record.referencing_table.as_deref().ok_or_else(|| {
                    DbDescribeError::unexpected_null("conrelid", kind.describe())
                })?;
                format!(
                    "TABLE {} CONSTRAINT {} {}",
                    quote(table),
                    quote(&record.name),
                    record.definition
                )
            }
            ConstraintKind::Check | ConstraintKind::ForeignKey => {
                format!("{} {}", quote(&record.name), record.definition)
            }
        };
        section.push_row(&line);
    }
    Ok(section)
}
