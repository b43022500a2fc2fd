//! Catalog rows decoded by the table report.

use crate::{Result, error::DbDescribeError};
use serde::Serialize;
use sqlx::postgres::types::Oid;

/// The table every reporter is scoped to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableHandle {
    /// `pg_class.oid` of the relation
    pub oid: Oid,
    /// Schema (namespace) name
    pub schema: String,
    /// Relation name
    pub relation: String,
}

impl TableHandle {
    /// Schema-qualified display name, unquoted.
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.schema, self.relation)
    }
}

/// Column storage strategy (`pg_attribute.attstorage`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageClass {
    /// `p`: inline, uncompressed
    Plain,
    /// `m`: inline, compressed
    Main,
    /// `e`: out of line, uncompressed
    External,
    /// `x`: out of line, compressed
    Extended,
    /// A code this version does not know about
    Unknown,
}

impl StorageClass {
    /// Maps the single-letter catalog code.
    pub fn from_code(code: &str) -> Self {
        match code {
            "p" => Self::Plain,
            "m" => Self::Main,
            "e" => Self::External,
            "x" => Self::Extended,
            _ => Self::Unknown,
        }
    }

    /// Word shown in the Storage column; empty for unknown codes.
    pub fn label(self) -> &'static str {
        match self {
            Self::Plain => "plain",
            Self::Main => "main",
            Self::External => "external",
            Self::Extended => "extended",
            Self::Unknown => "",
        }
    }
}

/// One live column of the table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnDescriptor {
    /// Column name
    pub name: String,
    /// `format_type()` output, e.g. `character varying(64)`
    pub type_name: String,
    /// Default expression, at most 128 characters
    pub default: Option<String>,
    /// Whether the column carries a NOT NULL constraint
    pub not_null: bool,
    /// Collation, only when it differs from the type's default
    pub collation: Option<String>,
    /// Storage strategy
    pub storage: StorageClass,
    /// Per-column statistics target; `None` or -1 means the default
    pub stats_target: Option<i32>,
    /// Column comment
    pub description: Option<String>,
}

/// Constraint kinds that can own an index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexConstraintType {
    /// `p`
    PrimaryKey,
    /// `u`
    Unique,
    /// `x`
    Exclusion,
}

impl IndexConstraintType {
    /// Maps `pg_constraint.contype`; only `p`, `u` and `x` can back an index.
    ///
    /// # Errors
    /// Any other code is a query error.
    pub fn from_code(code: &str) -> Result<Self> {
        match code {
            "p" => Ok(Self::PrimaryKey),
            "u" => Ok(Self::Unique),
            "x" => Ok(Self::Exclusion),
            other => Err(DbDescribeError::query_failed(
                "Unexpected constraint type in index query",
                std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    format!("contype '{}'", other),
                ),
            )),
        }
    }
}

/// One index on the table, with the constraint that owns it if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexDescriptor {
    /// Index relation name
    pub name: String,
    /// Backs the primary key
    pub is_primary: bool,
    /// Enforces uniqueness, with or without a constraint
    pub is_unique: bool,
    /// Table was last clustered on this index
    pub is_clustered: bool,
    /// False while a concurrent build is unfinished
    pub is_valid: bool,
    /// Owning relation as printed by `regclass`
    pub owning_relation: String,
    /// `pg_get_indexdef()` output
    pub index_definition: Option<String>,
    /// `pg_get_constraintdef()` output of the owning constraint
    pub constraint_definition: Option<String>,
    /// Kind of the owning constraint, if any
    pub constraint_type: Option<IndexConstraintType>,
    /// Owning constraint is DEFERRABLE
    pub deferrable: Option<bool>,
    /// Owning constraint is INITIALLY DEFERRED
    pub initially_deferred: Option<bool>,
    /// Index is the table's replica identity
    pub replica_identity: Option<bool>,
    /// `pg_class.reltablespace` of the index, 0 for the database default
    pub tablespace: u32,
}

/// A named constraint row in one of the relationship sections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConstraintRecord {
    /// Constraint name
    pub name: String,
    /// `pg_get_constraintdef()` output
    pub definition: String,
    /// Referencing table, set only for referenced-by rows
    pub referencing_table: Option<String>,
}
