//! Explicit schema descriptor and additive table creation.
//!
//! # Responsibility
//! - Describe the managed table as an ordered list of named, typed domain
//!   attributes.
//! - Generate `CREATE TABLE` / `ALTER TABLE ... ADD COLUMN` DDL from that
//!   description (schema-from-attributes, additive only).
//!
//! # Invariants
//! - System columns (`id`, `created_at`, `updated_at`, `deleted_at`) are
//!   owned by this module and never appear in the domain attribute list.
//! - An existing column whose declared type disagrees with the descriptor
//!   fails bootstrap instead of being silently reinterpreted.

use crate::db::{DbError, DbResult};
use rusqlite::Connection;

/// Primary-key column managed by the store, never by callers.
pub const ID_COLUMN: &str = "id";
/// Creation timestamp column, epoch milliseconds, set once.
pub const CREATED_AT_COLUMN: &str = "created_at";
/// Mutation timestamp column, epoch milliseconds, refreshed on every write.
pub const UPDATED_AT_COLUMN: &str = "updated_at";
/// Soft-delete tombstone column, nullable epoch milliseconds.
pub const DELETED_AT_COLUMN: &str = "deleted_at";

/// Storage type of one domain attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Text,
    Integer,
    /// Stored as INTEGER 0/1.
    Boolean,
}

impl ColumnType {
    /// SQLite declared type used in generated DDL.
    pub fn declared_type(self) -> &'static str {
        match self {
            Self::Text => "TEXT",
            Self::Integer | Self::Boolean => "INTEGER",
        }
    }
}

/// One named, typed domain attribute.
#[derive(Debug, Clone, Copy)]
pub struct ColumnDef {
    pub name: &'static str,
    pub ty: ColumnType,
    pub unique: bool,
}

/// Ordered description of the managed table's domain attributes.
///
/// Consumed by the store to validate filter/update column names and by
/// [`apply_schema`] to create or extend the backing table.
#[derive(Debug, Clone, Copy)]
pub struct TableSchema {
    pub table: &'static str,
    pub columns: &'static [ColumnDef],
}

impl TableSchema {
    /// Looks up one domain attribute by name.
    pub fn domain_column(&self, name: &str) -> Option<&'static ColumnDef> {
        self.columns.iter().find(|column| column.name == name)
    }

    /// Returns whether `name` may appear in a filter predicate.
    ///
    /// Covers domain attributes plus the readable system columns.
    pub fn is_filterable(&self, name: &str) -> bool {
        name == ID_COLUMN
            || name == CREATED_AT_COLUMN
            || name == UPDATED_AT_COLUMN
            || name == DELETED_AT_COLUMN
            || self.domain_column(name).is_some()
    }

    /// Every column the backing table must carry, in declaration order.
    pub fn expected_columns(&self) -> Vec<&'static str> {
        let mut names = vec![ID_COLUMN];
        names.extend(self.columns.iter().map(|column| column.name));
        names.extend([CREATED_AT_COLUMN, UPDATED_AT_COLUMN, DELETED_AT_COLUMN]);
        names
    }

    /// Generates the full `CREATE TABLE IF NOT EXISTS` statement.
    ///
    /// `AUTOINCREMENT` keeps assigned ids strictly increasing and prevents
    /// rowid reuse after hard deletes.
    pub fn create_table_sql(&self) -> String {
        let mut sql = format!(
            "CREATE TABLE IF NOT EXISTS {} (\n    {ID_COLUMN} INTEGER PRIMARY KEY AUTOINCREMENT",
            self.table
        );
        for column in self.columns {
            sql.push_str(",\n    ");
            sql.push_str(column.name);
            sql.push(' ');
            sql.push_str(column.ty.declared_type());
            sql.push_str(" NOT NULL");
            if column.unique {
                sql.push_str(" UNIQUE");
            }
        }
        sql.push_str(&format!(
            ",\n    {CREATED_AT_COLUMN} INTEGER NOT NULL,\n    {UPDATED_AT_COLUMN} INTEGER NOT NULL,\n    {DELETED_AT_COLUMN} INTEGER\n);"
        ));
        sql
    }
}

/// Applies `schema` to the connection additively.
///
/// - Missing table: created from the descriptor.
/// - Missing columns on an existing table: added via `ADD COLUMN`.
/// - Declared-type mismatch on an existing column: `DbError::SchemaConflict`.
///
/// Columns present in the table but absent from the descriptor are left
/// untouched; nothing is ever dropped or altered in place.
pub fn apply_schema(conn: &Connection, schema: &TableSchema) -> DbResult<()> {
    if !table_exists(conn, schema.table)? {
        conn.execute_batch(&schema.create_table_sql())?;
        return Ok(());
    }

    let existing = declared_column_types(conn, schema.table)?;
    for column in schema.columns {
        match existing.iter().find(|(name, _)| name == column.name) {
            None => {
                // New attributes on an existing table must be nullable or
                // carry a default; existing rows have no value for them.
                conn.execute_batch(&format!(
                    "ALTER TABLE {} ADD COLUMN {} {};",
                    schema.table,
                    column.name,
                    column.ty.declared_type()
                ))?;
            }
            Some((_, declared)) => {
                if !declared.eq_ignore_ascii_case(column.ty.declared_type()) {
                    return Err(DbError::SchemaConflict {
                        table: schema.table,
                        column: column.name.to_string(),
                        expected: column.ty.declared_type(),
                        actual: declared.clone(),
                    });
                }
            }
        }
    }

    Ok(())
}

/// Returns whether `table` exists on the connection.
pub fn table_exists(conn: &Connection, table: &str) -> DbResult<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1;",
        [table],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// Returns `(name, declared_type)` pairs for every column of `table`.
pub fn declared_column_types(conn: &Connection, table: &str) -> DbResult<Vec<(String, String)>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    let mut columns = Vec::new();
    while let Some(row) = rows.next()? {
        columns.push((row.get("name")?, row.get("type")?));
    }
    Ok(columns)
}
