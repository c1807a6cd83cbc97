//! SQLite bootstrap and schema-from-attributes entry points.
//!
//! # Responsibility
//! - Open and configure SQLite connections for the roster store.
//! - Apply the declared table schema additively before handing out
//!   connections.
//!
//! # Invariants
//! - Core code must not read/write record data before the schema is applied.
//! - Schema application never drops or rewrites existing columns.

use std::error::Error;
use std::fmt::{Display, Formatter};

mod open;
pub mod schema;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

/// Transport/bootstrap error for the backing SQLite store.
#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    SchemaConflict {
        table: &'static str,
        column: String,
        expected: &'static str,
        actual: String,
    },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::SchemaConflict {
                table,
                column,
                expected,
                actual,
            } => write!(
                f,
                "column `{table}.{column}` is declared `{actual}` but the schema expects `{expected}`"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::SchemaConflict { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
